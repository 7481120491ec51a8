use std::rc::Rc;

use compact_str::CompactString;

use crate::ast::node::{Expr, Literal, Node};
use crate::context::{ExpressionContext, Resolver};
use crate::eval::StopChecker;
use crate::eval::error::{CompileError, EvalError};
use crate::eval::evaluator::Evaluator;
use crate::types::ExpressionType;

/// Builds an evaluator tree from a parsed expression.
///
/// Building is a two phase affair for every call node: the function first
/// produces its lazy evaluator, then [`Evaluator::fold`] collapses it when all
/// inputs were constant. Runtime errors inside a constant subtree therefore
/// surface here, anchored to the node that raised them.
pub struct Compiler<'a> {
    context: &'a ExpressionContext,
    stop: StopChecker,
}

impl<'a> Compiler<'a> {
    pub fn new(context: &'a ExpressionContext, stop: StopChecker) -> Self {
        Self { context, stop }
    }

    pub fn compile(&self, node: &Node) -> Result<Evaluator, CompileError> {
        match &node.expr {
            Expr::Literal(Literal::Integer(v)) => Ok(Evaluator::constant_double(
                ExpressionType::Integer,
                *v as f64,
            )),
            Expr::Literal(Literal::Double(v)) => {
                Ok(Evaluator::constant_double(ExpressionType::Double, *v))
            }
            Expr::Literal(Literal::String(s)) => Ok(Evaluator::constant_string(Some(s.clone()))),
            Expr::Literal(Literal::Boolean(b)) => Ok(Evaluator::constant_boolean(Some(*b))),
            Expr::Column(name) => {
                let (resolver, ty) = self.context.resolve_variable(name).ok_or_else(|| {
                    CompileError::new(EvalError::UnknownVariable(name.clone()), node.range)
                })?;
                let constant = resolver.is_session_constant(name);
                reference(resolver, name.clone(), ty, constant)
                    .fold()
                    .map_err(|error| CompileError::new(error, node.range))
            }
            Expr::Macro(name) => {
                let (resolver, ty) = self.context.resolve_scope(name).ok_or_else(|| {
                    CompileError::new(EvalError::UnknownMacro(name.clone()), node.range)
                })?;
                // scope values may change between evaluations, never fold
                Ok(reference(resolver, name.clone(), ty, false))
            }
            Expr::ScopeConstant(name) => {
                let (resolver, ty) = self.context.resolve_scope_constant(name).ok_or_else(|| {
                    CompileError::new(EvalError::UnknownScopeConstant(name.clone()), node.range)
                })?;
                reference(resolver, name.clone(), ty, true)
                    .fold()
                    .map_err(|error| CompileError::new(error, node.range))
            }
            Expr::Call(name, args) => {
                let function = self.context.function(name).ok_or_else(|| {
                    CompileError::new(EvalError::UnknownFunction(name.clone()), node.range)
                })?;
                let args: Vec<Evaluator> = args
                    .iter()
                    .map(|arg| self.compile(arg))
                    .collect::<Result<_, _>>()?;
                function
                    .compute(&self.stop, &args)
                    .and_then(Evaluator::fold)
                    .map_err(|error| CompileError::new(error, node.range))
            }
        }
    }
}

fn reference(
    resolver: Rc<dyn Resolver>,
    name: CompactString,
    ty: ExpressionType,
    constant: bool,
) -> Evaluator {
    match ty {
        ExpressionType::Integer | ExpressionType::Double => {
            Evaluator::double(ty, constant, move || resolver.double(&name))
        }
        ExpressionType::Boolean => Evaluator::boolean(constant, move || resolver.boolean(&name)),
        ExpressionType::String => Evaluator::string(constant, move || resolver.string(&name)),
        ExpressionType::Instant => Evaluator::instant(constant, move || resolver.instant(&name)),
        ExpressionType::LocalTime => {
            Evaluator::local_time(constant, move || resolver.local_time(&name))
        }
        ExpressionType::StringSet => {
            Evaluator::string_set(constant, move || resolver.string_set(&name))
        }
        ExpressionType::StringList => {
            Evaluator::string_list(constant, move || resolver.string_list(&name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::parser::Parser;
    use crate::lexer::tokenize;
    use crate::value::Value;

    fn compile(input: &str) -> Result<Evaluator, CompileError> {
        let tokens = tokenize(input).unwrap();
        let node = Parser::new(&tokens).parse().unwrap();
        let context = ExpressionContext::default();
        Compiler::new(&context, StopChecker::never()).compile(&node)
    }

    #[test]
    fn test_constant_expression_folds() {
        let e = compile("1 + 2 * 3").unwrap();
        assert!(e.is_constant());
        assert_eq!(e.ty(), ExpressionType::Integer);
        assert_eq!(e.call_value().unwrap(), Value::Number(7.0));
    }

    #[test]
    fn test_standard_constants_fold() {
        let e = compile("2 * pi").unwrap();
        assert!(e.is_constant());
        assert_eq!(
            e.call_value().unwrap(),
            Value::Number(2.0 * std::f64::consts::PI)
        );
    }

    #[test]
    fn test_unknown_variable_carries_range() {
        let err = compile("1 + nosuchthing").unwrap_err();
        assert_eq!(err.error, EvalError::UnknownVariable("nosuchthing".into()));
        assert_eq!(err.range.start.column, 5);
    }

    #[test]
    fn test_unknown_function() {
        let err = compile("nosuchfunc(1)").unwrap_err();
        assert_eq!(err.error, EvalError::UnknownFunction("nosuchfunc".into()));
    }

    #[test]
    fn test_type_error_carries_operator_range() {
        let err = compile("1.5 | 2").unwrap_err();
        assert_eq!(
            err.error,
            EvalError::InvalidTypes {
                name: "|".into(),
                expected: "integer arguments"
            }
        );
    }

    #[test]
    fn test_invalid_constant_regex_fails_the_build() {
        let err = compile("matches(\"a\", \"(\")").unwrap_err();
        assert!(matches!(
            err.error,
            EvalError::InvalidRegularExpression(..)
        ));
    }

    #[test]
    fn test_date_now_does_not_fold() {
        let e = compile("date_now()").unwrap();
        assert!(!e.is_constant());
    }
}
