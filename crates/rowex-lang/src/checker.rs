use crate::ast::node::{Expr, Node};
use crate::context::ExpressionContext;
use crate::eval::error::{CompileError, EvalError};

/// Validates a parsed expression without building evaluators: every call must
/// resolve to a known function with an acceptable argument count, and every
/// scoped reference must resolve to a known resolver entry. Argument types
/// are not inferred here; type errors surface when the expression is built.
pub fn check(context: &ExpressionContext, node: &Node) -> Result<(), CompileError> {
    match &node.expr {
        Expr::Literal(_) => Ok(()),
        Expr::Column(name) => context
            .resolve_variable(name)
            .map(|_| ())
            .ok_or_else(|| {
                CompileError::new(EvalError::UnknownVariable(name.clone()), node.range)
            }),
        Expr::Macro(name) => context
            .resolve_scope(name)
            .map(|_| ())
            .ok_or_else(|| CompileError::new(EvalError::UnknownMacro(name.clone()), node.range)),
        Expr::ScopeConstant(name) => context
            .resolve_scope_constant(name)
            .map(|_| ())
            .ok_or_else(|| {
                CompileError::new(EvalError::UnknownScopeConstant(name.clone()), node.range)
            }),
        Expr::Call(name, args) => {
            let function = context.function(name).ok_or_else(|| {
                CompileError::new(EvalError::UnknownFunction(name.clone()), node.range)
            })?;
            function
                .check_arity(args.len())
                .map_err(|error| CompileError::new(error, node.range))?;
            args.iter().try_for_each(|arg| check(context, arg))
        }
    }
}
