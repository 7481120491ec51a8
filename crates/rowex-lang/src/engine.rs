use crate::ast::node::Node;
use crate::ast::parser::Parser;
use crate::checker;
use crate::compiler::Compiler;
use crate::context::ExpressionContext;
use crate::error::Error;
use crate::eval::StopChecker;
use crate::eval::error::EvalError;
use crate::expression::Expression;
use crate::lexer::tokenize;

/// Front door of the crate: owns a context and turns source text into
/// checked or compiled expressions.
#[derive(Debug, Default)]
pub struct Engine {
    context: ExpressionContext,
    stop: StopChecker,
}

impl Engine {
    pub fn new(context: ExpressionContext) -> Self {
        Self {
            context,
            stop: StopChecker::never(),
        }
    }

    pub fn with_stop_checker(mut self, stop: StopChecker) -> Self {
        self.stop = stop;
        self
    }

    pub fn set_stop_checker(&mut self, stop: StopChecker) {
        self.stop = stop;
    }

    pub fn context(&self) -> &ExpressionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ExpressionContext {
        &mut self.context
    }

    /// Tokenizes, parses and validates names and arity without building
    /// evaluators. Argument types are only checked by [`Engine::parse`].
    pub fn check_syntax(&self, input: &str) -> Result<(), Error> {
        let node = self.parse_ast(input)?;
        checker::check(&self.context, &node).map_err(|e| Error::new(input, e))
    }

    /// Compiles the input into a reusable [`Expression`]. Constant subtrees
    /// are evaluated and collapsed here.
    pub fn parse(&self, input: &str) -> Result<Expression, Error> {
        let node = self.parse_ast(input)?;
        let root = Compiler::new(&self.context, self.stop.clone())
            .compile(&node)
            .map_err(|e| Error::new(input, e))?;
        Ok(Expression::new(root))
    }

    fn parse_ast(&self, input: &str) -> Result<Node, Error> {
        if input.trim().is_empty() {
            return Err(Error::new(input, EvalError::EmptyExpression));
        }
        let tokens = tokenize(input).map_err(|e| Error::new(input, e))?;
        Parser::new(&tokens)
            .parse()
            .map_err(|e| Error::new(input, e))
    }
}
