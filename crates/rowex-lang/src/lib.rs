//! A typed expression language for deriving values from tabular data.
//!
//! Source text is tokenized, parsed and compiled against an
//! [`ExpressionContext`] into a reusable [`Expression`]. Constant subtrees
//! collapse at build time, so an expression compiled once can be evaluated
//! cheaply for every row of a table by moving the resolver's row cursor.
//!
//! ```rs
//! use std::rc::Rc;
//! use rowex_lang::{Engine, TableColumn, TableRowResolver, Value};
//!
//! let rows = Rc::new(TableRowResolver::new(vec![
//!     TableColumn::double("price", vec![10.0, 2.5]),
//! ]));
//! let mut engine = Engine::default();
//! engine.context_mut().add_dynamic_resolver(rows.clone());
//!
//! let expr = engine.parse("round([price] * 2)").unwrap();
//! assert_eq!(expr.evaluate().unwrap(), Value::Number(20.0));
//!
//! rows.set_row(1);
//! assert_eq!(expr.evaluate().unwrap(), Value::Number(5.0));
//! ```
pub mod ast;
mod checker;
mod compiler;
mod context;
mod engine;
mod error;
mod eval;
mod expression;
mod functions;
pub mod lexer;
pub mod range;
mod resolver;
mod types;
mod value;

pub use context::{Category, ExpressionContext, Resolver, VariableInfo};
pub use engine::Engine;
pub use error::{Error, InnerError};
pub use eval::StopChecker;
pub use eval::error::{CompileError, EvalError};
pub use eval::evaluator::Evaluator;
pub use expression::Expression;
pub use functions::{
    Function, FunctionDescription, FunctionGroup, FunctionRegistry, ParamNum,
};
pub use lexer::token::{Token, TokenKind};
pub use lexer::tokenize;
pub use range::{Position, Range};
pub use resolver::{
    ColumnData, Constant, MacroResolver, SimpleConstantResolver, TableColumn, TableRowResolver,
};
pub use types::ExpressionType;
pub use value::{StringList, StringSet, Value};
