pub mod error;
pub mod node;
pub mod parser;

pub use node::{Expr, Literal, Node};
