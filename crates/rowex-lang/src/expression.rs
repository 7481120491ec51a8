use chrono::{DateTime, NaiveTime, Utc};

use crate::eval::error::EvalError;
use crate::eval::evaluator::Evaluator;
use crate::types::ExpressionType;
use crate::value::{StringList, StringSet, Value};

/// A compiled expression, ready to evaluate as often as needed.
///
/// Evaluation reads the resolvers it was built against, so updating a scope
/// value or moving a table row cursor changes what the next call returns.
#[derive(Debug, Clone)]
pub struct Expression {
    root: Evaluator,
}

impl Expression {
    pub(crate) fn new(root: Evaluator) -> Self {
        Self { root }
    }

    pub fn result_type(&self) -> ExpressionType {
        self.root.ty()
    }

    /// Whether the whole tree folded to a constant at build time.
    pub fn is_constant(&self) -> bool {
        self.root.is_constant()
    }

    pub fn evaluate(&self) -> Result<Value, EvalError> {
        self.root.call_value()
    }

    /// Evaluates a numeric expression to its `f64` carrier, NaN for missing.
    pub fn evaluate_double(&self) -> Result<f64, EvalError> {
        self.expect("numeric", ExpressionType::is_numeric)?;
        (self.root.double_fn()?)()
    }

    pub fn evaluate_boolean(&self) -> Result<Option<bool>, EvalError> {
        self.expect("boolean", |t| *t == ExpressionType::Boolean)?;
        (self.root.boolean_fn()?)()
    }

    pub fn evaluate_string(&self) -> Result<Option<String>, EvalError> {
        self.expect("nominal", |t| *t == ExpressionType::String)?;
        (self.root.string_fn()?)()
    }

    pub fn evaluate_instant(&self) -> Result<Option<DateTime<Utc>>, EvalError> {
        self.expect("date-time", |t| *t == ExpressionType::Instant)?;
        (self.root.instant_fn()?)()
    }

    pub fn evaluate_local_time(&self) -> Result<Option<NaiveTime>, EvalError> {
        self.expect("time", |t| *t == ExpressionType::LocalTime)?;
        (self.root.local_time_fn()?)()
    }

    pub fn evaluate_string_set(&self) -> Result<Option<StringSet>, EvalError> {
        self.expect("text-set", |t| *t == ExpressionType::StringSet)?;
        (self.root.string_set_fn()?)()
    }

    pub fn evaluate_string_list(&self) -> Result<Option<StringList>, EvalError> {
        self.expect("text-list", |t| *t == ExpressionType::StringList)?;
        (self.root.string_list_fn()?)()
    }

    /// `expected` names the accepted category for the error message; the
    /// predicate decides, so a category can span several types (numeric).
    fn expect(
        &self,
        expected: &'static str,
        accepts: impl Fn(&ExpressionType) -> bool,
    ) -> Result<(), EvalError> {
        let actual = self.root.ty();
        if accepts(&actual) {
            Ok(())
        } else {
            Err(EvalError::WrongResultType { expected, actual })
        }
    }
}
