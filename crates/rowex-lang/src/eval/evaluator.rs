use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use chrono::{DateTime, NaiveTime, Utc};

use super::error::EvalError;
use crate::types::ExpressionType;
use crate::value::{StringList, StringSet, Value};

pub type DoubleFn = Rc<dyn Fn() -> Result<f64, EvalError>>;
pub type BooleanFn = Rc<dyn Fn() -> Result<Option<bool>, EvalError>>;
pub type StringFn = Rc<dyn Fn() -> Result<Option<String>, EvalError>>;
pub type InstantFn = Rc<dyn Fn() -> Result<Option<DateTime<Utc>>, EvalError>>;
pub type LocalTimeFn = Rc<dyn Fn() -> Result<Option<NaiveTime>, EvalError>>;
pub type StringSetFn = Rc<dyn Fn() -> Result<Option<StringSet>, EvalError>>;
pub type StringListFn = Rc<dyn Fn() -> Result<Option<StringList>, EvalError>>;

/// One carrier closure per storage representation. Both numeric types share
/// the `f64` carrier, with NaN standing in for a missing value; every other
/// carrier encodes missing as `None`.
#[derive(Clone)]
pub enum Accessor {
    Double(DoubleFn),
    Boolean(BooleanFn),
    String(StringFn),
    Instant(InstantFn),
    LocalTime(LocalTimeFn),
    StringSet(StringSetFn),
    StringList(StringListFn),
}

/// A compiled node of an expression: its inferred type, whether it is known
/// to be constant, and the lazy closure producing its value.
#[derive(Clone)]
pub struct Evaluator {
    ty: ExpressionType,
    constant: bool,
    accessor: Accessor,
}

impl Evaluator {
    pub fn double(
        ty: ExpressionType,
        constant: bool,
        f: impl Fn() -> Result<f64, EvalError> + 'static,
    ) -> Self {
        debug_assert!(ty.is_numeric());
        Self {
            ty,
            constant,
            accessor: Accessor::Double(Rc::new(f)),
        }
    }

    pub fn constant_double(ty: ExpressionType, v: f64) -> Self {
        Self::double(ty, true, move || Ok(v))
    }

    pub fn boolean(constant: bool, f: impl Fn() -> Result<Option<bool>, EvalError> + 'static) -> Self {
        Self {
            ty: ExpressionType::Boolean,
            constant,
            accessor: Accessor::Boolean(Rc::new(f)),
        }
    }

    pub fn constant_boolean(v: Option<bool>) -> Self {
        Self::boolean(true, move || Ok(v))
    }

    pub fn string(constant: bool, f: impl Fn() -> Result<Option<String>, EvalError> + 'static) -> Self {
        Self {
            ty: ExpressionType::String,
            constant,
            accessor: Accessor::String(Rc::new(f)),
        }
    }

    pub fn constant_string(v: Option<String>) -> Self {
        Self::string(true, move || Ok(v.clone()))
    }

    pub fn instant(
        constant: bool,
        f: impl Fn() -> Result<Option<DateTime<Utc>>, EvalError> + 'static,
    ) -> Self {
        Self {
            ty: ExpressionType::Instant,
            constant,
            accessor: Accessor::Instant(Rc::new(f)),
        }
    }

    pub fn constant_instant(v: Option<DateTime<Utc>>) -> Self {
        Self::instant(true, move || Ok(v))
    }

    pub fn local_time(
        constant: bool,
        f: impl Fn() -> Result<Option<NaiveTime>, EvalError> + 'static,
    ) -> Self {
        Self {
            ty: ExpressionType::LocalTime,
            constant,
            accessor: Accessor::LocalTime(Rc::new(f)),
        }
    }

    pub fn constant_local_time(v: Option<NaiveTime>) -> Self {
        Self::local_time(true, move || Ok(v))
    }

    pub fn string_set(
        constant: bool,
        f: impl Fn() -> Result<Option<StringSet>, EvalError> + 'static,
    ) -> Self {
        Self {
            ty: ExpressionType::StringSet,
            constant,
            accessor: Accessor::StringSet(Rc::new(f)),
        }
    }

    pub fn constant_string_set(v: Option<StringSet>) -> Self {
        Self::string_set(true, move || Ok(v.clone()))
    }

    pub fn string_list(
        constant: bool,
        f: impl Fn() -> Result<Option<StringList>, EvalError> + 'static,
    ) -> Self {
        Self {
            ty: ExpressionType::StringList,
            constant,
            accessor: Accessor::StringList(Rc::new(f)),
        }
    }

    pub fn constant_string_list(v: Option<StringList>) -> Self {
        Self::string_list(true, move || Ok(v.clone()))
    }

    pub fn ty(&self) -> ExpressionType {
        self.ty
    }

    pub fn is_constant(&self) -> bool {
        self.constant
    }

    pub fn double_fn(&self) -> Result<DoubleFn, EvalError> {
        match &self.accessor {
            Accessor::Double(f) => Ok(Rc::clone(f)),
            _ => Err(self.carrier_mismatch("numeric")),
        }
    }

    pub fn boolean_fn(&self) -> Result<BooleanFn, EvalError> {
        match &self.accessor {
            Accessor::Boolean(f) => Ok(Rc::clone(f)),
            _ => Err(self.carrier_mismatch("boolean")),
        }
    }

    pub fn string_fn(&self) -> Result<StringFn, EvalError> {
        match &self.accessor {
            Accessor::String(f) => Ok(Rc::clone(f)),
            _ => Err(self.carrier_mismatch("nominal")),
        }
    }

    pub fn instant_fn(&self) -> Result<InstantFn, EvalError> {
        match &self.accessor {
            Accessor::Instant(f) => Ok(Rc::clone(f)),
            _ => Err(self.carrier_mismatch("date-time")),
        }
    }

    pub fn local_time_fn(&self) -> Result<LocalTimeFn, EvalError> {
        match &self.accessor {
            Accessor::LocalTime(f) => Ok(Rc::clone(f)),
            _ => Err(self.carrier_mismatch("time")),
        }
    }

    pub fn string_set_fn(&self) -> Result<StringSetFn, EvalError> {
        match &self.accessor {
            Accessor::StringSet(f) => Ok(Rc::clone(f)),
            _ => Err(self.carrier_mismatch("text-set")),
        }
    }

    pub fn string_list_fn(&self) -> Result<StringListFn, EvalError> {
        match &self.accessor {
            Accessor::StringList(f) => Ok(Rc::clone(f)),
            _ => Err(self.carrier_mismatch("text-list")),
        }
    }

    fn carrier_mismatch(&self, expected: &str) -> EvalError {
        EvalError::Internal(format!(
            "expected a {} evaluator, found {}",
            expected, self.ty
        ))
    }

    /// Evaluates the node once and wraps the result in a [`Value`].
    pub fn call_value(&self) -> Result<Value, EvalError> {
        match &self.accessor {
            Accessor::Double(f) => Ok(Value::Number(f()?)),
            Accessor::Boolean(f) => Ok(Value::Boolean(f()?)),
            Accessor::String(f) => Ok(Value::String(f()?)),
            Accessor::Instant(f) => Ok(Value::Instant(f()?)),
            Accessor::LocalTime(f) => Ok(Value::LocalTime(f()?)),
            Accessor::StringSet(f) => Ok(Value::StringSet(f()?)),
            Accessor::StringList(f) => Ok(Value::StringList(f()?)),
        }
    }

    /// Collapses a constant node to its value, evaluating it exactly once.
    /// Errors raised by the closure surface here, at build time. Non-constant
    /// nodes pass through untouched.
    pub fn fold(self) -> Result<Self, EvalError> {
        if !self.constant {
            return Ok(self);
        }

        let accessor = match self.accessor {
            Accessor::Double(f) => {
                let v = f()?;
                Accessor::Double(Rc::new(move || Ok(v)))
            }
            Accessor::Boolean(f) => {
                let v = f()?;
                Accessor::Boolean(Rc::new(move || Ok(v)))
            }
            Accessor::String(f) => {
                let v = f()?;
                Accessor::String(Rc::new(move || Ok(v.clone())))
            }
            Accessor::Instant(f) => {
                let v = f()?;
                Accessor::Instant(Rc::new(move || Ok(v)))
            }
            Accessor::LocalTime(f) => {
                let v = f()?;
                Accessor::LocalTime(Rc::new(move || Ok(v)))
            }
            Accessor::StringSet(f) => {
                let v = f()?;
                Accessor::StringSet(Rc::new(move || Ok(v.clone())))
            }
            Accessor::StringList(f) => {
                let v = f()?;
                Accessor::StringList(Rc::new(move || Ok(v.clone())))
            }
        };

        Ok(Self {
            ty: self.ty,
            constant: true,
            accessor,
        })
    }
}

impl Debug for Evaluator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("ty", &self.ty)
            .field("constant", &self.constant)
            .finish_non_exhaustive()
    }
}
