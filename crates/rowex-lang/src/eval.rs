pub mod error;
pub mod evaluator;

use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use error::EvalError;

/// Cooperative cancellation hook polled by unfixed-arity functions while they
/// walk their argument lists.
///
/// The checker is a nullary predicate; once it returns `true` evaluation
/// aborts with [`EvalError::Cancelled`]. [`StopChecker::never`] never stops.
#[derive(Clone, Default)]
pub struct StopChecker(Option<Rc<dyn Fn() -> bool>>);

impl StopChecker {
    pub fn never() -> Self {
        Self(None)
    }

    pub fn new(f: impl Fn() -> bool + 'static) -> Self {
        Self(Some(Rc::new(f)))
    }

    pub fn check(&self) -> Result<(), EvalError> {
        match &self.0 {
            Some(stop) if stop() => Err(EvalError::Cancelled),
            _ => Ok(()),
        }
    }
}

impl Debug for StopChecker {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StopChecker")
            .field(&self.0.as_ref().map(|_| "..."))
            .finish()
    }
}
