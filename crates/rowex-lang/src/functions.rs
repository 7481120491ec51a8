pub mod arithmetic;
pub mod bitwise;
pub mod collections;
pub mod comparison;
pub mod conversion;
pub mod datetime;
pub mod logical;
pub mod mathematical;
pub mod rounding;
pub mod statistical;
pub mod text;

use std::fmt::{self, Debug, Display, Formatter};
use std::rc::Rc;

use compact_str::CompactString;
use rustc_hash::FxHashMap;

use crate::eval::StopChecker;
use crate::eval::error::EvalError;
use crate::eval::evaluator::Evaluator;
use crate::types::ExpressionType;

/// How many arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamNum {
    Fixed(u8),
    Range(u8, u8),
    /// Any positive number of arguments.
    Unfixed,
}

impl ParamNum {
    pub fn is_valid(&self, actual: usize) -> bool {
        match self {
            ParamNum::Fixed(n) => actual == *n as usize,
            ParamNum::Range(min, max) => (*min as usize..=*max as usize).contains(&actual),
            ParamNum::Unfixed => actual >= 1,
        }
    }
}

impl Display for ParamNum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParamNum::Fixed(1) => write!(f, "1 argument"),
            ParamNum::Fixed(n) => write!(f, "{} arguments", n),
            ParamNum::Range(min, max) => write!(f, "{} to {} arguments", min, max),
            ParamNum::Unfixed => write!(f, "at least 1 argument"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionGroup {
    Arithmetic,
    Bitwise,
    Comparison,
    Logical,
    Mathematical,
    Rounding,
    Statistical,
    Text,
    Conversion,
    DateTime,
    Collections,
}

#[derive(Debug, Clone)]
pub struct FunctionDescription {
    pub name: &'static str,
    pub params: ParamNum,
    pub group: FunctionGroup,
    pub description: &'static str,
}

type TypeFn = Rc<dyn Fn(&[ExpressionType]) -> Result<ExpressionType, EvalError>>;
type BuildFn = Rc<dyn Fn(ExpressionType, &StopChecker, &[Evaluator]) -> Result<Evaluator, EvalError>>;

/// A callable in the registry: its description, the type inference rule, and
/// the builder producing the lazy evaluator for a call site.
///
/// `result_type` performs the arity and argument-type checks; `compute` runs
/// them again on the actual argument evaluators before building, so a build
/// never observes arguments the typer rejected.
pub struct Function {
    description: FunctionDescription,
    typer: TypeFn,
    builder: BuildFn,
}

impl Function {
    pub fn new(
        description: FunctionDescription,
        typer: impl Fn(&[ExpressionType]) -> Result<ExpressionType, EvalError> + 'static,
        builder: impl Fn(ExpressionType, &StopChecker, &[Evaluator]) -> Result<Evaluator, EvalError>
        + 'static,
    ) -> Self {
        Self {
            description,
            typer: Rc::new(typer),
            builder: Rc::new(builder),
        }
    }

    pub fn name(&self) -> &'static str {
        self.description.name
    }

    pub fn description(&self) -> &FunctionDescription {
        &self.description
    }

    pub fn check_arity(&self, actual: usize) -> Result<(), EvalError> {
        if self.description.params.is_valid(actual) {
            Ok(())
        } else {
            Err(EvalError::InvalidNumberOfArguments {
                name: CompactString::const_new(self.description.name),
                expected: self.description.params,
                actual,
            })
        }
    }

    pub fn result_type(&self, args: &[ExpressionType]) -> Result<ExpressionType, EvalError> {
        self.check_arity(args.len())?;
        (self.typer)(args)
    }

    pub fn compute(
        &self,
        stop: &StopChecker,
        args: &[Evaluator],
    ) -> Result<Evaluator, EvalError> {
        let tys: Vec<ExpressionType> = args.iter().map(Evaluator::ty).collect();
        let ty = self.result_type(&tys)?;
        (self.builder)(ty, stop, args)
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Name to function lookup. Operator applications are registered under their
/// symbol, so `1 + 2` and a hypothetical `+(1, 2)` dispatch identically.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    map: FxHashMap<CompactString, Rc<Function>>,
}

impl FunctionRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        let mut registry = Self::default();
        arithmetic::install(&mut registry);
        bitwise::install(&mut registry);
        comparison::install(&mut registry);
        logical::install(&mut registry);
        mathematical::install(&mut registry);
        rounding::install(&mut registry);
        statistical::install(&mut registry);
        text::install(&mut registry);
        conversion::install(&mut registry);
        datetime::install(&mut registry);
        collections::install(&mut registry);
        registry
    }

    pub fn register(&mut self, function: Function) {
        self.map.insert(
            CompactString::const_new(function.name()),
            Rc::new(function),
        );
    }

    pub fn get(&self, name: &str) -> Option<Rc<Function>> {
        self.map.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.map.values().map(|f| f.name()).collect();
        names.sort_unstable();
        names
    }
}

pub(crate) fn all_constant(args: &[Evaluator]) -> bool {
    args.iter().all(Evaluator::is_constant)
}

pub(crate) fn invalid_types(name: &'static str, expected: &'static str) -> EvalError {
    EvalError::InvalidTypes {
        name: CompactString::const_new(name),
        expected,
    }
}

/// Integer when every argument is integer, real otherwise.
pub(crate) fn numeric_result(args: &[ExpressionType]) -> ExpressionType {
    if args.iter().all(|t| *t == ExpressionType::Integer) {
        ExpressionType::Integer
    } else {
        ExpressionType::Double
    }
}

pub(crate) fn require_numeric(
    name: &'static str,
    args: &[ExpressionType],
) -> Result<(), EvalError> {
    if args.iter().all(ExpressionType::is_numeric) {
        Ok(())
    } else {
        Err(invalid_types(name, "numeric arguments"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ParamNum::Fixed(2), 2, true)]
    #[case(ParamNum::Fixed(2), 1, false)]
    #[case(ParamNum::Range(1, 2), 1, true)]
    #[case(ParamNum::Range(1, 2), 2, true)]
    #[case(ParamNum::Range(1, 2), 3, false)]
    #[case(ParamNum::Unfixed, 1, true)]
    #[case(ParamNum::Unfixed, 9, true)]
    #[case(ParamNum::Unfixed, 0, false)]
    fn test_param_num_is_valid(
        #[case] params: ParamNum,
        #[case] actual: usize,
        #[case] expected: bool,
    ) {
        assert_eq!(params.is_valid(actual), expected);
    }

    #[rstest]
    #[case(ParamNum::Fixed(1), "1 argument")]
    #[case(ParamNum::Fixed(3), "3 arguments")]
    #[case(ParamNum::Range(1, 2), "1 to 2 arguments")]
    #[case(ParamNum::Unfixed, "at least 1 argument")]
    fn test_param_num_display(#[case] params: ParamNum, #[case] expected: &str) {
        assert_eq!(params.to_string(), expected);
    }

    #[test]
    fn test_standard_registry_lookup() {
        let registry = FunctionRegistry::standard();
        assert!(registry.get("+").is_some());
        assert!(registry.get("sqrt").is_some());
        assert!(registry.get("bit_xor").is_some());
        assert!(registry.get("nosuchfunc").is_none());
    }

    #[test]
    fn test_arity_check_precedes_typing() {
        let registry = FunctionRegistry::standard();
        let pow = registry.get("pow").unwrap();
        assert!(matches!(
            pow.result_type(&[ExpressionType::Integer]),
            Err(EvalError::InvalidNumberOfArguments { actual: 1, .. })
        ));
    }
}
