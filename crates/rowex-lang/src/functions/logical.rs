use std::rc::Rc;

use super::{
    Function, FunctionDescription, FunctionGroup, FunctionRegistry, ParamNum, all_constant,
    invalid_types,
};
use crate::eval::error::EvalError;
use crate::eval::evaluator::{BooleanFn, Evaluator};
use crate::types::ExpressionType;

pub(super) fn install(registry: &mut FunctionRegistry) {
    registry.register(and());
    registry.register(or());
    registry.register(not());
    registry.register(if_then_else());
}

/// Coerces a boolean or numeric evaluator to a three-valued truth closure.
/// Nonzero numbers are true; NaN is the unknown truth value.
fn truth_fn(name: &'static str, arg: &Evaluator) -> Result<BooleanFn, EvalError> {
    match arg.ty() {
        ExpressionType::Boolean => arg.boolean_fn(),
        t if t.is_numeric() => {
            let v = arg.double_fn()?;
            Ok(Rc::new(move || {
                let x = v()?;
                Ok(if x.is_nan() { None } else { Some(x != 0.0) })
            }))
        }
        _ => Err(invalid_types(name, "boolean or numeric arguments")),
    }
}

fn truth_args(name: &'static str, args: &[ExpressionType]) -> Result<(), EvalError> {
    if args
        .iter()
        .all(|t| *t == ExpressionType::Boolean || t.is_numeric())
    {
        Ok(())
    } else {
        Err(invalid_types(name, "boolean or numeric arguments"))
    }
}

fn and() -> Function {
    Function::new(
        FunctionDescription {
            name: "&&",
            params: ParamNum::Fixed(2),
            group: FunctionGroup::Logical,
            description: "Three-valued conjunction; false wins over unknown.",
        },
        |args| {
            truth_args("&&", args)?;
            Ok(ExpressionType::Boolean)
        },
        |_ty, _stop, args| {
            let lhs = truth_fn("&&", &args[0])?;
            let rhs = truth_fn("&&", &args[1])?;
            Ok(Evaluator::boolean(all_constant(args), move || {
                match lhs()? {
                    Some(false) => Ok(Some(false)),
                    a => match rhs()? {
                        Some(false) => Ok(Some(false)),
                        Some(true) => Ok(a),
                        None => Ok(None),
                    },
                }
            }))
        },
    )
}

fn or() -> Function {
    Function::new(
        FunctionDescription {
            name: "||",
            params: ParamNum::Fixed(2),
            group: FunctionGroup::Logical,
            description: "Three-valued disjunction; true wins over unknown.",
        },
        |args| {
            truth_args("||", args)?;
            Ok(ExpressionType::Boolean)
        },
        |_ty, _stop, args| {
            let lhs = truth_fn("||", &args[0])?;
            let rhs = truth_fn("||", &args[1])?;
            Ok(Evaluator::boolean(all_constant(args), move || {
                match lhs()? {
                    Some(true) => Ok(Some(true)),
                    a => match rhs()? {
                        Some(true) => Ok(Some(true)),
                        Some(false) => Ok(a),
                        None => Ok(None),
                    },
                }
            }))
        },
    )
}

fn not() -> Function {
    Function::new(
        FunctionDescription {
            name: "!",
            params: ParamNum::Fixed(1),
            group: FunctionGroup::Logical,
            description: "Three-valued negation; unknown stays unknown.",
        },
        |args| {
            truth_args("!", args)?;
            Ok(ExpressionType::Boolean)
        },
        |_ty, _stop, args| {
            let v = truth_fn("!", &args[0])?;
            Ok(Evaluator::boolean(all_constant(args), move || {
                Ok(v()?.map(|b| !b))
            }))
        },
    )
}

/// `if(condition, then, else)`. A missing condition selects the else branch.
/// The branches must share a type; mixed numeric branches widen to real.
fn if_then_else() -> Function {
    Function::new(
        FunctionDescription {
            name: "if",
            params: ParamNum::Fixed(3),
            group: FunctionGroup::Logical,
            description: "Selects the second or third argument by the condition.",
        },
        |args| {
            truth_args("if", &args[..1])?;
            match (args[1], args[2]) {
                (t, e) if t == e => Ok(t),
                (t, e) if t.is_numeric() && e.is_numeric() => Ok(ExpressionType::Double),
                _ => Err(invalid_types("if", "branches of a common type")),
            }
        },
        |ty, _stop, args| {
            let cond = truth_fn("if", &args[0])?;
            let constant = all_constant(args);
            match ty {
                ExpressionType::Boolean => {
                    let t = args[1].boolean_fn()?;
                    let e = args[2].boolean_fn()?;
                    Ok(Evaluator::boolean(constant, move || {
                        if cond()? == Some(true) { t() } else { e() }
                    }))
                }
                ExpressionType::String => {
                    let t = args[1].string_fn()?;
                    let e = args[2].string_fn()?;
                    Ok(Evaluator::string(constant, move || {
                        if cond()? == Some(true) { t() } else { e() }
                    }))
                }
                ExpressionType::Instant => {
                    let t = args[1].instant_fn()?;
                    let e = args[2].instant_fn()?;
                    Ok(Evaluator::instant(constant, move || {
                        if cond()? == Some(true) { t() } else { e() }
                    }))
                }
                ExpressionType::LocalTime => {
                    let t = args[1].local_time_fn()?;
                    let e = args[2].local_time_fn()?;
                    Ok(Evaluator::local_time(constant, move || {
                        if cond()? == Some(true) { t() } else { e() }
                    }))
                }
                ExpressionType::StringSet => {
                    let t = args[1].string_set_fn()?;
                    let e = args[2].string_set_fn()?;
                    Ok(Evaluator::string_set(constant, move || {
                        if cond()? == Some(true) { t() } else { e() }
                    }))
                }
                ExpressionType::StringList => {
                    let t = args[1].string_list_fn()?;
                    let e = args[2].string_list_fn()?;
                    Ok(Evaluator::string_list(constant, move || {
                        if cond()? == Some(true) { t() } else { e() }
                    }))
                }
                _ => {
                    let t = args[1].double_fn()?;
                    let e = args[2].double_fn()?;
                    Ok(Evaluator::double(ty, constant, move || {
                        if cond()? == Some(true) { t() } else { e() }
                    }))
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::StopChecker;
    use crate::functions::FunctionRegistry;
    use crate::value::Value;
    use rstest::rstest;

    fn b(v: Option<bool>) -> Evaluator {
        Evaluator::constant_boolean(v)
    }

    fn int(v: f64) -> Evaluator {
        Evaluator::constant_double(ExpressionType::Integer, v)
    }

    fn apply(name: &str, args: &[Evaluator]) -> Result<Evaluator, EvalError> {
        FunctionRegistry::standard()
            .get(name)
            .unwrap()
            .compute(&StopChecker::never(), args)
    }

    fn truth(name: &str, args: &[Evaluator]) -> Option<bool> {
        match apply(name, args).unwrap().call_value().unwrap() {
            Value::Boolean(v) => v,
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[rstest]
    #[case(Some(true), Some(true), Some(true))]
    #[case(Some(true), Some(false), Some(false))]
    #[case(None, Some(false), Some(false))]
    #[case(None, Some(true), None)]
    #[case(None, None, None)]
    fn test_and(#[case] a: Option<bool>, #[case] x: Option<bool>, #[case] expected: Option<bool>) {
        assert_eq!(truth("&&", &[b(a), b(x)]), expected);
    }

    #[rstest]
    #[case(Some(false), Some(false), Some(false))]
    #[case(Some(false), Some(true), Some(true))]
    #[case(None, Some(true), Some(true))]
    #[case(None, Some(false), None)]
    #[case(None, None, None)]
    fn test_or(#[case] a: Option<bool>, #[case] x: Option<bool>, #[case] expected: Option<bool>) {
        assert_eq!(truth("||", &[b(a), b(x)]), expected);
    }

    #[rstest]
    #[case(Some(true), Some(false))]
    #[case(Some(false), Some(true))]
    #[case(None, None)]
    fn test_not(#[case] v: Option<bool>, #[case] expected: Option<bool>) {
        assert_eq!(truth("!", &[b(v)]), expected);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(truth("&&", &[int(1.0), int(2.0)]), Some(true));
        assert_eq!(truth("&&", &[int(0.0), int(2.0)]), Some(false));
        assert_eq!(truth("||", &[int(0.0), int(f64::NAN)]), None);
    }

    #[test]
    fn test_short_circuit_skips_rhs() {
        let rhs = Evaluator::boolean(false, || Err(EvalError::Internal("rhs".into())));
        assert_eq!(
            apply("&&", &[b(Some(false)), rhs.clone()])
                .unwrap()
                .call_value()
                .unwrap(),
            Value::Boolean(Some(false))
        );
        assert_eq!(
            apply("||", &[b(Some(true)), rhs])
                .unwrap()
                .call_value()
                .unwrap(),
            Value::Boolean(Some(true))
        );
    }

    #[test]
    fn test_if_branches() {
        let e = apply("if", &[b(Some(true)), int(1.0), int(2.0)]).unwrap();
        assert_eq!(e.ty(), ExpressionType::Integer);
        assert_eq!(e.call_value().unwrap(), Value::Number(1.0));

        let e = apply("if", &[b(Some(false)), int(1.0), int(2.0)]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_if_missing_condition_takes_else() {
        let e = apply("if", &[b(None), int(1.0), int(2.0)]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_if_mixed_numeric_branches_widen() {
        let e = apply(
            "if",
            &[
                b(Some(true)),
                int(1.0),
                Evaluator::constant_double(ExpressionType::Double, 2.5),
            ],
        )
        .unwrap();
        assert_eq!(e.ty(), ExpressionType::Double);
    }

    #[test]
    fn test_if_incompatible_branches() {
        assert!(matches!(
            apply(
                "if",
                &[
                    b(Some(true)),
                    int(1.0),
                    Evaluator::constant_string(Some("x".to_string()))
                ]
            ),
            Err(EvalError::InvalidTypes { .. })
        ));
    }

    #[test]
    fn test_nominal_operand_is_rejected() {
        assert!(matches!(
            apply(
                "&&",
                &[b(Some(true)), Evaluator::constant_string(Some("x".into()))]
            ),
            Err(EvalError::InvalidTypes { .. })
        ));
    }
}
