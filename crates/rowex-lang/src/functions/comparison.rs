use std::cmp::Ordering;

use super::{
    Function, FunctionDescription, FunctionGroup, FunctionRegistry, ParamNum, all_constant,
    invalid_types,
};
use crate::eval::error::EvalError;
use crate::eval::evaluator::Evaluator;
use crate::types::ExpressionType;

pub(super) fn install(registry: &mut FunctionRegistry) {
    registry.register(ordering("<", "True when the first value sorts before the second.", |o| {
        o == Ordering::Less
    }));
    registry.register(ordering(
        "<=",
        "True when the first value does not sort after the second.",
        |o| o != Ordering::Greater,
    ));
    registry.register(ordering(">", "True when the first value sorts after the second.", |o| {
        o == Ordering::Greater
    }));
    registry.register(ordering(
        ">=",
        "True when the first value does not sort before the second.",
        |o| o != Ordering::Less,
    ));
    registry.register(equality("==", "True when both values are present and equal.", false));
    registry.register(equality(
        "!=",
        "True when both values are present and different.",
        true,
    ));
}

fn comparable_pair(name: &'static str, args: &[ExpressionType]) -> Result<(), EvalError> {
    let ok = match (args[0], args[1]) {
        (a, b) if a.is_numeric() && b.is_numeric() => true,
        (ExpressionType::String, ExpressionType::String)
        | (ExpressionType::Instant, ExpressionType::Instant)
        | (ExpressionType::LocalTime, ExpressionType::LocalTime) => true,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(invalid_types(name, "two numeric or two equally typed ordered arguments"))
    }
}

/// Ordering comparisons are total: a missing operand compares as false, never
/// as missing and never as an error.
fn ordering(name: &'static str, description: &'static str, op: fn(Ordering) -> bool) -> Function {
    Function::new(
        FunctionDescription {
            name,
            params: ParamNum::Fixed(2),
            group: FunctionGroup::Comparison,
            description,
        },
        move |args| {
            comparable_pair(name, args)?;
            Ok(ExpressionType::Boolean)
        },
        move |_ty, _stop, args| {
            let constant = all_constant(args);
            match args[0].ty() {
                ExpressionType::String => {
                    let lhs = args[0].string_fn()?;
                    let rhs = args[1].string_fn()?;
                    Ok(Evaluator::boolean(constant, move || {
                        Ok(Some(match (lhs()?, rhs()?) {
                            (Some(a), Some(b)) => op(a.cmp(&b)),
                            _ => false,
                        }))
                    }))
                }
                ExpressionType::Instant => {
                    let lhs = args[0].instant_fn()?;
                    let rhs = args[1].instant_fn()?;
                    Ok(Evaluator::boolean(constant, move || {
                        Ok(Some(match (lhs()?, rhs()?) {
                            (Some(a), Some(b)) => op(a.cmp(&b)),
                            _ => false,
                        }))
                    }))
                }
                ExpressionType::LocalTime => {
                    let lhs = args[0].local_time_fn()?;
                    let rhs = args[1].local_time_fn()?;
                    Ok(Evaluator::boolean(constant, move || {
                        Ok(Some(match (lhs()?, rhs()?) {
                            (Some(a), Some(b)) => op(a.cmp(&b)),
                            _ => false,
                        }))
                    }))
                }
                _ => {
                    let lhs = args[0].double_fn()?;
                    let rhs = args[1].double_fn()?;
                    Ok(Evaluator::boolean(constant, move || {
                        let a = lhs()?;
                        let b = rhs()?;
                        Ok(Some(a.partial_cmp(&b).map(op).unwrap_or(false)))
                    }))
                }
            }
        },
    )
}

fn eq_pair(name: &'static str, args: &[ExpressionType]) -> Result<(), EvalError> {
    let ok = match (args[0], args[1]) {
        (a, b) if a.is_numeric() && b.is_numeric() => true,
        (a, b) => a == b,
    };
    if ok {
        Ok(())
    } else {
        Err(invalid_types(name, "two numeric or two equally typed arguments"))
    }
}

fn present_eq<T: PartialEq>(a: Option<T>, b: Option<T>, negated: bool) -> Option<bool> {
    Some(match (a, b) {
        (Some(a), Some(b)) => (a == b) != negated,
        _ => false,
    })
}

/// Equality is total as well: any missing operand yields false, for `!=` too.
fn equality(name: &'static str, description: &'static str, negated: bool) -> Function {
    Function::new(
        FunctionDescription {
            name,
            params: ParamNum::Fixed(2),
            group: FunctionGroup::Comparison,
            description,
        },
        move |args| {
            eq_pair(name, args)?;
            Ok(ExpressionType::Boolean)
        },
        move |_ty, _stop, args| {
            let constant = all_constant(args);
            match args[0].ty() {
                ExpressionType::Boolean => {
                    let lhs = args[0].boolean_fn()?;
                    let rhs = args[1].boolean_fn()?;
                    Ok(Evaluator::boolean(constant, move || {
                        Ok(present_eq(lhs()?, rhs()?, negated))
                    }))
                }
                ExpressionType::String => {
                    let lhs = args[0].string_fn()?;
                    let rhs = args[1].string_fn()?;
                    Ok(Evaluator::boolean(constant, move || {
                        Ok(present_eq(lhs()?, rhs()?, negated))
                    }))
                }
                ExpressionType::Instant => {
                    let lhs = args[0].instant_fn()?;
                    let rhs = args[1].instant_fn()?;
                    Ok(Evaluator::boolean(constant, move || {
                        Ok(present_eq(lhs()?, rhs()?, negated))
                    }))
                }
                ExpressionType::LocalTime => {
                    let lhs = args[0].local_time_fn()?;
                    let rhs = args[1].local_time_fn()?;
                    Ok(Evaluator::boolean(constant, move || {
                        Ok(present_eq(lhs()?, rhs()?, negated))
                    }))
                }
                ExpressionType::StringSet => {
                    let lhs = args[0].string_set_fn()?;
                    let rhs = args[1].string_set_fn()?;
                    Ok(Evaluator::boolean(constant, move || {
                        Ok(present_eq(lhs()?, rhs()?, negated))
                    }))
                }
                ExpressionType::StringList => {
                    let lhs = args[0].string_list_fn()?;
                    let rhs = args[1].string_list_fn()?;
                    Ok(Evaluator::boolean(constant, move || {
                        Ok(present_eq(lhs()?, rhs()?, negated))
                    }))
                }
                _ => {
                    let lhs = args[0].double_fn()?;
                    let rhs = args[1].double_fn()?;
                    Ok(Evaluator::boolean(constant, move || {
                        let a = lhs()?;
                        let b = rhs()?;
                        if a.is_nan() || b.is_nan() {
                            Ok(Some(false))
                        } else {
                            Ok(Some((a == b) != negated))
                        }
                    }))
                }
            }
        },
    )
}
