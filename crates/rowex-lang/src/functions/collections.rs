use std::collections::BTreeSet;
use std::rc::Rc;

use super::{
    Function, FunctionDescription, FunctionGroup, FunctionRegistry, ParamNum, all_constant,
    invalid_types,
};
use crate::eval::error::EvalError;
use crate::eval::evaluator::{Evaluator, StringFn};
use crate::types::ExpressionType;

pub(super) fn install(registry: &mut FunctionRegistry) {
    registry.register(string_set());
    registry.register(string_list());
    registry.register(size("set_size", "Number of entries in a text set.", true));
    registry.register(size("list_size", "Number of entries in a text list.", false));
    registry.register(membership("in_set", "True when the text set contains the value.", true));
    registry.register(membership(
        "in_list",
        "True when the text list contains the value.",
        false,
    ));
}

fn string_args(name: &'static str, args: &[ExpressionType]) -> Result<(), EvalError> {
    if args.iter().all(|t| *t == ExpressionType::String) {
        Ok(())
    } else {
        Err(invalid_types(name, "nominal arguments"))
    }
}

fn collect_args(args: &[Evaluator]) -> Result<Vec<StringFn>, EvalError> {
    args.iter().map(Evaluator::string_fn).collect()
}

/// Builds a text set from nominal arguments, dropping missing ones. The stop
/// checker is polled once per argument.
fn string_set() -> Function {
    Function::new(
        FunctionDescription {
            name: "string_set",
            params: ParamNum::Unfixed,
            group: FunctionGroup::Collections,
            description: "Builds a text set from its arguments.",
        },
        |args| {
            string_args("string_set", args)?;
            Ok(ExpressionType::StringSet)
        },
        |_ty, stop, args| {
            let vals = collect_args(args)?;
            let stop = stop.clone();
            Ok(Evaluator::string_set(all_constant(args), move || {
                let mut out = BTreeSet::new();
                for v in &vals {
                    stop.check()?;
                    if let Some(s) = v()? {
                        out.insert(s);
                    }
                }
                Ok(Some(Rc::new(out)))
            }))
        },
    )
}

fn string_list() -> Function {
    Function::new(
        FunctionDescription {
            name: "string_list",
            params: ParamNum::Unfixed,
            group: FunctionGroup::Collections,
            description: "Builds a text list from its arguments, keeping order.",
        },
        |args| {
            string_args("string_list", args)?;
            Ok(ExpressionType::StringList)
        },
        |_ty, stop, args| {
            let vals = collect_args(args)?;
            let stop = stop.clone();
            Ok(Evaluator::string_list(all_constant(args), move || {
                let mut out = Vec::new();
                for v in &vals {
                    stop.check()?;
                    if let Some(s) = v()? {
                        out.push(s);
                    }
                }
                Ok(Some(Rc::new(out)))
            }))
        },
    )
}

fn size(name: &'static str, description: &'static str, set: bool) -> Function {
    let expected_ty = if set {
        ExpressionType::StringSet
    } else {
        ExpressionType::StringList
    };
    Function::new(
        FunctionDescription {
            name,
            params: ParamNum::Fixed(1),
            group: FunctionGroup::Collections,
            description,
        },
        move |args| {
            if args[0] == expected_ty {
                Ok(ExpressionType::Integer)
            } else {
                Err(invalid_types(name, "a collection argument"))
            }
        },
        move |ty, _stop, args| {
            let constant = all_constant(args);
            if set {
                let v = args[0].string_set_fn()?;
                Ok(Evaluator::double(ty, constant, move || {
                    Ok(v()?.map(|s| s.len() as f64).unwrap_or(f64::NAN))
                }))
            } else {
                let v = args[0].string_list_fn()?;
                Ok(Evaluator::double(ty, constant, move || {
                    Ok(v()?.map(|l| l.len() as f64).unwrap_or(f64::NAN))
                }))
            }
        },
    )
}

/// Membership is total: a missing value or a missing collection yields false.
fn membership(name: &'static str, description: &'static str, set: bool) -> Function {
    let collection_ty = if set {
        ExpressionType::StringSet
    } else {
        ExpressionType::StringList
    };
    Function::new(
        FunctionDescription {
            name,
            params: ParamNum::Fixed(2),
            group: FunctionGroup::Collections,
            description,
        },
        move |args| {
            if args[0] == ExpressionType::String && args[1] == collection_ty {
                Ok(ExpressionType::Boolean)
            } else {
                Err(invalid_types(name, "a nominal and a collection argument"))
            }
        },
        move |_ty, _stop, args| {
            let value = args[0].string_fn()?;
            let constant = all_constant(args);
            if set {
                let coll = args[1].string_set_fn()?;
                Ok(Evaluator::boolean(constant, move || {
                    Ok(Some(match (value()?, coll()?) {
                        (Some(s), Some(c)) => c.contains(&s),
                        _ => false,
                    }))
                }))
            } else {
                let coll = args[1].string_list_fn()?;
                Ok(Evaluator::boolean(constant, move || {
                    Ok(Some(match (value()?, coll()?) {
                        (Some(s), Some(c)) => c.contains(&s),
                        _ => false,
                    }))
                }))
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

    fn text(s: &str) -> Evaluator {
        Evaluator::constant_string(Some(s.to_string()))
    }

    fn missing() -> Evaluator {
        Evaluator::constant_string(None)
    }

    fn apply(name: &str, args: &[Evaluator]) -> Result<Evaluator, EvalError> {
        FunctionRegistry::standard()
            .get(name)
            .unwrap()
            .compute(&StopChecker::never(), args)
    }

    #[test]
    fn test_string_set_dedupes_and_drops_missing() {
        let e = apply("string_set", &[text("b"), text("a"), missing(), text("a")]).unwrap();
        match e.call_value().unwrap() {
            Value::StringSet(Some(set)) => {
                assert_eq!(
                    set.iter().cloned().collect::<Vec<_>>(),
                    vec!["a".to_string(), "b".to_string()]
                );
            }
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_string_list_keeps_order_and_duplicates() {
        let e = apply("string_list", &[text("b"), missing(), text("a"), text("b")]).unwrap();
        match e.call_value().unwrap() {
            Value::StringList(Some(list)) => {
                assert_eq!(*list, vec!["b".to_string(), "a".to_string(), "b".to_string()]);
            }
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_sizes() {
        let set = apply("string_set", &[text("a"), text("a"), text("b")]).unwrap();
        let e = apply("set_size", &[set]).unwrap();
        assert_eq!(e.ty(), ExpressionType::Integer);
        assert_eq!(e.call_value().unwrap(), Value::Number(2.0));

        let list = apply("string_list", &[text("a"), text("a")]).unwrap();
        let e = apply("list_size", &[list]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_size_of_missing_collection() {
        let e = apply("set_size", &[Evaluator::constant_string_set(None)]).unwrap();
        match e.call_value().unwrap() {
            Value::Number(v) => assert!(v.is_nan()),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_membership() {
        let set = apply("string_set", &[text("a"), text("b")]).unwrap();
        let e = apply("in_set", &[text("a"), set.clone()]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Boolean(Some(true)));

        let e = apply("in_set", &[text("z"), set.clone()]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Boolean(Some(false)));

        let e = apply("in_set", &[missing(), set]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Boolean(Some(false)));

        let list = apply("string_list", &[text("x")]).unwrap();
        let e = apply("in_list", &[text("x"), list]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Boolean(Some(true)));
    }

    #[test]
    fn test_collection_argument_required() {
        assert!(matches!(
            apply("set_size", &[text("a")]),
            Err(EvalError::InvalidTypes { .. })
        ));
    }
}
