use chrono::{DateTime, NaiveTime, Utc};

use super::{
    Function, FunctionDescription, FunctionGroup, FunctionRegistry, ParamNum, all_constant,
    invalid_types, require_numeric,
};
use crate::eval::error::EvalError;
use crate::eval::evaluator::Evaluator;
use crate::types::ExpressionType;

const TIME_FORMAT: &str = "%H:%M:%S";

pub(super) fn install(registry: &mut FunctionRegistry) {
    registry.register(date_now());
    registry.register(date_parse());
    registry.register(date_millis());
    registry.register(date_str());
    registry.register(date_compare("date_before", "True when the first instant is before the second.", false));
    registry.register(date_compare("date_after", "True when the first instant is after the second.", true));
    registry.register(time_parse());
    registry.register(time_str());
}

fn require_instant(name: &'static str, args: &[ExpressionType]) -> Result<(), EvalError> {
    if args.iter().all(|t| *t == ExpressionType::Instant) {
        Ok(())
    } else {
        Err(invalid_types(name, "date-time arguments"))
    }
}

/// The current instant. Never constant, so it survives folding and yields a
/// fresh value on every evaluation.
fn date_now() -> Function {
    Function::new(
        FunctionDescription {
            name: "date_now",
            params: ParamNum::Fixed(0),
            group: FunctionGroup::DateTime,
            description: "The current instant.",
        },
        |_args| Ok(ExpressionType::Instant),
        |_ty, _stop, _args| Ok(Evaluator::instant(false, || Ok(Some(Utc::now())))),
    )
}

fn date_parse() -> Function {
    Function::new(
        FunctionDescription {
            name: "date_parse",
            params: ParamNum::Fixed(1),
            group: FunctionGroup::DateTime,
            description: "Builds an instant from epoch milliseconds.",
        },
        |args| {
            require_numeric("date_parse", args)?;
            Ok(ExpressionType::Instant)
        },
        |_ty, _stop, args| {
            let v = args[0].double_fn()?;
            Ok(Evaluator::instant(all_constant(args), move || {
                let millis = v()?;
                if millis.is_nan() {
                    return Ok(None);
                }
                Ok(DateTime::from_timestamp_millis(millis as i64))
            }))
        },
    )
}

fn date_millis() -> Function {
    Function::new(
        FunctionDescription {
            name: "date_millis",
            params: ParamNum::Fixed(1),
            group: FunctionGroup::DateTime,
            description: "Epoch milliseconds of an instant.",
        },
        |args| {
            require_instant("date_millis", args)?;
            Ok(ExpressionType::Integer)
        },
        |ty, _stop, args| {
            let v = args[0].instant_fn()?;
            Ok(Evaluator::double(ty, all_constant(args), move || {
                Ok(v()?
                    .map(|d| d.timestamp_millis() as f64)
                    .unwrap_or(f64::NAN))
            }))
        },
    )
}

fn date_str() -> Function {
    Function::new(
        FunctionDescription {
            name: "date_str",
            params: ParamNum::Fixed(1),
            group: FunctionGroup::DateTime,
            description: "Formats an instant as RFC 3339.",
        },
        |args| {
            require_instant("date_str", args)?;
            Ok(ExpressionType::String)
        },
        |_ty, _stop, args| {
            let v = args[0].instant_fn()?;
            Ok(Evaluator::string(all_constant(args), move || {
                Ok(v()?.map(|d| d.to_rfc3339()))
            }))
        },
    )
}

/// Temporal ordering with the same totality rule as the comparison operators:
/// a missing operand compares as false.
fn date_compare(name: &'static str, description: &'static str, after: bool) -> Function {
    Function::new(
        FunctionDescription {
            name,
            params: ParamNum::Fixed(2),
            group: FunctionGroup::DateTime,
            description,
        },
        move |args| {
            require_instant(name, args)?;
            Ok(ExpressionType::Boolean)
        },
        move |_ty, _stop, args| {
            let lhs = args[0].instant_fn()?;
            let rhs = args[1].instant_fn()?;
            Ok(Evaluator::boolean(all_constant(args), move || {
                Ok(Some(match (lhs()?, rhs()?) {
                    (Some(a), Some(b)) => {
                        if after {
                            a > b
                        } else {
                            a < b
                        }
                    }
                    _ => false,
                }))
            }))
        },
    )
}

fn time_parse() -> Function {
    Function::new(
        FunctionDescription {
            name: "time_parse",
            params: ParamNum::Fixed(1),
            group: FunctionGroup::DateTime,
            description: "Parses a nominal value as a time of day, HH:MM:SS.",
        },
        |args| {
            if args[0] == ExpressionType::String {
                Ok(ExpressionType::LocalTime)
            } else {
                Err(invalid_types("time_parse", "a nominal argument"))
            }
        },
        |_ty, _stop, args| {
            let v = args[0].string_fn()?;
            Ok(Evaluator::local_time(all_constant(args), move || {
                Ok(v()?.and_then(|s| NaiveTime::parse_from_str(&s, TIME_FORMAT).ok()))
            }))
        },
    )
}

fn time_str() -> Function {
    Function::new(
        FunctionDescription {
            name: "time_str",
            params: ParamNum::Fixed(1),
            group: FunctionGroup::DateTime,
            description: "Formats a time of day as HH:MM:SS.",
        },
        |args| {
            if args[0] == ExpressionType::LocalTime {
                Ok(ExpressionType::String)
            } else {
                Err(invalid_types("time_str", "a time argument"))
            }
        },
        |_ty, _stop, args| {
            let v = args[0].local_time_fn()?;
            Ok(Evaluator::string(all_constant(args), move || {
                Ok(v()?.map(|t| t.format(TIME_FORMAT).to_string()))
            }))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::StopChecker;
    use crate::functions::FunctionRegistry;
    use crate::value::Value;

    fn real(v: f64) -> Evaluator {
        Evaluator::constant_double(ExpressionType::Double, v)
    }

    fn text(s: &str) -> Evaluator {
        Evaluator::constant_string(Some(s.to_string()))
    }

    fn apply(name: &str, args: &[Evaluator]) -> Result<Evaluator, EvalError> {
        FunctionRegistry::standard()
            .get(name)
            .unwrap()
            .compute(&StopChecker::never(), args)
    }

    #[test]
    fn test_date_now_is_not_constant() {
        let e = apply("date_now", &[]).unwrap();
        assert_eq!(e.ty(), ExpressionType::Instant);
        assert!(!e.is_constant());
        assert!(!e.call_value().unwrap().is_missing());
    }

    #[test]
    fn test_parse_and_millis_invert() {
        let parsed = apply("date_parse", &[real(1_700_000_000_000.0)]).unwrap();
        let millis = apply("date_millis", &[parsed]).unwrap();
        assert_eq!(millis.ty(), ExpressionType::Integer);
        assert_eq!(
            millis.call_value().unwrap(),
            Value::Number(1_700_000_000_000.0)
        );
    }

    #[test]
    fn test_date_parse_missing() {
        let e = apply("date_parse", &[real(f64::NAN)]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Instant(None));
    }

    #[test]
    fn test_date_str() {
        let parsed = apply("date_parse", &[real(0.0)]).unwrap();
        let e = apply("date_str", &[parsed]).unwrap();
        assert_eq!(
            e.call_value().unwrap(),
            Value::String(Some("1970-01-01T00:00:00+00:00".to_string()))
        );
    }

    #[test]
    fn test_date_ordering() {
        let early = apply("date_parse", &[real(1000.0)]).unwrap();
        let late = apply("date_parse", &[real(2000.0)]).unwrap();

        let e = apply("date_before", &[early.clone(), late.clone()]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Boolean(Some(true)));

        let e = apply("date_after", &[early.clone(), late]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Boolean(Some(false)));

        let e = apply("date_before", &[early, Evaluator::constant_instant(None)]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Boolean(Some(false)));
    }

    #[test]
    fn test_time_round_trip() {
        let t = apply("time_parse", &[text("13:45:07")]).unwrap();
        let e = apply("time_str", &[t]).unwrap();
        assert_eq!(
            e.call_value().unwrap(),
            Value::String(Some("13:45:07".to_string()))
        );
    }

    #[test]
    fn test_time_parse_garbage_is_missing() {
        let e = apply("time_parse", &[text("not a time")]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::LocalTime(None));
    }

    #[test]
    fn test_instant_argument_required() {
        assert!(matches!(
            apply("date_millis", &[real(0.0)]),
            Err(EvalError::InvalidTypes { .. })
        ));
    }
}
