use super::{
    Function, FunctionDescription, FunctionGroup, FunctionRegistry, ParamNum, all_constant,
    invalid_types,
};
use crate::eval::error::EvalError;
use crate::eval::evaluator::Evaluator;
use crate::types::ExpressionType;

pub(super) fn install(registry: &mut FunctionRegistry) {
    registry.register(binary("&", "Bitwise and of two integers.", |a, b| a & b));
    registry.register(binary("|", "Bitwise or of two integers.", |a, b| a | b));
    registry.register(binary("bit_xor", "Bitwise exclusive or of two integers.", |a, b| {
        a ^ b
    }));
    registry.register(bit_not());
    registry.register(binary("<<", "Shifts the first integer left.", |a, b| {
        a.wrapping_shl((b & 63) as u32)
    }));
    registry.register(binary(">>", "Shifts the first integer right, keeping the sign.", |a, b| {
        a.wrapping_shr((b & 63) as u32)
    }));
}

fn require_integer(name: &'static str, args: &[ExpressionType]) -> Result<(), EvalError> {
    if args.iter().all(|t| *t == ExpressionType::Integer) {
        Ok(())
    } else {
        Err(invalid_types(name, "integer arguments"))
    }
}

fn binary(name: &'static str, description: &'static str, op: fn(i64, i64) -> i64) -> Function {
    Function::new(
        FunctionDescription {
            name,
            params: ParamNum::Fixed(2),
            group: FunctionGroup::Bitwise,
            description,
        },
        move |args| {
            require_integer(name, args)?;
            Ok(ExpressionType::Integer)
        },
        move |ty, _stop, args| {
            let lhs = args[0].double_fn()?;
            let rhs = args[1].double_fn()?;
            Ok(Evaluator::double(ty, all_constant(args), move || {
                let a = lhs()?;
                let b = rhs()?;
                if a.is_nan() || b.is_nan() {
                    Ok(f64::NAN)
                } else {
                    Ok(op(a as i64, b as i64) as f64)
                }
            }))
        },
    )
}

fn bit_not() -> Function {
    Function::new(
        FunctionDescription {
            name: "~",
            params: ParamNum::Fixed(1),
            group: FunctionGroup::Bitwise,
            description: "Bitwise complement of an integer.",
        },
        |args| {
            require_integer("~", args)?;
            Ok(ExpressionType::Integer)
        },
        |ty, _stop, args| {
            let v = args[0].double_fn()?;
            Ok(Evaluator::double(ty, all_constant(args), move || {
                let a = v()?;
                if a.is_nan() {
                    Ok(f64::NAN)
                } else {
                    Ok(!(a as i64) as f64)
                }
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
    use rstest::rstest;

    fn int(v: f64) -> Evaluator {
        Evaluator::constant_double(ExpressionType::Integer, v)
    }

    fn apply(name: &str, args: &[Evaluator]) -> Result<Evaluator, EvalError> {
        FunctionRegistry::standard()
            .get(name)
            .unwrap()
            .compute(&StopChecker::never(), args)
    }

    #[rstest]
    #[case("&", 5.0, 3.0, 1.0)]
    #[case("|", 5.0, 3.0, 7.0)]
    #[case("bit_xor", 5.0, 3.0, 6.0)]
    #[case("<<", 1.0, 3.0, 8.0)]
    #[case(">>", -8.0, 1.0, -4.0)]
    fn test_binary(#[case] name: &str, #[case] a: f64, #[case] b: f64, #[case] expected: f64) {
        let e = apply(name, &[int(a), int(b)]).unwrap();
        assert_eq!(e.ty(), ExpressionType::Integer);
        assert_eq!(e.call_value().unwrap(), Value::Number(expected));
    }

    #[test]
    fn test_bit_not() {
        let e = apply("~", &[int(5.0)]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Number(-6.0));
    }

    #[test]
    fn test_real_operand_is_rejected() {
        let err = apply(
            "|",
            &[
                Evaluator::constant_double(ExpressionType::Double, 1.5),
                int(2.0),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            EvalError::InvalidTypes {
                name: "|".into(),
                expected: "integer arguments"
            }
        );
    }

    #[test]
    fn test_missing_operand_stays_missing() {
        let e = apply("&", &[int(f64::NAN), int(3.0)]).unwrap();
        match e.call_value().unwrap() {
            Value::Number(v) => assert!(v.is_nan()),
            other => panic!("unexpected value {:?}", other),
        }
    }
}
