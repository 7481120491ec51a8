use super::{
    Function, FunctionDescription, FunctionGroup, FunctionRegistry, ParamNum, all_constant,
    numeric_result, require_numeric,
};
use crate::eval::evaluator::Evaluator;
use crate::types::ExpressionType;

pub(super) fn install(registry: &mut FunctionRegistry) {
    registry.register(unary_real("sqrt", "Square root.", f64::sqrt));
    registry.register(unary_real("exp", "e raised to the given power.", f64::exp));
    registry.register(unary_real("ln", "Natural logarithm.", f64::ln));
    registry.register(unary_real("log", "Base 10 logarithm.", f64::log10));
    registry.register(unary_real("ld", "Base 2 logarithm.", f64::log2));
    registry.register(unary_real("sin", "Sine of an angle in radians.", f64::sin));
    registry.register(unary_real("cos", "Cosine of an angle in radians.", f64::cos));
    registry.register(unary_real("tan", "Tangent of an angle in radians.", f64::tan));
    registry.register(unary_real("asin", "Arc sine, in radians.", f64::asin));
    registry.register(unary_real("acos", "Arc cosine, in radians.", f64::acos));
    registry.register(unary_real("atan", "Arc tangent, in radians.", f64::atan));
    registry.register(unary_real("sinh", "Hyperbolic sine.", f64::sinh));
    registry.register(unary_real("cosh", "Hyperbolic cosine.", f64::cosh));
    registry.register(unary_real("tanh", "Hyperbolic tangent.", f64::tanh));
    registry.register(unary_preserve("abs", "Absolute value.", f64::abs));
    registry.register(unary_preserve("sgn", "Sign of the number as -1, 0 or 1.", |v| {
        if v == 0.0 { 0.0 } else { v.signum() }
    }));
    registry.register(binary_real(
        "atan2",
        "Angle of the point (second, first), in radians.",
        f64::atan2,
    ));
    registry.register(binary_real(
        "pow",
        "Raises the first number to the power of the second.",
        f64::powf,
    ));
    registry.register(modulo());
}

fn unary_real(name: &'static str, description: &'static str, op: fn(f64) -> f64) -> Function {
    Function::new(
        FunctionDescription {
            name,
            params: ParamNum::Fixed(1),
            group: FunctionGroup::Mathematical,
            description,
        },
        move |args| {
            require_numeric(name, args)?;
            Ok(ExpressionType::Double)
        },
        move |ty, _stop, args| {
            let v = args[0].double_fn()?;
            Ok(Evaluator::double(ty, all_constant(args), move || {
                Ok(op(v()?))
            }))
        },
    )
}

fn unary_preserve(name: &'static str, description: &'static str, op: fn(f64) -> f64) -> Function {
    Function::new(
        FunctionDescription {
            name,
            params: ParamNum::Fixed(1),
            group: FunctionGroup::Mathematical,
            description,
        },
        move |args| {
            require_numeric(name, args)?;
            Ok(numeric_result(args))
        },
        move |ty, _stop, args| {
            let v = args[0].double_fn()?;
            Ok(Evaluator::double(ty, all_constant(args), move || {
                Ok(op(v()?))
            }))
        },
    )
}

fn binary_real(name: &'static str, description: &'static str, op: fn(f64, f64) -> f64) -> Function {
    Function::new(
        FunctionDescription {
            name,
            params: ParamNum::Fixed(2),
            group: FunctionGroup::Mathematical,
            description,
        },
        move |args| {
            require_numeric(name, args)?;
            Ok(ExpressionType::Double)
        },
        move |ty, _stop, args| {
            let lhs = args[0].double_fn()?;
            let rhs = args[1].double_fn()?;
            Ok(Evaluator::double(ty, all_constant(args), move || {
                Ok(op(lhs()?, rhs()?))
            }))
        },
    )
}

fn modulo() -> Function {
    Function::new(
        FunctionDescription {
            name: "mod",
            params: ParamNum::Fixed(2),
            group: FunctionGroup::Mathematical,
            description: "Remainder of dividing the first number by the second.",
        },
        |args| {
            require_numeric("mod", args)?;
            Ok(numeric_result(args))
        },
        |ty, _stop, args| {
            let lhs = args[0].double_fn()?;
            let rhs = args[1].double_fn()?;
            Ok(Evaluator::double(ty, all_constant(args), move || {
                Ok(lhs()? % rhs()?)
            }))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::StopChecker;
    use crate::eval::error::EvalError;
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

    fn number(name: &str, args: &[Evaluator]) -> f64 {
        match apply(name, args).unwrap().call_value().unwrap() {
            Value::Number(v) => v,
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[rstest]
    #[case("sqrt", 9.0, 3.0)]
    #[case("exp", 0.0, 1.0)]
    #[case("ln", 1.0, 0.0)]
    #[case("log", 1000.0, 3.0)]
    #[case("ld", 8.0, 3.0)]
    #[case("sin", 0.0, 0.0)]
    #[case("cos", 0.0, 1.0)]
    #[case("abs", -4.0, 4.0)]
    #[case("sgn", -7.0, -1.0)]
    #[case("sgn", 0.0, 0.0)]
    fn test_unary(#[case] name: &str, #[case] v: f64, #[case] expected: f64) {
        assert!((number(name, &[int(v)]) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_unary_real_widens_integers() {
        let e = apply("sqrt", &[int(4.0)]).unwrap();
        assert_eq!(e.ty(), ExpressionType::Double);
    }

    #[test]
    fn test_abs_preserves_integer() {
        let e = apply("abs", &[int(-4.0)]).unwrap();
        assert_eq!(e.ty(), ExpressionType::Integer);
    }

    #[test]
    fn test_pow_and_mod() {
        assert_eq!(number("pow", &[int(2.0), int(10.0)]), 1024.0);
        assert_eq!(number("mod", &[int(7.0), int(3.0)]), 1.0);
        assert_eq!(
            apply("mod", &[int(7.0), int(3.0)]).unwrap().ty(),
            ExpressionType::Integer
        );
    }

    #[test]
    fn test_domain_errors_are_nan() {
        assert!(number("sqrt", &[int(-1.0)]).is_nan());
        assert!(number("ln", &[int(-1.0)]).is_nan());
    }

    #[test]
    fn test_nominal_argument_is_rejected() {
        assert!(matches!(
            apply("sqrt", &[Evaluator::constant_string(Some("x".into()))]),
            Err(EvalError::InvalidTypes { .. })
        ));
    }
}
