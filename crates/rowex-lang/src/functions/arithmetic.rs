use super::{
    Function, FunctionDescription, FunctionGroup, FunctionRegistry, ParamNum, all_constant,
    invalid_types, numeric_result, require_numeric,
};
use crate::eval::evaluator::Evaluator;
use crate::types::ExpressionType;

pub(super) fn install(registry: &mut FunctionRegistry) {
    registry.register(plus());
    registry.register(minus());
    registry.register(binary("*", "Multiplies two numbers.", |a, b| a * b));
    registry.register(binary_real("/", "Divides the first number by the second.", |a, b| {
        a / b
    }));
    registry.register(binary(
        "%",
        "Remainder of dividing the first number by the second.",
        |a, b| a % b,
    ));
    registry.register(binary_real(
        "^",
        "Raises the first number to the power of the second.",
        f64::powf,
    ));
}

/// Integer when both operands are integer, real otherwise.
fn binary(name: &'static str, description: &'static str, op: fn(f64, f64) -> f64) -> Function {
    Function::new(
        FunctionDescription {
            name,
            params: ParamNum::Fixed(2),
            group: FunctionGroup::Arithmetic,
            description,
        },
        move |args| {
            require_numeric(name, args)?;
            Ok(numeric_result(args))
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

/// Always real, even for two integer operands.
fn binary_real(name: &'static str, description: &'static str, op: fn(f64, f64) -> f64) -> Function {
    Function::new(
        FunctionDescription {
            name,
            params: ParamNum::Fixed(2),
            group: FunctionGroup::Arithmetic,
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

fn plus() -> Function {
    Function::new(
        FunctionDescription {
            name: "+",
            params: ParamNum::Fixed(2),
            group: FunctionGroup::Arithmetic,
            description: "Adds two numbers or concatenates two nominal values.",
        },
        |args| match (args[0], args[1]) {
            (ExpressionType::String, ExpressionType::String) => Ok(ExpressionType::String),
            _ if args.iter().all(ExpressionType::is_numeric) => Ok(numeric_result(args)),
            _ => Err(invalid_types("+", "two numeric or two nominal arguments")),
        },
        |ty, _stop, args| {
            if ty == ExpressionType::String {
                let lhs = args[0].string_fn()?;
                let rhs = args[1].string_fn()?;
                Ok(Evaluator::string(all_constant(args), move || {
                    Ok(match (lhs()?, rhs()?) {
                        (Some(a), Some(b)) => Some(a + &b),
                        _ => None,
                    })
                }))
            } else {
                let lhs = args[0].double_fn()?;
                let rhs = args[1].double_fn()?;
                Ok(Evaluator::double(ty, all_constant(args), move || {
                    Ok(lhs()? + rhs()?)
                }))
            }
        },
    )
}

/// Binary subtraction or unary negation. Negation preserves the operand type.
fn minus() -> Function {
    Function::new(
        FunctionDescription {
            name: "-",
            params: ParamNum::Range(1, 2),
            group: FunctionGroup::Arithmetic,
            description: "Subtracts the second number from the first, or negates a single number.",
        },
        |args| {
            require_numeric("-", args)?;
            Ok(numeric_result(args))
        },
        |ty, _stop, args| {
            if args.len() == 1 {
                let v = args[0].double_fn()?;
                Ok(Evaluator::double(ty, all_constant(args), move || Ok(-v()?)))
            } else {
                let lhs = args[0].double_fn()?;
                let rhs = args[1].double_fn()?;
                Ok(Evaluator::double(ty, all_constant(args), move || {
                    Ok(lhs()? - rhs()?)
                }))
            }
        },
    )
}
