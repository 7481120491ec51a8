use super::{
    Function, FunctionDescription, FunctionGroup, FunctionRegistry, ParamNum, all_constant,
    require_numeric,
};
use crate::eval::evaluator::Evaluator;
use crate::types::ExpressionType;
use crate::value::format_number;

pub(super) fn install(registry: &mut FunctionRegistry) {
    registry.register(str_fn());
    registry.register(parse());
    registry.register(missing());
}

/// Formats a number as a nominal value; a missing number formats as missing,
/// not as the string "NaN".
fn str_fn() -> Function {
    Function::new(
        FunctionDescription {
            name: "str",
            params: ParamNum::Fixed(1),
            group: FunctionGroup::Conversion,
            description: "Formats a number as a nominal value.",
        },
        |args| {
            require_numeric("str", args)?;
            Ok(ExpressionType::String)
        },
        |_ty, _stop, args| {
            let v = args[0].double_fn()?;
            Ok(Evaluator::string(all_constant(args), move || {
                let x = v()?;
                Ok(if x.is_nan() {
                    None
                } else {
                    Some(format_number(x))
                })
            }))
        },
    )
}

/// Parses a nominal value as a number. Anything unparsable, including a
/// missing input, becomes the missing number.
fn parse() -> Function {
    Function::new(
        FunctionDescription {
            name: "parse",
            params: ParamNum::Fixed(1),
            group: FunctionGroup::Conversion,
            description: "Parses a nominal value as a number.",
        },
        |args| {
            if args[0] == ExpressionType::String {
                Ok(ExpressionType::Double)
            } else {
                Err(super::invalid_types("parse", "a nominal argument"))
            }
        },
        |ty, _stop, args| {
            let v = args[0].string_fn()?;
            Ok(Evaluator::double(ty, all_constant(args), move || {
                Ok(v()?
                    .and_then(|s| s.trim().parse::<f64>().ok())
                    .unwrap_or(f64::NAN))
            }))
        },
    )
}

/// True when the argument is the missing value of its type. Never missing
/// itself.
fn missing() -> Function {
    Function::new(
        FunctionDescription {
            name: "missing",
            params: ParamNum::Fixed(1),
            group: FunctionGroup::Conversion,
            description: "True when the argument is missing.",
        },
        |_args| Ok(ExpressionType::Boolean),
        |_ty, _stop, args| {
            let arg = args[0].clone();
            Ok(Evaluator::boolean(all_constant(args), move || {
                Ok(Some(arg.call_value()?.is_missing()))
            }))
        },
    )
}
