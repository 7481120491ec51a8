use super::{
    Function, FunctionDescription, FunctionGroup, FunctionRegistry, ParamNum, all_constant,
    require_numeric,
};
use crate::eval::evaluator::Evaluator;
use crate::types::ExpressionType;

pub(super) fn install(registry: &mut FunctionRegistry) {
    registry.register(rounding("round", "Rounds to the nearest whole number.", |v| {
        v.round()
    }));
    registry.register(rounding("floor", "Largest whole number not above the value.", |v| {
        v.floor()
    }));
    registry.register(rounding("ceil", "Smallest whole number not below the value.", |v| {
        v.ceil()
    }));
}

/// Rounding always reports integer, whatever the input type. The carrier
/// stays `f64`, so a missing input rounds to missing.
fn rounding(name: &'static str, description: &'static str, op: fn(f64) -> f64) -> Function {
    Function::new(
        FunctionDescription {
            name,
            params: ParamNum::Fixed(1),
            group: FunctionGroup::Rounding,
            description,
        },
        move |args| {
            require_numeric(name, args)?;
            Ok(ExpressionType::Integer)
        },
        move |ty, _stop, args| {
            let v = args[0].double_fn()?;
            Ok(Evaluator::double(ty, all_constant(args), move || {
                Ok(op(v()?))
            }))
        },
    )
}
