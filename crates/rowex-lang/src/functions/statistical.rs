use super::{
    Function, FunctionDescription, FunctionGroup, FunctionRegistry, ParamNum, all_constant,
    numeric_result, require_numeric,
};
use crate::eval::evaluator::{DoubleFn, Evaluator};
use crate::types::ExpressionType;

pub(super) fn install(registry: &mut FunctionRegistry) {
    registry.register(aggregate("avg", "Arithmetic mean of the arguments.", true, |a, b| a + b));
    registry.register(aggregate("sum", "Sum of the arguments.", false, |a, b| a + b));
    registry.register(aggregate("min", "Smallest of the arguments.", false, |a, b| {
        if b < a { b } else { a }
    }));
    registry.register(aggregate("max", "Largest of the arguments.", false, |a, b| {
        if b > a { b } else { a }
    }));
}

/// Unfixed-arity numeric aggregate. A missing argument makes the result
/// missing, and the stop checker is polled once per argument.
fn aggregate(
    name: &'static str,
    description: &'static str,
    average: bool,
    combine: fn(f64, f64) -> f64,
) -> Function {
    Function::new(
        FunctionDescription {
            name,
            params: ParamNum::Unfixed,
            group: FunctionGroup::Statistical,
            description,
        },
        move |args| {
            require_numeric(name, args)?;
            if average {
                Ok(ExpressionType::Double)
            } else {
                Ok(numeric_result(args))
            }
        },
        move |ty, stop, args| {
            let vals: Vec<DoubleFn> = args
                .iter()
                .map(Evaluator::double_fn)
                .collect::<Result<_, _>>()?;
            let stop = stop.clone();
            Ok(Evaluator::double(ty, all_constant(args), move || {
                let mut acc: Option<f64> = None;
                for v in &vals {
                    stop.check()?;
                    let x = v()?;
                    if x.is_nan() {
                        return Ok(f64::NAN);
                    }
                    acc = Some(match acc {
                        None => x,
                        Some(a) => combine(a, x),
                    });
                }
                let total = acc.unwrap_or(f64::NAN);
                if average {
                    Ok(total / vals.len() as f64)
                } else {
                    Ok(total)
                }
            }))
        },
    )
}
