use regex_lite::Regex;

use super::{
    Function, FunctionDescription, FunctionGroup, FunctionRegistry, ParamNum, all_constant,
    invalid_types,
};
use crate::eval::error::EvalError;
use crate::eval::evaluator::{Evaluator, StringFn};
use crate::types::ExpressionType;

pub(super) fn install(registry: &mut FunctionRegistry) {
    registry.register(unary_text("lower", "Lowercases a nominal value.", |s| {
        s.to_lowercase()
    }));
    registry.register(unary_text("upper", "Uppercases a nominal value.", |s| {
        s.to_uppercase()
    }));
    registry.register(unary_text("trim", "Removes leading and trailing whitespace.", |s| {
        s.trim().to_string()
    }));
    registry.register(predicate("starts", "True when the first value starts with the second.", |s, p| {
        s.starts_with(p)
    }));
    registry.register(predicate("ends", "True when the first value ends with the second.", |s, p| {
        s.ends_with(p)
    }));
    registry.register(predicate(
        "contains",
        "True when the first value contains the second.",
        |s, p| s.contains(p),
    ));
    registry.register(matches());
    registry.register(length());
    registry.register(index());
    registry.register(replace());
    registry.register(cut());
    registry.register(char_at());
    registry.register(concat());
}

fn require_string(name: &'static str, args: &[ExpressionType]) -> Result<(), EvalError> {
    if args.iter().all(|t| *t == ExpressionType::String) {
        Ok(())
    } else {
        Err(invalid_types(name, "nominal arguments"))
    }
}

/// Nominal in, nominal out; a missing input stays missing.
fn unary_text(name: &'static str, description: &'static str, op: fn(&str) -> String) -> Function {
    Function::new(
        FunctionDescription {
            name,
            params: ParamNum::Fixed(1),
            group: FunctionGroup::Text,
            description,
        },
        move |args| {
            require_string(name, args)?;
            Ok(ExpressionType::String)
        },
        move |_ty, _stop, args| {
            let v = args[0].string_fn()?;
            Ok(Evaluator::string(all_constant(args), move || {
                Ok(v()?.map(|s| op(&s)))
            }))
        },
    )
}

/// Two nominals in, boolean out; any missing input gives a missing result.
fn predicate(
    name: &'static str,
    description: &'static str,
    op: fn(&str, &str) -> bool,
) -> Function {
    Function::new(
        FunctionDescription {
            name,
            params: ParamNum::Fixed(2),
            group: FunctionGroup::Text,
            description,
        },
        move |args| {
            require_string(name, args)?;
            Ok(ExpressionType::Boolean)
        },
        move |_ty, _stop, args| {
            let lhs = args[0].string_fn()?;
            let rhs = args[1].string_fn()?;
            Ok(Evaluator::boolean(all_constant(args), move || {
                Ok(match (lhs()?, rhs()?) {
                    (Some(a), Some(b)) => Some(op(&a, &b)),
                    _ => None,
                })
            }))
        },
    )
}

fn compile(pattern: &str) -> Result<Regex, EvalError> {
    // whole-value match, as with Java's String#matches
    Regex::new(&format!("^(?:{})$", pattern))
        .map_err(|e| EvalError::InvalidRegularExpression(pattern.to_string(), e.to_string()))
}

/// `matches(value, pattern)`. A constant pattern is compiled while the
/// evaluator tree is built, so a bad pattern fails the build instead of every
/// row.
fn matches() -> Function {
    Function::new(
        FunctionDescription {
            name: "matches",
            params: ParamNum::Fixed(2),
            group: FunctionGroup::Text,
            description: "True when the whole first value matches the regular expression.",
        },
        |args| {
            require_string("matches", args)?;
            Ok(ExpressionType::Boolean)
        },
        |_ty, _stop, args| {
            let value = args[0].string_fn()?;
            let constant = all_constant(args);

            if args[1].is_constant() {
                let pattern = (args[1].string_fn()?)()?;
                return match pattern {
                    Some(p) => {
                        let re = compile(&p)?;
                        Ok(Evaluator::boolean(constant, move || {
                            Ok(value()?.map(|s| re.is_match(&s)))
                        }))
                    }
                    None => Ok(Evaluator::boolean(constant, || Ok(None))),
                };
            }

            let pattern: StringFn = args[1].string_fn()?;
            Ok(Evaluator::boolean(constant, move || {
                match (value()?, pattern()?) {
                    (Some(s), Some(p)) => Ok(Some(compile(&p)?.is_match(&s))),
                    _ => Ok(None),
                }
            }))
        },
    )
}

fn length() -> Function {
    Function::new(
        FunctionDescription {
            name: "length",
            params: ParamNum::Fixed(1),
            group: FunctionGroup::Text,
            description: "Number of characters; missing for a missing value.",
        },
        |args| {
            require_string("length", args)?;
            Ok(ExpressionType::Integer)
        },
        |ty, _stop, args| {
            let v = args[0].string_fn()?;
            Ok(Evaluator::double(ty, all_constant(args), move || {
                Ok(v()?
                    .map(|s| s.chars().count() as f64)
                    .unwrap_or(f64::NAN))
            }))
        },
    )
}

/// Character offset of the second value inside the first, -1 when absent.
fn index() -> Function {
    Function::new(
        FunctionDescription {
            name: "index",
            params: ParamNum::Fixed(2),
            group: FunctionGroup::Text,
            description: "Offset of the second value in the first, or -1.",
        },
        |args| {
            require_string("index", args)?;
            Ok(ExpressionType::Integer)
        },
        |ty, _stop, args| {
            let lhs = args[0].string_fn()?;
            let rhs = args[1].string_fn()?;
            Ok(Evaluator::double(ty, all_constant(args), move || {
                Ok(match (lhs()?, rhs()?) {
                    (Some(s), Some(sub)) => match s.find(&sub) {
                        Some(pos) => s[..pos].chars().count() as f64,
                        None => -1.0,
                    },
                    _ => f64::NAN,
                })
            }))
        },
    )
}

fn replace() -> Function {
    Function::new(
        FunctionDescription {
            name: "replace",
            params: ParamNum::Fixed(3),
            group: FunctionGroup::Text,
            description: "Replaces every literal occurrence of the second value with the third.",
        },
        |args| {
            require_string("replace", args)?;
            Ok(ExpressionType::String)
        },
        |_ty, _stop, args| {
            let value = args[0].string_fn()?;
            let target = args[1].string_fn()?;
            let replacement = args[2].string_fn()?;
            Ok(Evaluator::string(all_constant(args), move || {
                Ok(match (value()?, target()?, replacement()?) {
                    (Some(s), Some(t), Some(r)) => {
                        if t.is_empty() {
                            Some(s)
                        } else {
                            Some(s.replace(&t, &r))
                        }
                    }
                    _ => None,
                })
            }))
        },
    )
}

/// `cut(value, start, length)` in characters; a range that leaves the value
/// yields missing rather than an error.
fn cut() -> Function {
    Function::new(
        FunctionDescription {
            name: "cut",
            params: ParamNum::Fixed(3),
            group: FunctionGroup::Text,
            description: "Substring by character offset and length.",
        },
        |args| {
            if args[0] == ExpressionType::String
                && args[1] == ExpressionType::Integer
                && args[2] == ExpressionType::Integer
            {
                Ok(ExpressionType::String)
            } else {
                Err(invalid_types("cut", "a nominal and two integer arguments"))
            }
        },
        |_ty, _stop, args| {
            let value = args[0].string_fn()?;
            let start = args[1].double_fn()?;
            let len = args[2].double_fn()?;
            Ok(Evaluator::string(all_constant(args), move || {
                let (s, a, n) = (value()?, start()?, len()?);
                let Some(s) = s else { return Ok(None) };
                if a.is_nan() || n.is_nan() || a < 0.0 || n < 0.0 {
                    return Ok(None);
                }
                let (a, n) = (a as usize, n as usize);
                if a + n > s.chars().count() {
                    return Ok(None);
                }
                Ok(Some(s.chars().skip(a).take(n).collect()))
            }))
        },
    )
}

fn char_at() -> Function {
    Function::new(
        FunctionDescription {
            name: "char_at",
            params: ParamNum::Fixed(2),
            group: FunctionGroup::Text,
            description: "The character at the given offset, as a nominal value.",
        },
        |args| {
            if args[0] == ExpressionType::String && args[1] == ExpressionType::Integer {
                Ok(ExpressionType::String)
            } else {
                Err(invalid_types("char_at", "a nominal and an integer argument"))
            }
        },
        |_ty, _stop, args| {
            let value = args[0].string_fn()?;
            let pos = args[1].double_fn()?;
            Ok(Evaluator::string(all_constant(args), move || {
                let (s, i) = (value()?, pos()?);
                let Some(s) = s else { return Ok(None) };
                if i.is_nan() || i < 0.0 {
                    return Ok(None);
                }
                Ok(s.chars().nth(i as usize).map(String::from))
            }))
        },
    )
}

/// Unfixed-arity concatenation; missing arguments contribute nothing, and the
/// stop checker is polled once per argument.
fn concat() -> Function {
    Function::new(
        FunctionDescription {
            name: "concat",
            params: ParamNum::Unfixed,
            group: FunctionGroup::Text,
            description: "Concatenates all arguments, skipping missing values.",
        },
        |args| {
            require_string("concat", args)?;
            Ok(ExpressionType::String)
        },
        |_ty, stop, args| {
            let vals: Vec<StringFn> = args
                .iter()
                .map(Evaluator::string_fn)
                .collect::<Result<_, _>>()?;
            let stop = stop.clone();
            Ok(Evaluator::string(all_constant(args), move || {
                let mut out = String::new();
                for v in &vals {
                    stop.check()?;
                    if let Some(s) = v()? {
                        out.push_str(&s);
                    }
                }
                Ok(Some(out))
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

    fn text(s: &str) -> Evaluator {
        Evaluator::constant_string(Some(s.to_string()))
    }

    fn missing() -> Evaluator {
        Evaluator::constant_string(None)
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

    fn string(name: &str, args: &[Evaluator]) -> Option<String> {
        match apply(name, args).unwrap().call_value().unwrap() {
            Value::String(v) => v,
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[rstest]
    #[case("lower", "HeLLo", "hello")]
    #[case("upper", "hello", "HELLO")]
    #[case("trim", "  a b  ", "a b")]
    fn test_unary_text(#[case] name: &str, #[case] input: &str, #[case] expected: &str) {
        assert_eq!(string(name, &[text(input)]), Some(expected.to_string()));
        assert_eq!(string(name, &[missing()]), None);
    }

    #[test]
    fn test_lower_is_idempotent() {
        let once = string("lower", &[text("ÄbC")]).unwrap();
        let twice = string("lower", &[text(&once)]).unwrap();
        assert_eq!(once, twice);
    }

    #[rstest]
    #[case("starts", "foobar", "foo", Some(true))]
    #[case("starts", "foobar", "bar", Some(false))]
    #[case("ends", "foobar", "bar", Some(true))]
    #[case("contains", "foobar", "oba", Some(true))]
    fn test_predicates(
        #[case] name: &str,
        #[case] s: &str,
        #[case] p: &str,
        #[case] expected: Option<bool>,
    ) {
        let e = apply(name, &[text(s), text(p)]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Boolean(expected));
    }

    #[test]
    fn test_predicate_missing_is_missing() {
        let e = apply("starts", &[missing(), text("a")]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Boolean(None));
    }

    #[test]
    fn test_matches_whole_value() {
        let e = apply("matches", &[text("abc123"), text("[a-c]+\\d+")]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Boolean(Some(true)));

        let e = apply("matches", &[text("abc123x"), text("[a-c]+\\d+")]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Boolean(Some(false)));
    }

    #[test]
    fn test_matches_invalid_constant_pattern_fails_at_build() {
        assert!(matches!(
            apply("matches", &[text("a"), text("(")]),
            Err(EvalError::InvalidRegularExpression(..))
        ));
    }

    #[test]
    fn test_length_and_index() {
        let e = apply("length", &[text("héllo")]).unwrap();
        assert_eq!(e.ty(), ExpressionType::Integer);
        assert_eq!(e.call_value().unwrap(), Value::Number(5.0));

        let e = apply("length", &[missing()]).unwrap();
        match e.call_value().unwrap() {
            Value::Number(v) => assert!(v.is_nan()),
            other => panic!("unexpected value {:?}", other),
        }

        let e = apply("index", &[text("héllo"), text("llo")]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Number(2.0));

        let e = apply("index", &[text("abc"), text("z")]).unwrap();
        assert_eq!(e.call_value().unwrap(), Value::Number(-1.0));
    }

    #[test]
    fn test_replace() {
        assert_eq!(
            string("replace", &[text("banana"), text("an"), text("AN")]),
            Some("bANANa".to_string())
        );
        assert_eq!(
            string("replace", &[text("abc"), missing(), text("x")]),
            None
        );
    }

    #[rstest]
    #[case("hello", 1.0, 3.0, Some("ell"))]
    #[case("hello", 0.0, 5.0, Some("hello"))]
    #[case("hello", 3.0, 3.0, None)]
    #[case("hello", -1.0, 2.0, None)]
    fn test_cut(
        #[case] s: &str,
        #[case] start: f64,
        #[case] len: f64,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(
            string("cut", &[text(s), int(start), int(len)]),
            expected.map(String::from)
        );
    }

    #[test]
    fn test_cut_requires_integer_offsets() {
        assert!(matches!(
            apply(
                "cut",
                &[
                    text("hello"),
                    Evaluator::constant_double(ExpressionType::Double, 1.0),
                    int(2.0)
                ]
            ),
            Err(EvalError::InvalidTypes { .. })
        ));
    }

    #[test]
    fn test_char_at() {
        assert_eq!(string("char_at", &[text("abc"), int(1.0)]), Some("b".to_string()));
        assert_eq!(string("char_at", &[text("abc"), int(9.0)]), None);
    }

    #[test]
    fn test_concat_skips_missing() {
        assert_eq!(
            string("concat", &[text("a"), missing(), text("c")]),
            Some("ac".to_string())
        );
    }
}
