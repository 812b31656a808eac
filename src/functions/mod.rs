//! Registry of built-in functions.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::error::CalcResult;
use crate::value::{VariantList, VariantTag};

mod mathematics;
mod statistics;
mod trigonometry;

/// Looks up a built-in function by name, case-insensitively.
pub fn lookup_function(name: &str) -> Option<&'static BuiltinFunction> {
    ALL_FUNCTIONS.get(name.to_ascii_lowercase().as_str())
}

pub const CATEGORIES: &[BuiltinFunctionCategory] = &[
    mathematics::CATEGORY,
    trigonometry::CATEGORY,
    statistics::CATEGORY,
];

lazy_static! {
    /// All built-in functions, keyed by lowercase name. Built lazily on the
    /// first lookup; the map doubles as the memo table for name resolution.
    pub static ref ALL_FUNCTIONS: HashMap<&'static str, BuiltinFunction> = {
        CATEGORIES
            .iter()
            .flat_map(|category| (category.get_functions)())
            .map(|function| (function.name, function))
            .collect()
    };
}

pub type BuiltinFn = Box<dyn 'static + Send + Sync + Fn(&VariantList) -> CalcResult<f64>>;

pub struct BuiltinFunction {
    pub name: &'static str,
    pub eval: BuiltinFn,
}

impl BuiltinFunction {
    /// Constructs a function of one number.
    fn unary(name: &'static str, f: fn(f64) -> f64) -> Self {
        Self {
            name,
            eval: Box::new(move |args| {
                args.assert(&[VariantTag::Number])?;
                Ok(f(args.number_at(0)))
            }),
        }
    }

    /// Constructs a function of two numbers.
    fn binary(name: &'static str, f: fn(f64, f64) -> f64) -> Self {
        Self {
            name,
            eval: Box::new(move |args| {
                args.assert(&[VariantTag::Number, VariantTag::Number])?;
                Ok(f(args.number_at(0), args.number_at(1)))
            }),
        }
    }

    /// Constructs a variadic function over all numeric arguments.
    fn aggregate(name: &'static str, f: fn(&[f64]) -> f64) -> Self {
        Self {
            name,
            eval: Box::new(move |args| Ok(f(&args.to_double_array()))),
        }
    }
}

pub struct BuiltinFunctionCategory {
    pub name: &'static str,
    pub get_functions: fn() -> Vec<BuiltinFunction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Variant;

    use crate::error::CalcErrorMsg;

    fn call(name: &str, args: Vec<Variant>) -> CalcResult<f64> {
        let function = lookup_function(name).expect("no such builtin");
        (function.eval)(&VariantList::from(args))
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(lookup_function("sqrt").is_some());
        assert!(lookup_function("SQRT").is_some());
        assert!(lookup_function("Sqrt").is_some());
        assert!(lookup_function("nope").is_none());
    }

    #[test]
    fn test_aliases_resolve() {
        for name in [
            "arccos", "arcsin", "arctan", "ceiling", "truncate", "acos", "asin", "atan", "ceil",
            "trunc",
        ] {
            assert!(lookup_function(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn test_argument_assertions() {
        assert_eq!(
            CalcErrorMsg::ExpectedParamCount(2),
            call("pow", vec![Variant::Number(2.0)]).unwrap_err().msg,
        );
        assert_eq!(
            CalcErrorMsg::ParamType {
                index: 0,
                expected: VariantTag::Number,
            },
            call("abs", vec![Variant::String("x".to_string())])
                .unwrap_err()
                .msg,
        );
    }
}
