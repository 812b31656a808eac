use itertools::Itertools;

use super::*;
use crate::criteria::{self, Criterion};
use crate::error::CalcErrorMsg;
use crate::value::Variant;

pub const CATEGORY: BuiltinFunctionCategory = BuiltinFunctionCategory {
    name: "Statistics functions",
    get_functions,
};

fn get_functions() -> Vec<BuiltinFunction> {
    vec![
        BuiltinFunction::aggregate("sum", |xs| xs.iter().sum()),
        BuiltinFunction::aggregate("average", |xs| {
            xs.iter().sum::<f64>() / xs.len() as f64
        }),
        BuiltinFunction::aggregate("max", |xs| {
            xs.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b))
        }),
        BuiltinFunction::aggregate("min", |xs| {
            xs.iter().fold(f64::INFINITY, |a, &b| a.min(b))
        }),
        BuiltinFunction::aggregate("median", median),
        BuiltinFunction::aggregate("mode", mode),
        BuiltinFunction::aggregate("range", |xs| {
            xs.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b))
                - xs.iter().fold(f64::INFINITY, |a, &b| a.min(b))
        }),
        BuiltinFunction::aggregate("variance", variance),
        BuiltinFunction::aggregate("stdev", stdev),
        BuiltinFunction {
            name: "countif",
            eval: Box::new(countif),
        },
    ]
}

fn median(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    let sorted = xs.iter().copied().sorted_by(f64::total_cmp).collect_vec();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Most frequent value; the first one seen wins ties.
fn mode(xs: &[f64]) -> f64 {
    let mut best = f64::NAN;
    let mut best_count = 0;
    for &x in xs {
        let count = xs.iter().filter(|&&y| y == x).count();
        if count > best_count {
            best = x;
            best_count = count;
        }
    }
    best
}

/// Sample variance (n − 1 denominator) via the one-pass Welford update.
fn variance(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let mut mean = 0.0;
    let mut sum_squares = 0.0;
    for (i, &x) in xs.iter().enumerate() {
        let delta = x - mean;
        mean += delta / (i + 1) as f64;
        sum_squares += delta * (x - mean);
    }
    sum_squares / (xs.len() - 1) as f64
}

fn stdev(xs: &[f64]) -> f64 {
    let variance = variance(xs);
    if variance.abs() < f64::EPSILON {
        0.0
    } else {
        variance.sqrt()
    }
}

/// Counts the values that satisfy the matcher.
///
/// The argument list arrives as `values…, relation code, matcher`: the
/// preprocessor injects the relation code between the range and the
/// matcher, and the matcher keeps its comparison prefix, so the code slot
/// is consumed without being tested. Empty values are skipped; string
/// values coerce through the same number → boolean → string cascade as the
/// matcher operand.
fn countif(args: &VariantList) -> CalcResult<f64> {
    let [values @ .., _relation_code, matcher] = args.as_slice() else {
        return Err(CalcErrorMsg::CountifArity.into());
    };
    let criterion = Criterion::parse(&matcher.to_string());
    let count = values
        .iter()
        .filter_map(|value| match value {
            Variant::Empty => None,
            Variant::String(s) if s.is_empty() => None,
            Variant::String(s) => Some(criteria::coerce(s)),
            other => Some(other.clone()),
        })
        .filter(|value| criterion.matches(value))
        .count();
    Ok(count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(xs: &[f64]) -> VariantList {
        xs.iter().map(|&x| Variant::Number(x)).collect()
    }

    fn call(name: &str, args: &VariantList) -> CalcResult<f64> {
        (lookup_function(name).expect("no such builtin").eval)(args)
    }

    #[test]
    fn test_aggregates() {
        let args = numbers(&[4.0, 1.0, 7.0, 1.0]);
        assert_eq!(13.0, call("sum", &args).unwrap());
        assert_eq!(3.25, call("average", &args).unwrap());
        assert_eq!(7.0, call("max", &args).unwrap());
        assert_eq!(1.0, call("min", &args).unwrap());
        assert_eq!(6.0, call("range", &args).unwrap());
        assert_eq!(2.5, call("median", &args).unwrap());
        assert_eq!(1.0, call("mode", &args).unwrap());
    }

    #[test]
    fn test_median_odd_count() {
        assert_eq!(4.0, call("median", &numbers(&[9.0, 4.0, 1.0])).unwrap());
    }

    #[test]
    fn test_mode_first_seen_wins_ties() {
        assert_eq!(3.0, mode(&[3.0, 5.0, 3.0, 5.0]));
    }

    #[test]
    fn test_variance_and_stdev() {
        // Sample variance of 2, 4, 4, 4, 5, 5, 7, 9 is 32/7.
        let args = numbers(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let expected = 32.0 / 7.0;
        assert!((call("variance", &args).unwrap() - expected).abs() < 1e-12);
        assert!((call("stdev", &args).unwrap() - expected.sqrt()).abs() < 1e-12);

        assert_eq!(0.0, variance(&[]));
        assert_eq!(0.0, variance(&[42.0]));
        // A constant sample has zero spread, with no -0.0 or NaN from
        // rounding noise.
        assert_eq!(0.0, stdev(&[2.0, 2.0, 2.0]));
    }

    #[test]
    fn test_aggregates_parse_numeric_strings() {
        let args = VariantList::from(vec![
            Variant::Number(1.0),
            Variant::String("2".to_string()),
            Variant::String("skipped".to_string()),
        ]);
        assert_eq!(3.0, call("sum", &args).unwrap());
    }

    #[test]
    fn test_countif_requires_code_and_matcher() {
        assert_eq!(
            CalcErrorMsg::CountifArity,
            call("countif", &numbers(&[1.0])).unwrap_err().msg,
        );
    }

    #[test]
    fn test_countif_relations() {
        // values 1..=5, relation code, matcher
        let mut args = numbers(&[1.0, 2.0, 3.0, 4.0, 5.0, -1.0]);
        args.push(Variant::String("<3".to_string()));
        assert_eq!(2.0, call("countif", &args).unwrap());

        let mut args = numbers(&[1.0, 2.0, 3.0, 4.0, 5.0, 1.0]);
        args.push(Variant::String(">3".to_string()));
        assert_eq!(2.0, call("countif", &args).unwrap());

        let mut args = numbers(&[1.0, 2.0, 3.0, 4.0, 5.0, 3.0]);
        args.push(Variant::String("!3".to_string()));
        assert_eq!(4.0, call("countif", &args).unwrap());

        let mut args = numbers(&[1.0, 2.0, 3.0, 4.0, 5.0, 0.0]);
        args.push(Variant::Number(3.0));
        assert_eq!(1.0, call("countif", &args).unwrap());
    }

    #[test]
    fn test_countif_coerces_string_values() {
        let args = VariantList::from(vec![
            Variant::String("True".to_string()),
            Variant::String("false".to_string()),
            Variant::String("TRUE".to_string()),
            Variant::String(String::new()), // skipped
            Variant::Number(0.0),           // relation code
            Variant::String("true".to_string()),
        ]);
        assert_eq!(2.0, call("countif", &args).unwrap());
    }
}
