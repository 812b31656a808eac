use super::*;

pub const CATEGORY: BuiltinFunctionCategory = BuiltinFunctionCategory {
    name: "Mathematics functions",
    get_functions,
};

fn get_functions() -> Vec<BuiltinFunction> {
    vec![
        BuiltinFunction::unary("abs", f64::abs),
        BuiltinFunction::unary("ceil", f64::ceil),
        BuiltinFunction::unary("ceiling", f64::ceil),
        BuiltinFunction::unary("exp", f64::exp),
        BuiltinFunction::unary("floor", f64::floor),
        BuiltinFunction::binary("pow", f64::powf),
        BuiltinFunction::binary("rem", ieee_remainder),
        // b-th root of a.
        BuiltinFunction::binary("root", |a, b| a.powf(b.recip())),
        // Halves round away from zero.
        BuiltinFunction::unary("round", f64::round),
        BuiltinFunction::unary("sign", sign),
        BuiltinFunction::unary("sqrt", f64::sqrt),
        BuiltinFunction::unary("trunc", f64::trunc),
        BuiltinFunction::unary("truncate", f64::trunc),
    ]
}

/// IEEE 754 remainder: `a - b * n` where `n` is `a / b` rounded to the
/// nearest integer, ties to even.
fn ieee_remainder(a: f64, b: f64) -> f64 {
    a - b * (a / b).round_ties_even()
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        // Preserves NaN; zero has no sign.
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ieee_remainder() {
        assert_eq!(-1.0, ieee_remainder(5.0, 3.0));
        assert_eq!(1.0, ieee_remainder(7.0, 3.0));
        assert_eq!(0.0, ieee_remainder(6.0, 3.0));
        // Tie: 2.5 / 1 rounds to the even quotient 2.
        assert_eq!(0.5, ieee_remainder(2.5, 1.0));
        assert!(ieee_remainder(1.0, 0.0).is_nan());
    }

    #[test]
    fn test_sign() {
        assert_eq!(1.0, sign(42.0));
        assert_eq!(-1.0, sign(-0.5));
        assert_eq!(0.0, sign(0.0));
        assert!(sign(f64::NAN).is_nan());
    }

    #[test]
    fn test_root() {
        let root = |a: f64, b: f64| a.powf(b.recip());
        assert_eq!(3.0, root(27.0, 3.0));
        assert_eq!(2.0, root(4.0, 2.0));
    }
}
