use super::*;

pub const CATEGORY: BuiltinFunctionCategory = BuiltinFunctionCategory {
    name: "Trigonometry functions",
    get_functions,
};

fn get_functions() -> Vec<BuiltinFunction> {
    vec![
        BuiltinFunction::unary("sin", f64::sin),
        BuiltinFunction::unary("cos", f64::cos),
        BuiltinFunction::unary("tan", f64::tan),
        BuiltinFunction::unary("sinh", f64::sinh),
        BuiltinFunction::unary("cosh", f64::cosh),
        BuiltinFunction::unary("tanh", f64::tanh),
        BuiltinFunction::unary("asin", f64::asin),
        BuiltinFunction::unary("arcsin", f64::asin),
        BuiltinFunction::unary("acos", f64::acos),
        BuiltinFunction::unary("arccos", f64::acos),
        BuiltinFunction::unary("atan", f64::atan),
        BuiltinFunction::unary("arctan", f64::atan),
        // atan2(y, x), matching the argument order of the classic math
        // library function.
        BuiltinFunction::binary("atan2", f64::atan2),
    ]
}
