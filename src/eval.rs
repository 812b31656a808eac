//! Evaluation over the flat token list: inside-out parenthesis reduction,
//! function dispatch, and the operator-precedence reducer.

use std::collections::HashMap;

use crate::error::{CalcErrorMsg, CalcResult};
use crate::functions::{self, BuiltinFunction};
use crate::value::{Variant, VariantList, format_number, is_number, parse_number};

/// Absolute tolerance used by the `=`, `≥`, `≤`, and `≠` operators.
pub const EQUALITY_TOLERANCE: f64 = 1e-8;

pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EQUALITY_TOLERANCE
}

pub(crate) type OperatorFn = Box<dyn Fn(f64, f64) -> f64>;
pub(crate) type UserFn = Box<dyn Fn(&VariantList) -> f64>;

/// Ordered operator registry. Iteration order is binding precedence,
/// tightest first; host-registered operators go to the tail.
pub(crate) struct OperatorTable {
    entries: Vec<(String, OperatorFn)>,
}

impl OperatorTable {
    /// The built-in operators, in binding order.
    pub(crate) fn with_builtins() -> Self {
        let mut table = Self {
            entries: Vec::new(),
        };
        table.register("^", f64::powf);
        table.register("%", |a, b| a % b);
        table.register("/", |a, b| a / b);
        table.register("*", |a, b| a * b);
        table.register("-", |a, b| a - b);
        table.register("+", |a, b| a + b);
        table.register(">", |a, b| f64::from(a > b));
        table.register("<", |a, b| f64::from(a < b));
        table.register("\u{2265}", |a, b| f64::from(a > b || approx_eq(a, b)));
        table.register("\u{2264}", |a, b| f64::from(a < b || approx_eq(a, b)));
        table.register("\u{2260}", |a, b| f64::from(!approx_eq(a, b)));
        table.register("=", |a, b| f64::from(approx_eq(a, b)));
        table
    }

    /// Replaces an existing operator in place (keeping its precedence), or
    /// appends a new one at the tail (lowest precedence).
    pub(crate) fn register(
        &mut self,
        symbol: impl Into<String>,
        f: impl Fn(f64, f64) -> f64 + 'static,
    ) {
        let symbol = symbol.into();
        match self.entries.iter_mut().find(|(s, _)| *s == symbol) {
            Some((_, slot)) => *slot = Box::new(f),
            None => self.entries.push((symbol, Box::new(f))),
        }
    }

    pub(crate) fn contains(&self, symbol: &str) -> bool {
        self.entries.iter().any(|(s, _)| s == symbol)
    }

    pub(crate) fn get(&self, symbol: &str) -> Option<&OperatorFn> {
        self.entries
            .iter()
            .find_map(|(s, f)| (s == symbol).then_some(f))
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &OperatorFn)> {
        self.entries.iter().map(|(s, f)| (s.as_str(), f))
    }
}

/// Either a host-registered function or a built-in.
enum Callee<'a> {
    User(&'a UserFn),
    Builtin(&'static BuiltinFunction),
}

/// User functions are case-sensitive and shadow the case-insensitive
/// built-ins.
fn resolve<'a>(name: &str, user_fns: &'a HashMap<String, UserFn>) -> Option<Callee<'a>> {
    if let Some(f) = user_fns.get(name) {
        return Some(Callee::User(f));
    }
    functions::lookup_function(name).map(Callee::Builtin)
}

/// Evaluates a fully-preprocessed token list to a number.
///
/// Repeatedly reduces the innermost parenthesized group (the one opened by
/// the last `(`), dispatching a function when the preceding token names one,
/// then reduces the residual flat list.
pub(crate) fn evaluate(
    mut tokens: Vec<String>,
    operators: &OperatorTable,
    user_fns: &HashMap<String, UserFn>,
) -> CalcResult<f64> {
    while let Some(open) = tokens.iter().rposition(|t| t == "(") {
        let close = tokens[open + 1..]
            .iter()
            .position(|t| t == ")")
            .map(|offset| open + 1 + offset)
            .ok_or(CalcErrorMsg::NoClosingBracket.without_cell())?;
        let inner = tokens[open + 1..close].to_vec();

        let callee_name = (open > 0).then(|| tokens[open - 1].clone());
        let callee = callee_name
            .as_deref()
            .and_then(|name| resolve(name, user_fns));

        let result = match (&callee_name, &callee) {
            (Some(name), Some(callee)) => {
                let args = collect_args(inner, name, operators)?;
                match callee {
                    Callee::User(f) => f(&args),
                    Callee::Builtin(b) => (b.eval)(&args)?,
                }
            }
            _ => reduce_arithmetic(inner, operators)?,
        };

        tokens.splice(open..=close, [format_number(result)]);
        if callee.is_some() {
            tokens.remove(open - 1);
        }
    }

    reduce_arithmetic(tokens, operators)
}

/// Splits a function's argument tokens on top-level commas and reduces each
/// slice to a [`Variant`].
///
/// `countif` is special: a lone argument token that is not a number is
/// passed through as a string, so range values and the matcher survive
/// untouched. Every other slice is an arithmetic sub-expression.
fn collect_args(
    inner: Vec<String>,
    fname: &str,
    operators: &OperatorTable,
) -> CalcResult<VariantList> {
    if inner.is_empty() {
        return Ok(VariantList::new());
    }
    if !inner.iter().any(|t| t == ",") {
        let value = reduce_arithmetic(inner, operators)?;
        return Ok(VariantList::from(vec![Variant::Number(value)]));
    }

    let keep_bare_strings = fname.eq_ignore_ascii_case("countif");
    inner
        .split(|t| t == ",")
        .map(|slice| {
            if keep_bare_strings && slice.len() == 1 && !is_number(&slice[0]) {
                Ok(Variant::String(slice[0].clone()))
            } else {
                reduce_arithmetic(slice.to_vec(), operators).map(Variant::Number)
            }
        })
        .collect()
}

/// Reduces a token list containing only numbers and binary operators.
///
/// Scans the operator table in order; for each operator, the leftmost
/// occurrence is reduced first, which makes every operator left-associative.
pub(crate) fn reduce_arithmetic(
    mut tokens: Vec<String>,
    operators: &OperatorTable,
) -> CalcResult<f64> {
    match tokens.len() {
        0 => return Ok(0.0),
        1 => return parse_number(&tokens[0]),
        2 => return reduce_unary(&tokens[0], &tokens[1], operators),
        _ => (),
    }

    for (symbol, f) in operators.iter() {
        while let Some(p) = tokens.iter().position(|t| t == symbol) {
            let rhs = tokens
                .get(p + 1)
                .ok_or_else(|| CalcErrorMsg::MissingOperand(symbol.to_string()).without_cell())
                .and_then(|t| parse_number(t))?;
            if symbol == "-" && p == 0 {
                tokens[0] = format_number(f(0.0, rhs));
                tokens.remove(1);
            } else if p == 0 {
                return Err(CalcErrorMsg::MissingOperand(symbol.to_string()).into());
            } else {
                let lhs = parse_number(&tokens[p - 1])?;
                tokens[p - 1] = format_number(f(lhs, rhs));
                tokens.drain(p..=p + 1);
            }
        }
    }

    parse_number(&tokens[0])
}

/// Two-token case: a sign or another operator applied to a single operand.
fn reduce_unary(op: &str, rhs: &str, operators: &OperatorTable) -> CalcResult<f64> {
    match op {
        "+" => parse_number(rhs),
        // Negating a literal that is already negative leaves it negative.
        "-" if rhs.starts_with('-') => parse_number(rhs),
        "-" => Ok(-parse_number(rhs)?),
        _ => match operators.get(op) {
            Some(f) => Ok(f(0.0, parse_number(rhs)?)),
            None => Err(CalcErrorMsg::UndefinedOperator(op.to_string()).into()),
        },
    }
}
