//! Splits a raw expression into the flat token list the rest of the
//! pipeline rewrites in place.

use crate::eval::OperatorTable;

/// What the previously consumed significant character belonged to. Drives
/// the implicit-multiplication and sign-folding rules; whitespace never
/// updates it, so spacing cannot change the token stream.
#[derive(Copy, Clone, PartialEq, Eq)]
enum Prev {
    Start,
    Number,
    Ident,
    CloseParen,
    Other,
}

/// Multi-character sequences collapsed before scanning, in application
/// order.
const PRE_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("+-", "-"),
    ("-+", "-"),
    ("--", "+"),
    ("==", "="),
    (">=", "\u{2265}"),
    ("<=", "\u{2264}"),
    ("!=", "\u{2260}"),
];

/// Tokenizes an expression. Never fails: ill-formed numbers and unknown
/// symbols become tokens that the evaluator rejects later.
///
/// The operator table is consulted for the sign-folding rule, so that a
/// host-registered operator followed by `-3` folds the sign the same way
/// the built-ins do.
pub(crate) fn tokenize(expression: &str, operators: &OperatorTable) -> Vec<String> {
    let expression = pre_substitute(expression);
    let chars: Vec<char> = expression.chars().collect();
    let mut tokens: Vec<String> = Vec::new();
    let mut prev = Prev::Start;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_alphabetic() {
            // Identifier: letters then letters/digits. `3x` and `)x`
            // multiply.
            if matches!(prev, Prev::Number | Prev::CloseParen) {
                tokens.push("*".to_string());
            }
            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                i += 1;
            }
            tokens.push(chars[start..i].iter().collect());
            prev = Prev::Ident;
        } else if c.is_ascii_digit() || c == '.' {
            // Numeric run: digits and dots, validated only when parsed.
            if prev == Prev::CloseParen {
                tokens.push("*".to_string());
            }
            tokens.push(consume_number(&chars, &mut i));
            prev = Prev::Number;
        } else if (c == '+' || c == '-') && folds_into_number(&chars, i, prev, &tokens, operators)
        {
            tokens.push(consume_number(&chars, &mut i));
            prev = Prev::Number;
        } else if c == '(' {
            // `3(` and `)(` multiply.
            if matches!(prev, Prev::Number | Prev::CloseParen) {
                tokens.push("*".to_string());
            }
            tokens.push("(".to_string());
            prev = Prev::Other;
            i += 1;
        } else {
            tokens.push(c.to_string());
            prev = if c == ')' { Prev::CloseParen } else { Prev::Other };
            i += 1;
        }
    }

    tokens
}

fn pre_substitute(expression: &str) -> String {
    let mut expression = expression.to_string();
    for (from, to) in PRE_SUBSTITUTIONS {
        expression = expression.replace(from, to);
    }
    expression
}

/// Consumes a signed or unsigned numeric run starting at `i`.
fn consume_number(chars: &[char], i: &mut usize) -> String {
    let start = *i;
    *i += 1; // sign, digit, or dot
    while *i < chars.len() && (chars[*i].is_ascii_digit() || chars[*i] == '.') {
        *i += 1;
    }
    chars[start..*i].iter().collect()
}

/// A `+` or `-` is part of the following number when a digit follows it and
/// it cannot be a binary operator: at the start of the expression, after
/// another operator, or after `(`.
fn folds_into_number(
    chars: &[char],
    i: usize,
    prev: Prev,
    tokens: &[String],
    operators: &OperatorTable,
) -> bool {
    if !chars.get(i + 1).is_some_and(char::is_ascii_digit) {
        return false;
    }
    prev == Prev::Start
        || tokens
            .last()
            .is_some_and(|t| t == "(" || operators.contains(t))
}
