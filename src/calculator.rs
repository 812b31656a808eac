//! The calculator instance: owns the variable, operator, and function
//! tables, the host's cell provider, and the evaluation pipeline.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::CalcResult;
use crate::eval::{self, OperatorTable, UserFn};
use crate::lexer;
use crate::preprocess;
use crate::value::VariantList;

/// Supplies raw cell contents to the calculator, keyed by canonical `A1`
/// name. Return `None` for a cell the host does not know; the evaluation
/// fails with a cell-tagged error.
///
/// Implemented for any `FnMut(&str) -> Option<String>` closure. The
/// provider is called synchronously from inside [`Calculator::compute`] and
/// must not re-enter the calculator.
pub trait CellProvider {
    fn cell_value(&mut self, name: &str) -> Option<String>;
}

impl<F: FnMut(&str) -> Option<String>> CellProvider for F {
    fn cell_value(&mut self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Variables preloaded into every new calculator.
const PRELOADED_VARIABLES: &[(&str, f64)] = &[
    ("pi", 3.14159265358979),
    ("tao", 6.28318530717959),
    ("e", 2.71828182845905),
    ("phi", 1.61803398874989),
    ("major", 0.61803398874989),
    ("minor", 0.38196601125011),
    ("pitograd", 57.2957795130823),
    ("piofgrad", 0.01745329251994),
];

/// An embeddable expression calculator with spreadsheet cell references.
///
/// Not thread-safe and not re-entrant: registration mutates the tables in
/// place and an in-flight evaluation owns its token list.
pub struct Calculator {
    variables: HashMap<String, f64>,
    operators: OperatorTable,
    functions: HashMap<String, UserFn>,
    cell_provider: Option<Box<dyn CellProvider>>,
    variable_declarator: String,
}

impl Default for Calculator {
    fn default() -> Self {
        Self {
            variables: PRELOADED_VARIABLES
                .iter()
                .map(|&(name, value)| (name.to_string(), value))
                .collect(),
            operators: OperatorTable::with_builtins(),
            functions: HashMap::new(),
            cell_provider: None,
            variable_declarator: "let".to_string(),
        }
    }
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates an expression.
    ///
    /// The pipeline: tokenize, inline variables and lone cell values,
    /// normalize `countif`, resolve relative `cell(...)` addresses, expand
    /// ranges, then evaluate. Any failure aborts the call; no partial
    /// result is returned.
    pub fn compute(&mut self, expression: &str) -> CalcResult<f64> {
        let mut tokens = lexer::tokenize(expression, &self.operators);
        preprocess::substitute(&mut tokens, &self.variables, &mut self.cell_provider)?;
        preprocess::rewrite_countif(&mut tokens)?;
        preprocess::rewrite_relative_cells(&mut tokens, &self.variables, &self.operators)?;
        preprocess::expand_ranges(&mut tokens, &mut self.cell_provider)?;
        eval::evaluate(tokens, &self.operators, &self.functions)
    }

    /// Like [`Calculator::compute`], but first strips comments, fixes
    /// common typos, and binds `let`-style variable declarations.
    pub fn parse(&mut self, input: &str) -> CalcResult<f64> {
        self.parse_with(input, true, true)
    }

    /// [`Calculator::parse`] with the comment and correction passes
    /// individually switchable.
    pub fn parse_with(
        &mut self,
        input: &str,
        correct: bool,
        identify_comments: bool,
    ) -> CalcResult<f64> {
        let mut input = input.to_string();
        if identify_comments {
            input = BLOCK_COMMENT_REGEX.replace_all(&input, "").into_owned();
            input = LINE_COMMENT_REGEX.replace_all(&input, "").into_owned();
        }
        if correct {
            input = SQR_TYPO_REGEX.replace_all(&input, "sqrt").into_owned();
            input = ARCTAN2_REGEX.replace_all(&input, "atan2").into_owned();
        }

        if let Some((name, expression)) = self.parse_declaration(&input) {
            let value = self.compute(&expression)?;
            self.set_variable(name, value);
            return Ok(value);
        }
        self.compute(&input)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: f64) {
        self.variables.insert(name.into(), value);
    }

    /// Returns a variable's value, or NaN when it is not defined.
    pub fn get_variable(&self, name: &str) -> f64 {
        self.variables.get(name).copied().unwrap_or(f64::NAN)
    }

    /// Registers a function. User functions are case-sensitive and shadow
    /// the built-in of the same name.
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&VariantList) -> f64 + 'static,
    ) {
        self.functions.insert(name.into(), Box::new(f));
    }

    /// Registers a binary operator. New symbols bind loosest; re-registered
    /// symbols keep their precedence.
    pub fn add_operator(
        &mut self,
        symbol: impl Into<String>,
        f: impl Fn(f64, f64) -> f64 + 'static,
    ) {
        self.operators.register(symbol, f);
    }

    pub fn set_cell_provider(&mut self, provider: impl CellProvider + 'static) {
        self.cell_provider = Some(Box::new(provider));
    }

    /// The keyword introducing a variable declaration in
    /// [`Calculator::parse`]. Defaults to `let`.
    pub fn variable_declarator(&self) -> &str {
        &self.variable_declarator
    }

    pub fn set_variable_declarator(&mut self, declarator: impl Into<String>) {
        self.variable_declarator = declarator.into();
    }

    /// Recognizes `let a = X`, `let a be X`, `let a := X` (with the
    /// configured declarator), and bare `a := X`. Returns the name and the
    /// expression to bind it to.
    fn parse_declaration(&self, input: &str) -> Option<(String, String)> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_prefix(self.variable_declarator.as_str())
            .filter(|rest| rest.starts_with(char::is_whitespace));
        if let Some(body) = body {
            split_declaration(body.trim_start())
        } else {
            // Without the keyword, only `:=` declares.
            let (name, expression) = trimmed.split_once(":=")?;
            let name = name.trim();
            is_identifier(name).then(|| (name.to_string(), expression.trim().to_string()))
        }
    }
}

lazy_static! {
    /// `#{ ... }#` block comment; may span lines.
    static ref BLOCK_COMMENT_REGEX: Regex = Regex::new(r"(?s)#\{.*?\}#").unwrap();
    /// `# ...` comment running to the end of the line.
    static ref LINE_COMMENT_REGEX: Regex = Regex::new(r"#[^\n]*").unwrap();
    /// Common misspelling of `sqrt`.
    static ref SQR_TYPO_REGEX: Regex = Regex::new(r"\bsqr\b").unwrap();
    /// Alias spelling, normalized to the registered built-in.
    static ref ARCTAN2_REGEX: Regex = Regex::new(r"\barctan2\b").unwrap();
}

/// Splits `name <sep> expression` where `<sep>` is `:=`, `=`, or a
/// whitespace-delimited `be`. The separator must not touch the name, so
/// names containing the letters `be` survive.
fn split_declaration(body: &str) -> Option<(String, String)> {
    let name_end = body
        .find(|c: char| c.is_whitespace() || c == '=' || c == ':')
        .unwrap_or(body.len());
    let (name, rest) = body.split_at(name_end);
    if !is_identifier(name) {
        return None;
    }
    let rest = rest.trim_start();
    let expression = rest
        .strip_prefix(":=")
        .or_else(|| rest.strip_prefix('='))
        .or_else(|| {
            rest.strip_prefix("be")
                .filter(|r| r.starts_with(char::is_whitespace))
        })?
        .trim();
    (!expression.is_empty()).then(|| (name.to_string(), expression.to_string()))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preloaded_variables() {
        let calc = Calculator::new();
        assert_eq!(3.14159265358979, calc.get_variable("pi"));
        assert_eq!(6.28318530717959, calc.get_variable("tao"));
        assert_eq!(2.71828182845905, calc.get_variable("e"));
        assert_eq!(1.61803398874989, calc.get_variable("phi"));
        assert!(calc.get_variable("missing").is_nan());
    }

    #[test]
    fn test_variables_are_case_sensitive() {
        let mut calc = Calculator::new();
        calc.set_variable("Rate", 2.0);
        assert_eq!(2.0, calc.get_variable("Rate"));
        assert!(calc.get_variable("rate").is_nan());
    }

    #[test]
    fn test_declarations() {
        let mut calc = Calculator::new();
        assert_eq!(3.0, calc.parse("let a = 1 + 2").unwrap());
        assert_eq!(3.0, calc.get_variable("a"));
        assert_eq!(6.0, calc.parse("let b be a * 2").unwrap());
        assert_eq!(7.0, calc.parse("let c := b + 1").unwrap());
        assert_eq!(14.0, calc.parse("d := c * 2").unwrap());
        assert_eq!(14.0, calc.get_variable("d"));
        // Not a declaration: just an equality test.
        assert_eq!(1.0, calc.parse("a = 3").unwrap());
    }

    #[test]
    fn test_declaration_name_containing_be() {
        let mut calc = Calculator::new();
        assert_eq!(5.0, calc.parse("let bend = 5").unwrap());
        assert_eq!(5.0, calc.get_variable("bend"));
        assert_eq!(6.0, calc.parse("let abe be 6").unwrap());
        assert_eq!(6.0, calc.get_variable("abe"));
    }

    #[test]
    fn test_custom_declarator() {
        let mut calc = Calculator::new();
        calc.set_variable_declarator("def");
        assert_eq!("def", calc.variable_declarator());
        assert_eq!(9.0, calc.parse("def x = 9").unwrap());
        assert_eq!(9.0, calc.get_variable("x"));
        // `let` is now an ordinary identifier; `let y` parses as `let * y`
        // only if both are defined, so this fails instead of binding.
        assert!(calc.parse("let y = 1").is_err());
    }

    #[test]
    fn test_comments() {
        let mut calc = Calculator::new();
        assert_eq!(3.0, calc.parse("1 + 2 # trailing note").unwrap());
        assert_eq!(3.0, calc.parse("1 + #{ inline }# 2").unwrap());
        assert_eq!(3.0, calc.parse("1 + #{ multi\nline }# 2").unwrap());
        // With comment handling off, the `#` reaches the evaluator.
        assert_eq!(2.0, calc.parse("2 # + 3").unwrap());
        assert!(calc.parse_with("2 # + 3", true, false).is_err());
    }

    #[test]
    fn test_typo_corrections() {
        let mut calc = Calculator::new();
        assert_eq!(3.0, calc.parse("sqr(9)").unwrap());
        assert_eq!(0.0, calc.parse("arctan2(0, 1)").unwrap());
        // `sqrt` itself is left alone.
        assert_eq!(3.0, calc.parse("sqrt(9)").unwrap());
        assert!(calc.parse_with("sqr(9)", false, true).is_err());
    }

    #[test]
    fn test_operator_re_registration_keeps_precedence() {
        let mut calc = Calculator::new();
        // `*` stays tighter than `+` even after being replaced.
        calc.add_operator("*", |a, b| a * b * 10.0);
        assert_eq!(61.0, calc.compute("1 + 2 * 3").unwrap());
    }

    #[test]
    fn test_user_function_shadows_builtin() {
        let mut calc = Calculator::new();
        calc.add_function("abs", |args| args.number_at(0) + 100.0);
        assert_eq!(95.0, calc.compute("abs(-5)").unwrap());
        // User names are case-sensitive, so the built-in still answers for
        // other spellings.
        assert_eq!(5.0, calc.compute("ABS(-5)").unwrap());
    }
}
