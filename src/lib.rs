//! An embeddable arithmetic expression calculator for spreadsheet-like
//! tables.
//!
//! Beyond plain numeric expressions with variables and functions, it
//! resolves cell references (`A1`, ranges `A1:A9`), a position-relative
//! `cell(col_off, row_off)` helper, and a `countif` predicate over ranges.
//! The host registers variables, operators, and functions, and supplies
//! cell values through a single [`CellProvider`] callback.
//!
//! ```
//! use tablecalc::Calculator;
//!
//! let mut calc = Calculator::new();
//! calc.set_cell_provider(|_: &str| Some("10".to_string()));
//! calc.set_variable("x", 4.0);
//!
//! assert_eq!(30.0, calc.compute("3(7+3)").unwrap());
//! assert_eq!(14.0, calc.compute("x + A1").unwrap());
//! assert_eq!(90.0, calc.compute("sum(A1:A9)").unwrap());
//! ```
//!
//! Evaluation works over a flat, mutable token list: the tokenizer emits
//! string tokens, a fixed sequence of preprocessors rewrites them in place
//! (variables → `countif` → `cell(...)` → ranges), and the evaluator reduces
//! parenthesized groups inside-out before a final operator-precedence scan.


mod calculator;
mod cell_ref;
mod criteria;
mod error;
mod eval;
pub mod functions;
mod lexer;
mod preprocess;
mod value;

pub use calculator::{Calculator, CellProvider};
pub use cell_ref::{CellRef, column_from_name, column_name};
pub use criteria::{CompareOp, Criterion};
pub use error::{CalcError, CalcErrorMsg, CalcResult};
pub use eval::EQUALITY_TOLERANCE;
pub use value::{Variant, VariantList, VariantTag};
