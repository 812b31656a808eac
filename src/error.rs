//! Error reporting for expression evaluation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::VariantTag;

/// Result of evaluating an expression or a step of its pipeline.
pub type CalcResult<T = f64> = Result<T, CalcError>;

/// Error message and the cell it is associated with (if any).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CalcError {
    /// Cell the failure is attributed to, in canonical `A1` form.
    pub cell: Option<String>,
    /// Type of error.
    pub msg: CalcErrorMsg,
}
impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cell {
            Some(cell) => write!(f, "cell {cell}: {}", self.msg),
            None => write!(f, "{}", self.msg),
        }
    }
}
impl std::error::Error for CalcError {}
impl CalcError {
    /// Attaches a cell tag to this error, if it does not already have one.
    pub fn with_cell(mut self, cell: impl Into<String>) -> Self {
        if self.cell.is_none() {
            self.cell = Some(cell.into());
        }
        self
    }
}

/// Information about the type of error that occurred.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcErrorMsg {
    #[error("invalid parameter at cell {0}")]
    UnknownCell(String),
    #[error("invalid range")]
    InvalidRange,
    #[error("undefined cell ref {0}")]
    UndefinedCellRef(String),
    #[error("invalid cell range")]
    InvalidCellRange,
    #[error("no closing bracket")]
    NoClosingBracket,
    #[error("variable {0} is undefined")]
    UndefinedVariable(String),
    #[error("operator {0} is not defined")]
    UndefinedOperator(String),
    #[error("operator {0} is missing an operand")]
    MissingOperand(String),
    #[error("cell function must have two parameters")]
    CellFunctionArity,
    #[error("cell function requires col and row variables")]
    CellFunctionContext,
    #[error("expected {0} parameters")]
    ExpectedParamCount(usize),
    #[error("parameter {index} is not of type {expected}")]
    ParamType { index: usize, expected: VariantTag },
    #[error("countif function requires at least two parameters")]
    CountifArity,
}
impl CalcErrorMsg {
    /// Attaches a cell tag to this error message, returning a [`CalcError`].
    pub fn with_cell(self, cell: impl Into<String>) -> CalcError {
        CalcError {
            cell: Some(cell.into()),
            msg: self,
        }
    }
    /// Returns a [`CalcError`] from this error message, without a cell tag.
    pub const fn without_cell(self) -> CalcError {
        CalcError {
            cell: None,
            msg: self,
        }
    }
}

impl From<CalcErrorMsg> for CalcError {
    fn from(msg: CalcErrorMsg) -> Self {
        msg.without_cell()
    }
}
