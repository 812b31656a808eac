//! Tagged values passed to user and built-in functions, and the number
//! formatting used everywhere tokens and numbers meet.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum_macros::Display;

use crate::error::{CalcErrorMsg, CalcResult};

/// A single dynamically-typed value.
///
/// Values of different tags compare as "not equal": [`Variant::compare`]
/// returns `None`, which no relation other than not-equal satisfies.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Variant {
    Number(f64),
    Bool(bool),
    String(String),
    Empty,
}

/// Discriminant of a [`Variant`], used for argument type checks.
#[derive(Serialize, Deserialize, Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VariantTag {
    #[strum(to_string = "number")]
    Number,
    #[strum(to_string = "boolean")]
    Bool,
    #[strum(to_string = "string")]
    String,
    #[strum(to_string = "empty")]
    Empty,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Number(n) => write!(f, "{}", format_number(*n)),
            Variant::Bool(true) => write!(f, "true"),
            Variant::Bool(false) => write!(f, "false"),
            Variant::String(s) => write!(f, "{s}"),
            Variant::Empty => Ok(()),
        }
    }
}

impl Variant {
    pub fn tag(&self) -> VariantTag {
        match self {
            Variant::Number(_) => VariantTag::Number,
            Variant::Bool(_) => VariantTag::Bool,
            Variant::String(_) => VariantTag::String,
            Variant::Empty => VariantTag::Empty,
        }
    }

    /// Returns the numeric payload, or `0.0` for any non-number.
    pub fn as_number(&self) -> f64 {
        match self {
            Variant::Number(n) => *n,
            _ => 0.0,
        }
    }

    /// Compares two variants. `None` means the tags differ (or the numbers
    /// are unordered), which only a not-equal test treats as a match.
    ///
    /// Same-tag ordering: numbers by IEEE partial order, booleans with
    /// `false < true`, strings case-insensitively.
    pub fn compare(&self, other: &Variant) -> Option<Ordering> {
        match (self, other) {
            (Variant::Number(a), Variant::Number(b)) => a.partial_cmp(b),
            (Variant::Bool(a), Variant::Bool(b)) => Some(a.cmp(b)),
            (Variant::String(a), Variant::String(b)) => {
                Some(a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()))
            }
            (Variant::Empty, Variant::Empty) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

/// Ordered argument vector handed to functions.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct VariantList(Vec<Variant>);

impl VariantList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: Variant) {
        self.0.push(value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Variant> {
        self.0.get(index)
    }

    pub fn as_slice(&self) -> &[Variant] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variant> {
        self.0.iter()
    }

    /// Returns the numeric payload at `index`, or `0.0` when the slot is
    /// missing or holds a non-number.
    pub fn number_at(&self, index: usize) -> f64 {
        self.0.get(index).map_or(0.0, Variant::as_number)
    }

    /// Checks that at least `types.len()` arguments are present and that the
    /// leading arguments carry the expected tags.
    pub fn assert(&self, types: &[VariantTag]) -> CalcResult<()> {
        if self.0.len() < types.len() {
            return Err(CalcErrorMsg::ExpectedParamCount(types.len()).into());
        }
        for (index, (value, expected)) in self.0.iter().zip(types).enumerate() {
            if value.tag() != *expected {
                return Err(CalcErrorMsg::ParamType {
                    index,
                    expected: *expected,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Collects the numeric arguments: number payloads plus any strings that
    /// parse as numbers. Everything else is dropped.
    pub fn to_double_array(&self) -> SmallVec<[f64; 1]> {
        self.0
            .iter()
            .filter_map(|value| match value {
                Variant::Number(n) => Some(*n),
                Variant::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .collect()
    }
}

impl From<Vec<Variant>> for VariantList {
    fn from(values: Vec<Variant>) -> Self {
        Self(values)
    }
}

impl FromIterator<Variant> for VariantList {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Formats a number the way tokens carry them: invariant decimal notation
/// with `.` as the fractional separator. Round-trips through
/// [`parse_number`].
pub(crate) fn format_number(value: f64) -> String {
    value.to_string()
}

/// Parses a token as a number, reporting it as an undefined variable
/// otherwise.
pub(crate) fn parse_number(token: &str) -> CalcResult<f64> {
    token
        .parse()
        .map_err(|_| CalcErrorMsg::UndefinedVariable(token.to_string()).into())
}

pub(crate) fn is_number(token: &str) -> bool {
    token.parse::<f64>().is_ok()
}
