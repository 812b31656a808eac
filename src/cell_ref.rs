//! Cell addresses and the bijective base-26 column codec.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

lazy_static! {
    /// ```ignored
    /// ^[A-Za-z]+[1-9][0-9]*$
    /// ^                    $     match full string
    ///  [A-Za-z]+                 column letters
    ///           [1-9][0-9]*      row number without a leading zero
    /// ```
    pub static ref CELL_REF_REGEX: Regex = Regex::new(r"^[A-Za-z]+[1-9][0-9]*$").unwrap();
}

/// A1-style cell address. Columns and rows are 1-based; `A1` is
/// `CellRef { col: 1, row: 1 }`.
///
/// Input letters are case-insensitive; the canonical form rendered by
/// `Display` is uppercase.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub col: u64,
    pub row: u64,
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.col), self.row)
    }
}

impl CellRef {
    /// Parses an A1-style cell address, or returns `None` if `s` has any
    /// other shape.
    pub fn parse(s: &str) -> Option<CellRef> {
        if !CELL_REF_REGEX.is_match(s) {
            return None;
        }
        let digits_start = s.find(|c: char| c.is_ascii_digit())?;
        let col = column_from_name(&s[..digits_start])?;
        let row = s[digits_start..].parse().ok()?;
        Some(CellRef { col, row })
    }
}

/// Returns a column's letters from its 1-based index (1 is `A`, 26 is `Z`,
/// 27 is `AA`).
pub fn column_name(mut col: u64) -> String {
    let mut letters_reversed = SmallVec::<[u8; 8]>::new();
    while col > 0 {
        col -= 1;
        letters_reversed.push(b'A' + (col % 26) as u8);
        col /= 26;
    }
    letters_reversed.iter().rev().map(|&b| b as char).collect()
}

/// Returns a column's 1-based index from its letters, or `None` if `s` is
/// empty, contains a non-letter, or overflows.
pub fn column_from_name(s: &str) -> Option<u64> {
    let mut col = 0_u64;
    for c in s.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u64) - ('A' as u64);
        col = col.checked_mul(26)?.checked_add(digit + 1)?;
    }
    (col > 0).then_some(col)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_column_name() {
        let pairs = [
            (1, "A"),
            (2, "B"),
            (26, "Z"),
            (27, "AA"),
            (52, "AZ"),
            (53, "BA"),
            (702, "ZZ"),
            (703, "AAA"),
        ];
        for (index, letters) in pairs {
            assert_eq!(letters, column_name(index));
            assert_eq!(Some(index), column_from_name(letters));
        }
        assert_eq!("", column_name(0));
        assert_eq!(Some(1), column_from_name("a"));
        assert_eq!(None, column_from_name(""));
        assert_eq!(None, column_from_name("A1"));
    }

    #[test]
    fn test_cell_ref_parsing() {
        assert_eq!(Some(CellRef { col: 1, row: 1 }), CellRef::parse("A1"));
        assert_eq!(Some(CellRef { col: 1, row: 1 }), CellRef::parse("a1"));
        assert_eq!(Some(CellRef { col: 28, row: 930 }), CellRef::parse("AB930"));
        assert_eq!(None, CellRef::parse("A0"));
        assert_eq!(None, CellRef::parse("A01"));
        assert_eq!(None, CellRef::parse("7"));
        assert_eq!(None, CellRef::parse("sum"));
        assert_eq!(None, CellRef::parse("A1B"));
        assert_eq!(None, CellRef::parse(""));
    }

    #[test]
    fn test_canonical_display() {
        let cell = CellRef::parse("ab12").unwrap();
        assert_eq!("AB12", cell.to_string());
    }

    proptest! {
        #[test]
        fn proptest_column_codec_round_trip(col in 1_u64..=1_000_000) {
            prop_assert_eq!(Some(col), column_from_name(&column_name(col)));
        }
    }
}
