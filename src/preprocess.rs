//! Token-stream rewrites applied between tokenization and evaluation, in a
//! fixed order: variable and cell substitution, `countif` normalization,
//! relative `cell(...)` resolution, then range expansion. Each pass reshapes
//! tokens the next one depends on.

use std::collections::HashMap;

use crate::calculator::CellProvider;
use crate::cell_ref::{CellRef, column_name};
use crate::error::{CalcErrorMsg, CalcResult};
use crate::eval::{OperatorTable, reduce_arithmetic};
use crate::value::format_number;

type Provider = Option<Box<dyn CellProvider>>;

/// Replaces variable tokens with their values and lone cell references with
/// the host-provided cell contents.
///
/// A cell-shaped token is left alone when it touches a `:` (range expansion
/// owns it) or is immediately followed by `(` (it names a function, the way
/// `atan2` does).
pub(crate) fn substitute(
    tokens: &mut [String],
    variables: &HashMap<String, f64>,
    provider: &mut Provider,
) -> CalcResult<()> {
    for i in 0..tokens.len() {
        if let Some(value) = variables.get(tokens[i].as_str()) {
            tokens[i] = format_number(*value);
        } else if let Some(cell) = CellRef::parse(&tokens[i]) {
            let in_range = (i > 0 && tokens[i - 1] == ":")
                || tokens.get(i + 1).is_some_and(|next| next == ":");
            let is_call = tokens.get(i + 1).is_some_and(|next| next == "(");
            if !in_range && !is_call {
                tokens[i] = fetch_cell(provider, cell)?;
            }
        }
    }
    Ok(())
}

/// Normalizes every `countif(...)` so its built-in receives
/// `values…, relation code, matcher`.
///
/// The relation code for a leading `>`, `<`, or `!` is `1`, `-1`, or `3`;
/// the comparison token is merged onto its operand so the matcher stays a
/// single token. Without an explicit comparison the code is `0` (equals).
pub(crate) fn rewrite_countif(tokens: &mut Vec<String>) -> CalcResult<()> {
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].eq_ignore_ascii_case("countif")
            && tokens.get(i + 1).is_some_and(|next| next == "(")
        {
            let open = i + 1;
            let close = matching_paren(tokens, open)?;
            if let Some(&comma) = top_level_commas(tokens, open, close).last() {
                let relation_code = match tokens.get(comma + 1).and_then(|t| t.chars().next()) {
                    Some('>') => "1",
                    Some('<') => "-1",
                    Some('!') => "3",
                    _ => "0",
                };
                if relation_code != "0" && comma + 2 < close {
                    let operand = tokens.remove(comma + 2);
                    tokens[comma + 1].push_str(&operand);
                }
                tokens.splice(
                    comma + 1..comma + 1,
                    [relation_code.to_string(), ",".to_string()],
                );
            }
        }
        i += 1;
    }
    Ok(())
}

/// Resolves every `cell(col_off, row_off)` to the address offset from the
/// `col` and `row` variables, splicing in a single address token.
pub(crate) fn rewrite_relative_cells(
    tokens: &mut Vec<String>,
    variables: &HashMap<String, f64>,
    operators: &OperatorTable,
) -> CalcResult<()> {
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].eq_ignore_ascii_case("cell")
            && tokens.get(i + 1).is_some_and(|next| next == "(")
        {
            let open = i + 1;
            let close = matching_paren(tokens, open)?;
            let commas = top_level_commas(tokens, open, close);
            let &[comma] = commas.as_slice() else {
                return Err(CalcErrorMsg::CellFunctionArity.into());
            };
            let (Some(col), Some(row)) = (variables.get("col"), variables.get("row")) else {
                return Err(CalcErrorMsg::CellFunctionContext.into());
            };

            let col_off = reduce_offset(&tokens[open + 1..comma], operators)?;
            let row_off = reduce_offset(&tokens[comma + 1..close], operators)?;
            let col_idx = *col as i64 + col_off;
            let row_idx = *row as i64 + row_off;
            if col_idx < 1 || row_idx < 1 {
                return Err(CalcErrorMsg::UndefinedCellRef(format!(
                    "cell({col_off}, {row_off})"
                ))
                .into());
            }

            let address = format!("{}{row_idx}", column_name(col_idx as u64));
            tokens.splice(i..=close, [address]);
        }
        i += 1;
    }
    Ok(())
}

/// Reduces a relative-cell offset sub-expression, truncating toward zero.
fn reduce_offset(tokens: &[String], operators: &OperatorTable) -> CalcResult<i64> {
    Ok(reduce_arithmetic(tokens.to_vec(), operators)?.trunc() as i64)
}

/// Expands every `addr : addr` window into the comma-separated values of
/// the cells between the endpoints, fetched from the host.
///
/// Endpoints must share a column or a row; iteration always runs from the
/// lesser endpoint to the greater, so `A9:A1` equals `A1:A9`.
pub(crate) fn expand_ranges(tokens: &mut Vec<String>, provider: &mut Provider) -> CalcResult<()> {
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i] != ":" {
            i += 1;
            continue;
        }
        if i == 0 || i + 1 == tokens.len() {
            return Err(CalcErrorMsg::InvalidRange.into());
        }
        let start = parse_endpoint(&tokens[i - 1])?;
        let end = parse_endpoint(&tokens[i + 1])?;

        let cells: Vec<CellRef> = if start.col == end.col {
            let (lo, hi) = (start.row.min(end.row), start.row.max(end.row));
            (lo..=hi).map(|row| CellRef { col: start.col, row }).collect()
        } else if start.row == end.row {
            let (lo, hi) = (start.col.min(end.col), start.col.max(end.col));
            (lo..=hi).map(|col| CellRef { col, row: start.row }).collect()
        } else {
            return Err(CalcErrorMsg::InvalidCellRange.into());
        };

        let mut expansion = Vec::with_capacity(cells.len() * 2 - 1);
        for cell in cells {
            if !expansion.is_empty() {
                expansion.push(",".to_string());
            }
            expansion.push(fetch_cell(provider, cell)?);
        }

        let expansion_len = expansion.len();
        tokens.splice(i - 1..=i + 1, expansion);
        // Resume after the spliced region.
        i = i - 1 + expansion_len;
    }
    Ok(())
}

fn parse_endpoint(token: &str) -> CalcResult<CellRef> {
    CellRef::parse(token)
        .ok_or_else(|| CalcErrorMsg::UndefinedCellRef(token.to_string()).into())
}

/// Fetches a cell's raw value from the host by canonical name.
fn fetch_cell(provider: &mut Provider, cell: CellRef) -> CalcResult<String> {
    let name = cell.to_string();
    provider
        .as_deref_mut()
        .and_then(|p| p.cell_value(&name))
        .ok_or_else(|| CalcErrorMsg::UnknownCell(name).into())
}

/// Index of the `)` matching the `(` at `open`.
fn matching_paren(tokens: &[String], open: usize) -> CalcResult<usize> {
    let mut depth = 0_usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.as_str() {
            "(" => depth += 1,
            ")" => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => (),
        }
    }
    Err(CalcErrorMsg::NoClosingBracket.into())
}

/// Indices of depth-zero commas strictly between `open` and `close`.
fn top_level_commas(tokens: &[String], open: usize, close: usize) -> Vec<usize> {
    let mut depth = 0_i32;
    let mut commas = Vec::new();
    for i in open + 1..close {
        match tokens[i].as_str() {
            "(" => depth += 1,
            ")" => depth -= 1,
            "," if depth == 0 => commas.push(i),
            _ => (),
        }
    }
    commas
}
