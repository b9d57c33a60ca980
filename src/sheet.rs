use std::fmt;
use std::io::Cursor;

use calamine::{Data, Reader};

use crate::error::ParseError;

/// One decoded spreadsheet cell, independent of the workbook format.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Empty,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Integer reading of the cell: whole numbers as-is, floats truncated,
    /// text by its leading digit run. Negative values are rejected.
    pub fn as_count(&self) -> Option<u32> {
        match self {
            Cell::Int(value) => u32::try_from(*value).ok(),
            Cell::Float(value) if value.is_finite() && *value > -1.0 => {
                let truncated = value.trunc();
                if truncated <= f64::from(u32::MAX) {
                    Some(truncated as u32)
                } else {
                    None
                }
            }
            Cell::Text(text) => parse_count(text),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(value) => write!(f, "{value}"),
            Cell::Float(value) => write!(f, "{value}"),
            Cell::Text(text) => f.write_str(text),
            Cell::Bool(value) => write!(f, "{value}"),
            Cell::Empty => Ok(()),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(value) => Cell::Int(*value),
            Data::Float(value) => Cell::Float(*value),
            Data::String(text) => Cell::Text(text.clone()),
            Data::Bool(value) => Cell::Bool(*value),
            Data::DateTime(value) => Cell::Float(value.as_f64()),
            Data::DateTimeIso(text) | Data::DurationIso(text) => Cell::Text(text.clone()),
            _ => Cell::Empty,
        }
    }
}

/// Lenient integer reading used for both CSV fields and text cells:
/// leading whitespace, an optional `+`, then at least one digit. Anything
/// after the digit run is ignored.
pub fn parse_count(raw: &str) -> Option<u32> {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits_end == 0 {
        return None;
    }
    unsigned[..digits_end].parse().ok()
}

/// Decodes the first worksheet of an `.xlsx`/`.xls` blob into rows of cells.
///
/// Column positions are absolute (index 1 is always column B), and each row
/// stops at its last non-empty cell.
pub fn decode_workbook(bytes: &[u8]) -> Result<Vec<Vec<Cell>>, ParseError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ParseError::Malformed("workbook has no worksheets".to_string()))??;

    let leading = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    let grid = range
        .rows()
        .map(|row| {
            let mut cells: Vec<Cell> = std::iter::repeat(Cell::Empty)
                .take(leading)
                .chain(row.iter().map(Cell::from))
                .collect();
            trim_trailing_empty(&mut cells);
            cells
        })
        .collect();

    Ok(grid)
}

pub fn trim_trailing_empty(cells: &mut Vec<Cell>) {
    while cells.last().is_some_and(Cell::is_empty) {
        cells.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_count_reads_leading_digits() {
        assert_eq!(parse_count("80"), Some(80));
        assert_eq!(parse_count("  42 "), Some(42));
        assert_eq!(parse_count("+7"), Some(7));
        assert_eq!(parse_count("12abc"), Some(12));
        assert_eq!(parse_count("abc"), None);
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("-3"), None);
    }

    #[test]
    fn cell_counts_follow_cell_type() {
        assert_eq!(Cell::Int(5).as_count(), Some(5));
        assert_eq!(Cell::Float(80.7).as_count(), Some(80));
        assert_eq!(Cell::Text("15".into()).as_count(), Some(15));
        assert_eq!(Cell::Bool(true).as_count(), None);
        assert_eq!(Cell::Empty.as_count(), None);
        assert_eq!(Cell::Int(-1).as_count(), None);
    }

    #[test]
    fn trailing_empty_cells_are_dropped() {
        let mut cells = vec![Cell::Int(1), Cell::Empty, Cell::Int(2), Cell::Empty, Cell::Empty];
        trim_trailing_empty(&mut cells);
        assert_eq!(cells, vec![Cell::Int(1), Cell::Empty, Cell::Int(2)]);
    }

    #[test]
    fn garbage_bytes_are_a_parse_failure() {
        let err = decode_workbook(b"definitely not a workbook").unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn cells_display_as_plain_text() {
        assert_eq!(Cell::Text("ali@x.com".into()).to_string(), "ali@x.com");
        assert_eq!(Cell::Int(3).to_string(), "3");
        assert_eq!(Cell::Empty.to_string(), "");
    }
}
