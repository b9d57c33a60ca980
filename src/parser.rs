use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::ParseError;
use crate::models::{normalize_name, PerformanceRecord};
use crate::sheet::{self, parse_count, Cell};

const MIN_CSV_FIELDS: usize = 6;
const MIN_SHEET_CELLS: usize = 5;
const NAME_COLUMN: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    DelimitedText,
    Spreadsheet,
}

impl InputKind {
    /// Chooses the parser mode from the upload's file name. Any other suffix
    /// is refused before the bytes are read.
    pub fn from_file_name(file_name: &str) -> Result<Self, ParseError> {
        if file_name.ends_with(".csv") {
            Ok(InputKind::DelimitedText)
        } else if file_name.ends_with(".xlsx") || file_name.ends_with(".xls") {
            Ok(InputKind::Spreadsheet)
        } else {
            Err(ParseError::UnsupportedFile(
                "Sila muat naik fail format .csv atau .xlsx sahaja.".to_string(),
            ))
        }
    }

    pub fn empty_message(self) -> &'static str {
        match self {
            InputKind::DelimitedText => "Tiada data murid dijumpai dalam fail CSV.",
            InputKind::Spreadsheet => {
                "Tiada data murid dijumpai dalam fail Excel. Pastikan format betul."
            }
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            InputKind::DelimitedText => "Ralat memproses fail CSV.",
            InputKind::Spreadsheet => "Ralat memproses fail Excel.",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RawInput {
    pub kind: InputKind,
    pub bytes: Vec<u8>,
}

impl RawInput {
    pub fn read(path: &Path) -> Result<Self, ParseError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let kind = InputKind::from_file_name(file_name)?;
        let bytes = std::fs::read(path).map_err(|err| {
            ParseError::Malformed(format!("cannot read {}: {err}", path.display()))
        })?;
        Ok(Self { kind, bytes })
    }
}

/// A file that decoded cleanly, with or without usable rows.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Records(Vec<PerformanceRecord>),
    Empty,
}

pub trait TabularParser {
    fn parse(&self, input: &RawInput) -> Result<Vec<PerformanceRecord>, ParseError>;
}

/// Column-position heuristics: numbers are the last three columns, email the
/// one before them, and the name sits in the second column.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicParser;

impl TabularParser for HeuristicParser {
    fn parse(&self, input: &RawInput) -> Result<Vec<PerformanceRecord>, ParseError> {
        match input.kind {
            InputKind::DelimitedText => parse_delimited(&input.bytes),
            InputKind::Spreadsheet => {
                let grid = sheet::decode_workbook(&input.bytes)?;
                Ok(parse_grid(&grid))
            }
        }
    }
}

/// Runs a parser and separates "decoded but nothing usable" from real rows.
pub fn parse_upload(
    parser: &dyn TabularParser,
    input: &RawInput,
) -> Result<ParseOutcome, ParseError> {
    let records = parser.parse(input)?;
    debug!(kind = ?input.kind, records = records.len(), "parsed upload");
    if records.is_empty() {
        Ok(ParseOutcome::Empty)
    } else {
        Ok(ParseOutcome::Records(records))
    }
}

pub fn parse_delimited(bytes: &[u8]) -> Result<Vec<PerformanceRecord>, ParseError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(bytes);

    let mut students = Vec::new();
    for result in reader.records() {
        let record = result?;
        let first_line = record.position().map(|pos| pos.line()) == Some(1);
        if first_line && is_header_line(record.get(0).unwrap_or_default()) {
            continue;
        }

        let fields: Vec<&str> = record.iter().collect();
        if let Some(student) = record_from_fields(&fields) {
            students.push(student);
        }
    }

    Ok(students)
}

fn is_header_line(first_field: &str) -> bool {
    first_field.starts_with('#') || first_field.starts_with("Nama")
}

fn record_from_fields(fields: &[&str]) -> Option<PerformanceRecord> {
    if fields.len() < MIN_CSV_FIELDS {
        return None;
    }

    let last = fields.len() - 1;
    let points = parse_count(fields[last]).unwrap_or(0);
    let records = parse_count(fields[last - 1]).unwrap_or(0);
    let stars = parse_count(fields[last - 2]).unwrap_or(0);
    let email = fields[last - 3].trim().to_string();

    let joined = fields[1..last - 3].join(",");
    let unquoted = joined.strip_prefix('"').unwrap_or(&joined);
    let unquoted = unquoted.strip_suffix('"').unwrap_or(unquoted);

    Some(PerformanceRecord {
        name: normalize_name(unquoted),
        email,
        stars,
        records,
        points,
    })
}

pub fn parse_grid(grid: &[Vec<Cell>]) -> Vec<PerformanceRecord> {
    grid.iter().filter_map(|row| record_from_row(row)).collect()
}

fn record_from_row(row: &[Cell]) -> Option<PerformanceRecord> {
    if row.len() < MIN_SHEET_CELLS {
        return None;
    }

    let last = row.len() - 1;
    let points = row[last].as_count()?;
    let records = row[last - 1].as_count()?;
    let stars = row[last - 2].as_count()?;

    let name = row.get(NAME_COLUMN)?.as_text()?;
    if name.is_empty() || name.to_lowercase().contains("nama") {
        return None;
    }

    Some(PerformanceRecord {
        name: normalize_name(name),
        email: row[last - 3].to_string(),
        stars,
        records,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Cell {
        Cell::Text(value.to_string())
    }

    #[test]
    fn parses_the_documented_example() {
        let csv = "Nama,Email,Bintang,Rekod,Mata\n1,Ali Bin Ahmad,ali@x.com,5,3,80\n";
        let records = parse_delimited(csv.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![PerformanceRecord {
                name: "ALI BIN AHMAD".to_string(),
                email: "ali@x.com".to_string(),
                stars: 5,
                records: 3,
                points: 80,
            }]
        );
    }

    #[test]
    fn row_count_matches_long_enough_lines() {
        let csv = "# export\n1,Ali,a@x.com,1,2,3\n\n2,Abu,b@x.com,4,5,6\n3,Siti,c@x.com,7,8,9\r\n";
        let records = parse_delimited(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].points, 9);
    }

    #[test]
    fn first_line_is_kept_without_header_marker() {
        let csv = "1,Ali,a@x.com,1,2,3\n2,Abu,b@x.com,4,5,6\n";
        assert_eq!(parse_delimited(csv.as_bytes()).unwrap().len(), 2);
    }

    #[test]
    fn short_rows_are_dropped_silently() {
        let csv = "Nama,Email,Bintang,Rekod,Mata\n1,Ali,a@x.com,1,2,3\n2,Abu,4,5\n";
        let records = parse_delimited(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "ALI");
    }

    #[test]
    fn embedded_commas_rejoin_into_the_name() {
        let csv = "1,\"Tan, Mei Ling\",mei@x.com,2,1,40\n";
        let records = parse_delimited(csv.as_bytes()).unwrap();
        assert_eq!(records[0].name, "TAN, MEI LING");
        assert_eq!(records[0].email, "mei@x.com");
    }

    #[test]
    fn bad_numbers_default_to_zero() {
        let csv = "1,Ali,a@x.com,x,,12pts\n";
        let record = &parse_delimited(csv.as_bytes()).unwrap()[0];
        assert_eq!((record.stars, record.records, record.points), (0, 0, 12));
    }

    #[test]
    fn invalid_utf8_is_a_file_level_failure() {
        let bytes = b"1,Ali,a@x.com,1,2,3\n2,\xff\xfe,b@x.com,1,2,3\n";
        assert!(matches!(parse_delimited(bytes), Err(ParseError::Malformed(_))));
    }

    #[test]
    fn grid_rows_need_three_numeric_tail_cells() {
        let grid = vec![
            vec![text("No"), text("Nama"), text("Email"), text("Bintang"), text("Rekod"), text("Mata")],
            vec![Cell::Int(1), text(" siti  aminah"), text("s@x.com"), Cell::Int(4), Cell::Float(2.0), text("55")],
            vec![Cell::Int(2), text("Abu"), text("b@x.com"), Cell::Int(4), text("n/a"), Cell::Int(1)],
            vec![Cell::Int(3), text("Short"), Cell::Int(1), Cell::Int(2)],
        ];
        let records = parse_grid(&grid);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "SITI AMINAH");
        assert_eq!(records[0].email, "s@x.com");
        assert_eq!((records[0].stars, records[0].records, records[0].points), (4, 2, 55));
    }

    #[test]
    fn grid_name_must_be_non_header_text() {
        let grid = vec![
            vec![Cell::Int(1), Cell::Int(99), text("x@x.com"), Cell::Int(1), Cell::Int(1), Cell::Int(1)],
            vec![Cell::Int(2), text("NAMA MURID"), text("x@x.com"), Cell::Int(1), Cell::Int(1), Cell::Int(1)],
            vec![Cell::Int(3), text(""), text("x@x.com"), Cell::Int(1), Cell::Int(1), Cell::Int(1)],
            vec![Cell::Int(4), text("Aminah"), Cell::Empty, Cell::Int(1), Cell::Int(1), Cell::Int(1)],
        ];
        let records = parse_grid(&grid);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "AMINAH");
        assert_eq!(records[0].email, "");
    }

    #[test]
    fn both_modes_normalize_names_identically() {
        let csv = parse_delimited("1, nur   iman ,n@x.com,1,1,1\n".as_bytes()).unwrap();
        let grid = parse_grid(&[vec![
            Cell::Int(1),
            text(" nur   iman "),
            text("n@x.com"),
            Cell::Int(1),
            Cell::Int(1),
            Cell::Int(1),
        ]]);
        assert_eq!(csv[0].name, grid[0].name);
    }

    #[test]
    fn suffix_selects_input_kind() {
        assert_eq!(InputKind::from_file_name("data.csv").unwrap(), InputKind::DelimitedText);
        assert_eq!(InputKind::from_file_name("data.xlsx").unwrap(), InputKind::Spreadsheet);
        assert_eq!(InputKind::from_file_name("data.xls").unwrap(), InputKind::Spreadsheet);
        assert!(matches!(
            InputKind::from_file_name("data.pdf"),
            Err(ParseError::UnsupportedFile(_))
        ));
    }

    #[test]
    fn upload_without_rows_is_empty_not_an_error() {
        let input = RawInput {
            kind: InputKind::DelimitedText,
            bytes: b"Nama,Email,Bintang,Rekod,Mata\n".to_vec(),
        };
        let outcome = parse_upload(&HeuristicParser, &input).unwrap();
        assert_eq!(outcome, ParseOutcome::Empty);
    }
}
