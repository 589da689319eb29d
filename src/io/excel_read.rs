use std::fmt;
use std::io::Cursor;

use calamine::{Data, Range, Reader, Sheets, open_workbook_auto_from_rs};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::io::header;
use crate::model::{Cell, Sheet, Table, Workbook};

type WorkbookReader = Sheets<Cursor<Vec<u8>>>;

/// Which sheet of a workbook to read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SheetSelector {
    First,
    Named(String),
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::First => f.write_str("#0"),
            SheetSelector::Named(name) => f.write_str(name),
        }
    }
}

/// Reads a single sheet with its header on the first row.
pub fn read_sheet(bytes: &[u8], selector: &SheetSelector) -> Result<Table, LoadError> {
    let mut workbook = open(bytes)?;
    let name = match selector {
        SheetSelector::First => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| LoadError::Unparseable("workbook has no sheets".into()))?,
        SheetSelector::Named(name) => workbook
            .sheet_names()
            .into_iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(name))
            .ok_or_else(|| LoadError::MissingSheet(name.clone()))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|err| LoadError::Unparseable(format!("sheet '{name}': {err}")))?;
    let grid = range_to_grid(&range);
    debug!(sheet = %name, rows = grid.len(), "sheet read");
    Ok(Table::from_grid(&grid, 0))
}

/// Reads every sheet in one pass over the content, locating each header row
/// with [`header::detect_header_row`].
///
/// A sheet that cannot be read is replaced by an empty table so that its
/// siblings still load; the workbook as a whole only fails when the content
/// itself is not a spreadsheet.
pub fn read_all_sheets(bytes: &[u8]) -> Result<Workbook, LoadError> {
    let mut workbook = open(bytes)?;
    let mut sheets = Vec::new();

    for name in workbook.sheet_names() {
        let table = match workbook.worksheet_range(&name) {
            Ok(range) => {
                let grid = range_to_grid(&range);
                let header_row = header::header_row_or_first(&grid);
                debug!(sheet = %name, header_row, "header row selected");
                let mut table = Table::from_grid(&grid, header_row);
                table.drop_unnamed_empty_columns();
                table
            }
            Err(err) => {
                warn!(sheet = %name, error = %err, "sheet unreadable; substituting empty table");
                Table::default()
            }
        };
        sheets.push(Sheet { name, table });
    }

    Ok(Workbook { sheets })
}

fn open(bytes: &[u8]) -> Result<WorkbookReader, LoadError> {
    open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|err| LoadError::Unparseable(err.to_string()))
}

/// Converts a calamine range into owned rows of [`Cell`]s.
pub fn range_to_grid(range: &Range<Data>) -> Vec<Vec<Cell>> {
    range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect()
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(value) => Cell::text(value.clone()),
        Data::Float(value) => Cell::Number(*value),
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Bool(value) => Cell::Bool(*value),
        Data::DateTime(value) => value
            .as_datetime()
            .map(Cell::DateTime)
            .unwrap_or(Cell::Number(value.as_f64())),
        Data::DateTimeIso(value) => parse_iso(value)
            .map(Cell::DateTime)
            .unwrap_or_else(|| Cell::text(value.clone())),
        Data::DurationIso(value) => Cell::text(value.clone()),
        Data::Error(value) => Cell::Error(value.to_string()),
    }
}

fn parse_iso(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
