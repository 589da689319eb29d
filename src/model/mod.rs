use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single spreadsheet value after it has been read from a workbook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Cell {
    /// Blank cell. Empty strings are normalised to this variant.
    #[default]
    Empty,
    /// Plain string literal.
    Text(String),
    /// Any numeric value; integers are widened.
    Number(f64),
    /// Boolean literal.
    Bool(bool),
    /// Date or date-time value.
    DateTime(NaiveDateTime),
    /// Spreadsheet error literal such as `#N/A`.
    Error(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Display text of a present value, `None` for a blank cell.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            other => Some(other.to_string()),
        }
    }

    /// Numeric reading of the cell. Text is parsed after trimming; anything
    /// else that is not a number yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(value) => *value,
            Cell::Text(value) => value.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(value) => f.write_str(value),
            Cell::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            Cell::Number(value) => write!(f, "{value}"),
            Cell::Bool(value) => write!(f, "{value}"),
            Cell::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
            Cell::Error(value) => f.write_str(value),
        }
    }
}

/// Tabular view of one sheet: a header row and the data rows beneath it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

const UNNAMED_PREFIX: &str = "Unnamed: ";

impl Table {
    /// Builds a table from raw rows, using `header_row` as column names.
    ///
    /// Blank header cells become `Unnamed: <index>` and repeated names receive
    /// `.1`, `.2`, ... suffixes. Rows above the header and fully blank rows are
    /// discarded. Short rows are padded so every row has one cell per column.
    pub fn from_grid(grid: &[Vec<Cell>], header_row: usize) -> Self {
        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        let header = grid.get(header_row);

        let mut seen: HashMap<String, usize> = HashMap::new();
        let columns = (0..width)
            .map(|idx| {
                let raw = header
                    .and_then(|row| row.get(idx))
                    .and_then(Cell::as_text)
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| format!("{UNNAMED_PREFIX}{idx}"));
                let count = seen.entry(raw.clone()).or_insert(0);
                let name = if *count == 0 {
                    raw
                } else {
                    format!("{raw}.{count}")
                };
                *count += 1;
                name
            })
            .collect();

        let rows = grid
            .iter()
            .skip(header_row + 1)
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .map(|row| {
                let mut row = row.clone();
                row.resize(width, Cell::Empty);
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Position of the column with exactly this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(index).unwrap_or(&Cell::Empty))
    }

    /// Drops columns whose name is an auto-generated placeholder and whose
    /// values are all blank.
    pub fn drop_unnamed_empty_columns(&mut self) {
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|idx| {
                !self.columns[idx].starts_with(UNNAMED_PREFIX)
                    || self.column(idx).any(|cell| !cell.is_empty())
            })
            .collect();
        if keep.iter().all(|keep| *keep) {
            return;
        }

        let mut flags = keep.iter();
        self.columns.retain(|_| *flags.next().unwrap_or(&true));
        for row in &mut self.rows {
            let mut flags = keep.iter();
            row.retain(|_| *flags.next().unwrap_or(&true));
        }
    }

    /// Keeps only the rows accepted by `predicate`.
    pub fn filter_rows<P>(&self, mut predicate: P) -> Table
    where
        P: FnMut(&[Cell]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| predicate(row))
                .cloned()
                .collect(),
        }
    }
}

/// One named sheet of a workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub table: Table,
}

/// All sheets of a workbook in their original order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.sheets.iter().map(|sheet| sheet.name.as_str())
    }

    /// Finds a sheet by name, ignoring case and surrounding whitespace.
    pub fn sheet(&self, name: &str) -> Option<&Table> {
        let wanted = name.trim().to_lowercase();
        self.sheets
            .iter()
            .find(|sheet| sheet.name.trim().to_lowercase() == wanted)
            .map(|sheet| &sheet.table)
    }

    pub fn first(&self) -> Option<&Table> {
        self.sheets.first().map(|sheet| &sheet.table)
    }
}
