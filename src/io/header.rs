//! Header-row detection for sheets whose column names are not on the first row.

use crate::model::Cell;

/// Number of leading rows inspected when looking for a header.
pub const HEADER_SCAN_ROWS: usize = 20;

/// Cell values that mark a row as the header row.
pub const HEADER_KEYWORDS: [&str; 6] = ["PN", "NAMA", "NO", "JABATAN", "UNIT", "LEVEL"];

/// Returns the index of the first row (within the scan window) holding a cell
/// whose trimmed, uppercased text equals one of [`HEADER_KEYWORDS`].
pub fn detect_header_row(grid: &[Vec<Cell>]) -> Option<usize> {
    grid.iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| row.iter().any(is_header_keyword))
}

/// Like [`detect_header_row`], falling back to the first row.
pub fn header_row_or_first(grid: &[Vec<Cell>]) -> usize {
    detect_header_row(grid).unwrap_or(0)
}

fn is_header_keyword(cell: &Cell) -> bool {
    cell.as_text()
        .map(|text| text.trim().to_uppercase())
        .is_some_and(|text| HEADER_KEYWORDS.contains(&text.as_str()))
}
