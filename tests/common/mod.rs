#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::Path;

use hr_recap::model::{Cell, Table};
use rust_xlsxwriter::Workbook;

/// Builds an `.xlsx` buffer. Cells that parse as numbers are written as
/// numbers, empty strings are left blank.
pub fn xlsx_bytes(sheets: &[(&str, Vec<Vec<&str>>)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).expect("sheet name");
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let (row_num, col_num) = (row_idx as u32, col_idx as u16);
                match value.parse::<f64>() {
                    Ok(number) => worksheet.write_number(row_num, col_num, number),
                    Err(_) => worksheet.write_string(row_num, col_num, *value),
                }
                .expect("cell written");
            }
        }
    }
    workbook.save_to_buffer().expect("workbook serialised")
}

/// Copies an `.xlsx` package leaving out the part named `dropped`, which
/// leaves the workbook pointing at a sheet that can no longer be read.
pub fn without_part(bytes: &[u8], dropped: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("xlsx is a zip");
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for idx in 0..archive.len() {
        let mut part = archive.by_index(idx).expect("zip entry");
        if part.name() == dropped {
            continue;
        }
        let name = part.name().to_string();
        let mut content = Vec::new();
        part.read_to_end(&mut content).expect("entry read");
        writer
            .start_file(name, zip::write::SimpleFileOptions::default())
            .expect("entry started");
        writer.write_all(&content).expect("entry written");
    }
    writer.finish().expect("zip finished").into_inner()
}

pub fn write_xlsx(path: &Path, sheets: &[(&str, Vec<Vec<&str>>)]) {
    std::fs::write(path, xlsx_bytes(sheets)).expect("fixture written");
}

/// In-memory table with text cells; empty strings become blank cells.
pub fn table(columns: &[&str], rows: &[Vec<&str>]) -> Table {
    Table {
        columns: columns.iter().map(|column| column.to_string()).collect(),
        rows: rows
            .iter()
            .map(|row| row.iter().map(|value| Cell::text(*value)).collect())
            .collect(),
    }
}

pub const EMPLOYEE_HEADER: [&str; 9] = [
    "Pers.No.",
    "Nama Karyawan",
    "Personel Subarea",
    "Employee Group",
    "JENIS KARYAWAN TIDAK TETAP",
    "Gender Key",
    "Age of employee",
    "Birth date",
    "Status Disabilitas",
];

/// Small employee sheet spread over two units.
pub fn employee_rows() -> Vec<Vec<&'static str>> {
    vec![
        EMPLOYEE_HEADER.to_vec(),
        vec!["1001", "Andi", "Unit A", "Karpel - Tetap", "", "Male", "23", "2001-02-03", "Tidak"],
        vec!["1002", "Budi", "Unit A", "Karpim - Tetap", "", "L", "45", "1979-07-08", ""],
        vec!["1003", "Citra", "Unit A", "Karpel - Tidak Tetap", "Magang", "P", "24", "", "Tuna Daksa"],
        vec!["1004", "Dewi", "Unit B", "Karpel - Tetap", "", "Female", "56", "1968-01-01", "tidak ada"],
        vec!["1005", "Eko", "Unit B", "Karpim - Tidak Tetap", "Outsource", "", "x", "", "0"],
    ]
}
