use std::path::Path;

use rust_xlsxwriter::{Table, TableColumn, Workbook, Worksheet, XlsxError};
use tracing::{info, instrument};

use crate::error::Result;
use crate::export::{SheetTable, WorkbookData};
use crate::model::Cell;

/// Writes the provided workbook data to the given path.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn write_workbook(path: &Path, workbook: &WorkbookData) -> Result<()> {
    let mut writer = build(workbook)?;
    writer.save(path)?;
    info!(sheets = workbook.tables.len(), "workbook written");
    Ok(())
}

/// Serialises the workbook into an in-memory `.xlsx` buffer.
pub fn workbook_to_bytes(workbook: &WorkbookData) -> Result<Vec<u8>> {
    let mut writer = build(workbook)?;
    Ok(writer.save_to_buffer()?)
}

fn build(workbook: &WorkbookData) -> std::result::Result<Workbook, XlsxError> {
    let mut writer = Workbook::new();
    for table in &workbook.tables {
        let worksheet = writer.add_worksheet();
        worksheet.set_name(&table.sheet_name)?;
        write_table(worksheet, table)?;
    }
    Ok(writer)
}

fn write_table(worksheet: &mut Worksheet, table: &SheetTable) -> std::result::Result<(), XlsxError> {
    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let col_num = col_idx as u16;
            match cell {
                Cell::Empty => {}
                Cell::Number(value) => {
                    worksheet.write_number(row_num, col_num, *value)?;
                }
                Cell::Bool(value) => {
                    worksheet.write_boolean(row_num, col_num, *value)?;
                }
                other => {
                    worksheet.write_string(row_num, col_num, other.to_string())?;
                }
            }
        }
    }

    // A table needs headers and at least one data row.
    if table.columns.is_empty() || table.rows.is_empty() {
        return Ok(());
    }
    let columns: Vec<TableColumn> = table
        .columns
        .iter()
        .map(|header| TableColumn::new().set_header(header))
        .collect();
    let mut excel_table = Table::new();
    excel_table.set_autofilter(true).set_columns(&columns);
    let col_end = (table.columns.len() as u16).saturating_sub(1);
    worksheet.add_table(0, 0, table.rows.len() as u32, col_end, &excel_table)?;
    worksheet.autofit();
    Ok(())
}
