//! Flattens a headcount report (and optionally a vacancy report) into the
//! tables of a downloadable workbook.

use crate::model::Cell;
use crate::report::HeadcountReport;
use crate::vacancy::VacancyReport;

pub const SUMMARY_SHEET: &str = "Ringkasan";
pub const CATEGORIES_SHEET: &str = "Semua Kategori";
pub const AGE_SHEET: &str = "Usia";
pub const ROSTER_SHEET: &str = "Karyawan";
pub const VACANCY_SHEET: &str = "Vacant";

/// A table that will be materialised as an Excel sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl SheetTable {
    fn new(sheet_name: &str, columns: &[&str]) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            columns: columns.iter().map(|column| column.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn push_count(&mut self, label: impl Into<String>, count: usize) {
        self.rows
            .push(vec![Cell::text(label), Cell::Number(count as f64)]);
    }
}

/// Represents all tables required to materialise the Excel workbook.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkbookData {
    pub tables: Vec<SheetTable>,
}

impl WorkbookData {
    pub fn table(&self, sheet_name: &str) -> Option<&SheetTable> {
        self.tables
            .iter()
            .find(|table| table.sheet_name == sheet_name)
    }
}

/// Builds the export tables in sheet order.
pub fn build_report_workbook(
    report: &HeadcountReport,
    vacancy: Option<&VacancyReport>,
) -> WorkbookData {
    let mut tables = vec![
        summary_table(report),
        categories_table(report),
        age_table(report),
        roster_table(report),
    ];
    if let Some(vacancy) = vacancy {
        tables.push(vacancy_table(vacancy));
    }
    WorkbookData { tables }
}

fn summary_table(report: &HeadcountReport) -> SheetTable {
    let mut table = SheetTable::new(SUMMARY_SHEET, &["Keterangan", "Jumlah"]);
    table.rows.push(vec![
        Cell::text("Unit Kerja"),
        Cell::text(report.unit_label.clone()),
    ]);
    table.push_count("Total Karyawan", report.total);
    table.push_count("Laki-laki", report.gender.male);
    table.push_count("Perempuan", report.gender.female);
    table.push_count("Lainnya", report.gender.other);
    table.push_count("Disabilitas", report.disability);
    for row in &report.summary.rows {
        table.push_count(row.label.clone(), row.count);
    }
    table.push_count("Total Tetap", report.summary.permanent_total);
    table.push_count("Total Tidak Tetap", report.summary.non_permanent_total);
    table
}

fn categories_table(report: &HeadcountReport) -> SheetTable {
    let mut table = SheetTable::new(CATEGORIES_SHEET, &["Kategori", "Jumlah", "Approved"]);
    for category in &report.categories {
        table.rows.push(vec![
            Cell::text(category.label()),
            Cell::Number(category.count as f64),
            Cell::Number(category.approved as f64),
        ]);
    }
    table
}

fn age_table(report: &HeadcountReport) -> SheetTable {
    let mut table = SheetTable::new(AGE_SHEET, &["Kelompok Usia", "Jumlah"]);
    for bucket in &report.age.buckets {
        table.push_count(bucket.label, bucket.count);
    }
    table
}

fn roster_table(report: &HeadcountReport) -> SheetTable {
    SheetTable {
        sheet_name: ROSTER_SHEET.to_string(),
        columns: report.roster.columns.clone(),
        rows: report
            .roster
            .rows
            .iter()
            .map(|row| row.iter().map(|value| Cell::text(value.clone())).collect())
            .collect(),
    }
}

fn vacancy_table(vacancy: &VacancyReport) -> SheetTable {
    let mut table = SheetTable::new(
        VACANCY_SHEET,
        &["Unit", "Bagian", "Jabatan", "ID Pemangku", "Nama Pemangku", "Status"],
    );
    let text = |value: &Option<String>| value.clone().map(Cell::text).unwrap_or_default();
    for position in &vacancy.positions {
        table.rows.push(vec![
            text(&position.unit),
            text(&position.department),
            text(&position.title),
            text(&position.incumbent_id),
            text(&position.incumbent_name),
            Cell::text(position.status.label()),
        ]);
    }
    table
}
