mod common;

use std::fs;
use std::time::Duration;

use hr_recap::LoadError;
use hr_recap::io::excel_read;
use hr_recap::io::header;
use hr_recap::io::{DataSource, ResolvedSource, SheetSelector, WorkbookLoader};
use hr_recap::model::Cell;
use tempfile::tempdir;

use common::{employee_rows, write_xlsx, xlsx_bytes};

#[test]
fn first_sheet_uses_first_row_as_header() {
    let bytes = xlsx_bytes(&[("Data", employee_rows()), ("Other", vec![vec!["X"]])]);
    let table = excel_read::read_sheet(&bytes, &SheetSelector::First).expect("sheet read");

    assert_eq!(table.columns[0], "Pers.No.");
    assert_eq!(table.len(), 5);
    assert_eq!(table.rows[0][0], Cell::Number(1001.0));
    assert_eq!(table.rows[0][1], Cell::text("Andi"));
}

#[test]
fn named_sheet_is_matched_case_insensitively() {
    let bytes = xlsx_bytes(&[("Data", employee_rows()), ("Other", vec![vec!["X"], vec!["y"]])]);
    let table = excel_read::read_sheet(&bytes, &SheetSelector::Named("other".into()))
        .expect("sheet read");
    assert_eq!(table.columns, vec!["X"]);

    let missing = excel_read::read_sheet(&bytes, &SheetSelector::Named("Nope".into()));
    assert_eq!(missing, Err(LoadError::MissingSheet("Nope".into())));
}

#[test]
fn garbage_bytes_are_unparseable() {
    let result = excel_read::read_sheet(b"definitely not a workbook", &SheetSelector::First);
    assert!(matches!(result, Err(LoadError::Unparseable(_))));
}

#[test]
fn header_detection_skips_title_rows() {
    let bytes = xlsx_bytes(&[(
        "Struktur Organisasi",
        vec![
            vec!["STRUKTUR ORGANISASI PT CONTOH"],
            vec![""],
            vec!["No", "Unit Kerja", "Bagian", "Jabatan", "PN", "Nama", ""],
            vec!["1", "Unit A", "Keuangan", "Manager", "1001", "Andi"],
            vec!["", "", "", "", "", ""],
            vec!["2", "Unit A", "Keuangan", "Staff", "", ""],
        ],
    )]);
    let workbook = excel_read::read_all_sheets(&bytes).expect("read");
    let table = workbook.sheet("struktur organisasi ").expect("sheet present");

    assert_eq!(
        table.columns,
        vec!["No", "Unit Kerja", "Bagian", "Jabatan", "PN", "Nama"]
    );
    assert_eq!(table.len(), 2);
}

#[test]
fn header_detection_falls_back_to_first_row() {
    let grid = vec![
        vec![Cell::text("Kolom A"), Cell::text("Kolom B")],
        vec![Cell::text("nama"), Cell::Number(1.0)],
    ];
    assert_eq!(header::detect_header_row(&grid), Some(1));

    let grid = vec![vec![Cell::text("Kolom A")], vec![Cell::text("x")]];
    assert_eq!(header::detect_header_row(&grid), None);
    assert_eq!(header::header_row_or_first(&grid), 0);
}

#[test]
fn header_detection_only_scans_the_first_twenty_rows() {
    let mut grid: Vec<Vec<Cell>> = (0..header::HEADER_SCAN_ROWS)
        .map(|idx| vec![Cell::text(format!("preamble {idx}"))])
        .collect();
    grid.push(vec![Cell::text("PN")]);
    assert_eq!(header::detect_header_row(&grid), None);
}

#[test]
fn duplicate_and_blank_headers_get_placeholders() {
    let grid = vec![
        vec![Cell::text("Nama"), Cell::Empty, Cell::text("Nama")],
        vec![Cell::text("a"), Cell::text("b"), Cell::text("c")],
    ];
    let table = hr_recap::model::Table::from_grid(&grid, 0);
    assert_eq!(table.columns, vec!["Nama", "Unnamed: 1", "Nama.1"]);
}

#[test]
fn local_copy_wins_over_remote() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("db.xlsx");
    write_xlsx(&path, &[("Data", employee_rows())]);

    let source = DataSource::new(&path, Some("https://example.invalid/db.xlsx".into()));
    assert_eq!(source.resolve(), Ok(ResolvedSource::Local(path.clone())));

    let missing = DataSource::new(temp_dir.path().join("gone.xlsx"), None);
    assert_eq!(missing.resolve(), Err(LoadError::NotFound));

    let remote = DataSource::from_locator("https://example.invalid/db.xlsx");
    assert!(!remote.resolve().expect("remote resolves").is_local());
}

#[test]
fn loader_serves_cached_sheet_until_invalidated() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("db.xlsx");
    write_xlsx(&path, &[("Data", employee_rows())]);

    let source = DataSource::new(&path, None);
    let mut loader = WorkbookLoader::new(Duration::from_secs(5), Duration::from_secs(3600));
    let first = loader
        .load_sheet(&source, &SheetSelector::First)
        .expect("first load");
    assert_eq!(first.len(), 5);
    assert_eq!(loader.cache().len(), 1);

    // Replace the file; the cached copy is still served.
    write_xlsx(
        &path,
        &[("Data", vec![common::EMPLOYEE_HEADER.to_vec(), employee_rows()[1].clone()])],
    );
    let cached = loader
        .load_sheet(&source, &SheetSelector::First)
        .expect("cached load");
    assert_eq!(cached.len(), 5);

    assert_eq!(loader.invalidate(&source), 1);
    let fresh = loader
        .load_sheet(&source, &SheetSelector::First)
        .expect("fresh load");
    assert_eq!(fresh.len(), 1);
}

#[test]
fn failed_loads_are_not_cached() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("db.xlsx");
    fs::write(&path, b"broken").expect("fixture written");

    let source = DataSource::new(&path, None);
    let mut loader = WorkbookLoader::new(Duration::from_secs(5), Duration::from_secs(3600));
    assert!(loader.load_sheet(&source, &SheetSelector::First).is_err());
    assert!(loader.cache().is_empty());

    write_xlsx(&path, &[("Data", employee_rows())]);
    assert!(loader.load_sheet(&source, &SheetSelector::First).is_ok());
}

#[test]
fn zero_ttl_always_reloads() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("org.xlsx");
    write_xlsx(&path, &[("Struktur Organisasi", vec![vec!["PN"], vec!["1"]])]);

    let source = DataSource::new(&path, None);
    let mut loader = WorkbookLoader::new(Duration::from_secs(5), Duration::ZERO);
    let workbook = loader
        .load_all_sheets(&source)
        .expect("loaded");
    assert_eq!(workbook.sheets.len(), 1);

    fs::remove_file(&path).expect("fixture removed");
    assert_eq!(
        loader.load_all_sheets(&source),
        Err(LoadError::NotFound)
    );
}

#[test]
fn last_update_of_local_file_is_formatted() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("db.xlsx");
    write_xlsx(&path, &[("Data", employee_rows())]);

    let loader = WorkbookLoader::new(Duration::from_secs(5), Duration::from_secs(60));
    let update = loader.last_update(&DataSource::new(&path, None));
    let hr_recap::io::LastUpdate::Known(label) = update else {
        panic!("expected a timestamp, got {update:?}");
    };
    assert!(chrono::NaiveDateTime::parse_from_str(&label, "%d-%m-%Y %H:%M:%S").is_ok());

    let none = DataSource {
        local_path: None,
        remote_url: None,
    };
    assert_eq!(loader.last_update(&none), hr_recap::io::LastUpdate::NoData);
}

#[test]
fn unreadable_sheet_degrades_to_empty_table() {
    let bytes = xlsx_bytes(&[
        ("Struktur Organisasi", vec![vec!["PN", "NAMA"], vec!["1001", "Andi"]]),
        ("Database Vacant", vec![vec!["JABATAN"], vec!["Staff"]]),
        ("Catatan", vec![vec!["NO"], vec!["1"]]),
    ]);
    let damaged = common::without_part(&bytes, "xl/worksheets/sheet2.xml");

    let workbook = excel_read::read_all_sheets(&damaged).expect("siblings still load");
    assert_eq!(
        workbook.sheet_names().collect::<Vec<_>>(),
        vec!["Struktur Organisasi", "Database Vacant", "Catatan"]
    );
    assert!(workbook.sheet("Database Vacant").expect("kept").is_empty());
    assert_eq!(workbook.sheet("Struktur Organisasi").expect("kept").len(), 1);
    assert_eq!(workbook.sheet("Catatan").expect("kept").columns, vec!["NO"]);
}
