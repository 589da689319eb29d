use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::columns::{Field, FieldMap};
use crate::model::{Cell, Table};

/// Roster columns in display order with their headings.
pub const ROSTER_COLUMNS: [(Field, &str); 9] = [
    (Field::PersonnelNumber, "NIK SAP"),
    (Field::Name, "Nama Karyawan"),
    (Field::Position, "Jabatan"),
    (Field::Unit, "Unit Kerja"),
    (Field::BirthDate, "TGL LAHIR"),
    (Field::Age, "Usia"),
    (Field::Gender, "Jenis Kelamin"),
    (Field::PersonGrade, "Person Grade"),
    (Field::BodLevel, "BOD Level"),
];

const BIRTH_DATE_FORMAT: &str = "%d/%m/%Y";

/// Employee listing restricted to the roster columns present in the data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Roster {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Roster {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Projects `table` onto the roster columns. A source column matched by two
/// fields is listed once, under the first heading.
pub fn build_roster(table: &Table, fields: &FieldMap) -> Roster {
    let mut selected: Vec<(Field, usize, &str)> = Vec::new();
    for (field, heading) in ROSTER_COLUMNS {
        if let Some(idx) = fields.index(field) {
            if !selected.iter().any(|(_, existing, _)| *existing == idx) {
                selected.push((field, idx, heading));
            }
        }
    }

    let rows = table
        .rows
        .iter()
        .map(|row| {
            selected
                .iter()
                .map(|(field, idx, _)| {
                    let cell = row.get(*idx).unwrap_or(&Cell::Empty);
                    if *field == Field::BirthDate {
                        format_birth_date(cell)
                    } else {
                        cell.to_string()
                    }
                })
                .collect()
        })
        .collect();

    Roster {
        columns: selected
            .iter()
            .map(|(_, _, heading)| heading.to_string())
            .collect(),
        rows,
    }
}

/// Renders a birth date as `dd/mm/YYYY`; unparseable values become empty.
pub fn format_birth_date(cell: &Cell) -> String {
    let parsed = match cell {
        Cell::DateTime(value) => Some(value.date()),
        Cell::Text(value) => parse_date_text(value.trim()),
        _ => None,
    };
    parsed
        .map(|date| date.format(BIRTH_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn parse_date_text(value: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y", "%Y/%m/%d"];
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|value| value.date())
        })
}
