//! Mapping of logical fields onto whatever column names a workbook uses.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{HrError, Result};
use crate::model::{Cell, Table};

/// Logical fields read from the employee and organisation workbooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Unit,
    EmployeeGroup,
    NonPermanentType,
    JobGrade,
    Gender,
    Age,
    BirthDate,
    PersonnelNumber,
    Name,
    Position,
    PersonGrade,
    BodLevel,
    OrgUnit,
    OrgDepartment,
    OrgTitle,
    OrgIncumbentId,
    OrgIncumbentName,
}

impl Field {
    /// Accepted column names, most preferred first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::Unit => &[
                "Personel Subarea",
                "Personnel Subarea",
                "Personel Area",
                "Unit Kerja",
            ],
            Field::EmployeeGroup => &["Employee Group", "Kategori", "EmployeeGroup"],
            Field::NonPermanentType => {
                &["JENIS KARYAWAN TIDAK TETAP", "Jenis Karyawan Tidak Tetap"]
            }
            Field::JobGrade => &["JOB GRADE 11", "JOB GRADE", "JG 11"],
            Field::Gender => &["Gender Key", "Gender", "Jenis Kelamin"],
            Field::Age => &["Age of employee", "Age", "Usia"],
            Field::BirthDate => &["Birth date", "Tanggal Lahir", "Birthdate", "DOB"],
            Field::PersonnelNumber => &[
                "Pers.No.",
                "PN",
                "Pers No",
                "PersNo",
                "Personnel Number",
                "Personel Number",
            ],
            Field::Name => &["Personnel Number", "Nama Karyawan", "Name", "Nama"],
            Field::Position => &["Position", "Jabatan", "Job Title"],
            Field::PersonGrade => &["ESgrp", "Person Grade", "PG"],
            Field::BodLevel => &["Job Group Short (New)", "BOD Level", "BOD"],
            Field::OrgUnit => &["Unit Kerja", "UNIT KERJA", "Unit", "UNIT"],
            Field::OrgDepartment => &["BAGIAN", "DEPARTMENT", "DEPT", "Bagian"],
            Field::OrgTitle => &["JABATAN", "Jabatan", "Position"],
            Field::OrgIncumbentId => &["PN", "Pers.No.", "Personnel Number", "NIK", "NIK SAP"],
            Field::OrgIncumbentName => &["NAMA", "Nama", "Name"],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Unit | Field::OrgUnit => "unit",
            Field::EmployeeGroup => "employee group",
            Field::NonPermanentType => "non-permanent employee type",
            Field::JobGrade => "job grade",
            Field::Gender => "gender",
            Field::Age => "age",
            Field::BirthDate => "birth date",
            Field::PersonnelNumber => "personnel number",
            Field::Name => "name",
            Field::Position => "position",
            Field::PersonGrade => "person grade",
            Field::BodLevel => "BOD level",
            Field::OrgDepartment => "department",
            Field::OrgTitle => "job title",
            Field::OrgIncumbentId => "incumbent identifier",
            Field::OrgIncumbentName => "incumbent name",
        }
    }
}

/// Fields read from the employee workbook.
pub const EMPLOYEE_FIELDS: [Field; 12] = [
    Field::Unit,
    Field::EmployeeGroup,
    Field::NonPermanentType,
    Field::JobGrade,
    Field::Gender,
    Field::Age,
    Field::BirthDate,
    Field::PersonnelNumber,
    Field::Name,
    Field::Position,
    Field::PersonGrade,
    Field::BodLevel,
];

/// Fields read from the organisation-structure sheets.
pub const ORG_FIELDS: [Field; 5] = [
    Field::OrgUnit,
    Field::OrgDepartment,
    Field::OrgTitle,
    Field::OrgIncumbentId,
    Field::OrgIncumbentName,
];

/// Substrings that mark a column as a disability indicator.
pub const DISABILITY_MARKERS: [&str; 2] = ["disabilitas", "disability"];

/// Returns the first candidate that equals one of `columns` ignoring case,
/// spelled as it appears in `columns`.
pub fn pick_column<'a, S>(columns: &'a [S], candidates: &[&str]) -> Option<&'a str>
where
    S: AsRef<str>,
{
    candidates.iter().find_map(|candidate| {
        let wanted = candidate.to_uppercase();
        columns
            .iter()
            .map(AsRef::as_ref)
            .find(|column| column.to_uppercase() == wanted)
    })
}

/// Indices of every column whose name contains a disability marker.
pub fn disability_columns(columns: &[String]) -> Vec<usize> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, name)| {
            let lower = name.to_lowercase();
            DISABILITY_MARKERS.iter().any(|marker| lower.contains(marker))
        })
        .map(|(idx, _)| idx)
        .collect()
}

/// Logical field → column position, resolved once per loaded table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    resolved: BTreeMap<Field, usize>,
    disability: Vec<usize>,
}

impl FieldMap {
    pub fn resolve(table: &Table, fields: &[Field]) -> Self {
        let resolved = fields
            .iter()
            .filter_map(|field| {
                pick_column(&table.columns, field.aliases())
                    .and_then(|name| table.column_index(name))
                    .map(|idx| (*field, idx))
            })
            .collect();
        Self {
            resolved,
            disability: disability_columns(&table.columns),
        }
    }

    pub fn index(&self, field: Field) -> Option<usize> {
        self.resolved.get(&field).copied()
    }

    /// Like [`FieldMap::index`] but missing fields are a configuration error.
    pub fn require(&self, field: Field) -> Result<usize> {
        self.index(field).ok_or_else(|| HrError::MissingColumn {
            field: field.label(),
            aliases: field.aliases().to_vec(),
        })
    }

    pub fn disability(&self) -> &[usize] {
        &self.disability
    }

    /// The cell of `row` holding `field`, if the field was resolved.
    pub fn cell<'r>(&self, row: &'r [Cell], field: Field) -> Option<&'r Cell> {
        self.index(field).and_then(|idx| row.get(idx))
    }
}
