//! Filled/vacant classification of organisation-structure positions.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::columns::{Field, FieldMap, ORG_FIELDS};
use crate::model::{Cell, Table, Workbook};

pub const STRUCTURE_SHEET: &str = "Struktur Organisasi";
pub const VACANT_SHEET: &str = "Database Vacant";

/// Department selection meaning "every department of the unit".
pub const ALL_DEPARTMENTS: &str = "Semua Bagian";

/// Lowercased, trimmed incumbent values that mean "nobody".
pub const NULL_TOKENS: [&str; 6] = ["", "nan", "none", "null", "-", "0"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    /// An incumbent identifier or name is present.
    Filled,
    /// No incumbent, and the title is listed as vacant for this scope.
    VacantListed,
    /// No incumbent and no vacancy listing.
    Vacant,
}

impl PositionStatus {
    pub fn is_vacant(self) -> bool {
        !matches!(self, PositionStatus::Filled)
    }

    pub fn label(self) -> &'static str {
        match self {
            PositionStatus::Filled => "TERISI",
            PositionStatus::VacantListed => "VACANT (DB)",
            PositionStatus::Vacant => "VACANT",
        }
    }
}

/// Scope of a vacancy report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VacancyScope {
    /// Unit to report on; `None` keeps every unit.
    pub unit: Option<String>,
    /// Department within the unit; `None` keeps every department.
    pub department: Option<String>,
}

impl VacancyScope {
    pub fn new(unit: Option<String>, department: Option<String>) -> Self {
        let department = department.filter(|value| value != ALL_DEPARTMENTS);
        Self { unit, department }
    }
}

/// A position of the organisation structure with its derived status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionRow {
    pub unit: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub incumbent_id: Option<String>,
    pub incumbent_name: Option<String>,
    pub status: PositionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VacancyReport {
    pub unit: Option<String>,
    pub department: Option<String>,
    pub positions: Vec<PositionRow>,
    pub total: usize,
    pub filled: usize,
    pub vacant: usize,
    /// Units that can be selected.
    pub units: Vec<String>,
    /// Departments of the selected unit.
    pub departments: Vec<String>,
}

/// Result of looking for the two organisation sheets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VacancyOutcome {
    Report(VacancyReport),
    /// The workbook lacks one of the required sheets.
    MissingSheets,
}

fn is_null_token(value: &str) -> bool {
    NULL_TOKENS.contains(&value.trim().to_lowercase().as_str())
}

/// True when `cell` carries a usable incumbent identifier: not a null token
/// and, if numeric (thousands separators allowed), strictly positive.
/// Non-numeric text counts as an alphanumeric identifier.
pub fn has_valid_identifier(cell: Option<&Cell>) -> bool {
    let Some(text) = cell.and_then(Cell::as_text) else {
        return false;
    };
    if is_null_token(&text) {
        return false;
    }
    let compact: String = text
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    match compact.parse::<f64>() {
        Ok(value) => value > 0.0,
        Err(_) => true,
    }
}

/// True when `cell` carries an incumbent name.
pub fn has_name(cell: Option<&Cell>) -> bool {
    cell.and_then(Cell::as_text)
        .is_some_and(|text| !is_null_token(&text))
}

fn normalized_title(cell: Option<&Cell>) -> Option<String> {
    cell.and_then(Cell::as_text)
        .map(|text| text.trim().to_uppercase())
        .filter(|text| !text.is_empty())
}

/// Classifies one position. Incumbent presence wins over a vacancy listing.
pub fn classify(
    incumbent_id: Option<&Cell>,
    incumbent_name: Option<&Cell>,
    title: Option<&Cell>,
    vacant_titles: &HashSet<String>,
) -> PositionStatus {
    if has_valid_identifier(incumbent_id) || has_name(incumbent_name) {
        return PositionStatus::Filled;
    }
    match normalized_title(title) {
        Some(title) if vacant_titles.contains(&title) => PositionStatus::VacantListed,
        _ => PositionStatus::Vacant,
    }
}

fn in_scope(fields: &FieldMap, row: &[Cell], field: Field, wanted: Option<&str>) -> bool {
    match (wanted, fields.index(field)) {
        (Some(wanted), Some(idx)) => row
            .get(idx)
            .and_then(Cell::as_text)
            .is_some_and(|value| value == wanted),
        _ => true,
    }
}

fn distinct_values(table: &Table, idx: Option<usize>) -> Vec<String> {
    let Some(idx) = idx else {
        return Vec::new();
    };
    table
        .column(idx)
        .filter_map(Cell::as_text)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Builds the vacancy report for `scope` from the structure and vacancy
/// tables.
pub fn build_report(structure: &Table, vacant: &Table, scope: &VacancyScope) -> VacancyReport {
    let org = FieldMap::resolve(structure, &ORG_FIELDS);
    let vac = FieldMap::resolve(vacant, &ORG_FIELDS);

    let unit = scope.unit.as_deref();
    let department = scope.department.as_deref();

    let in_unit = structure.filter_rows(|row| in_scope(&org, row, Field::OrgUnit, unit));
    let scoped = in_unit.filter_rows(|row| in_scope(&org, row, Field::OrgDepartment, department));

    // Department scoping of the listing only applies when both sheets carry a
    // department column.
    let vacant_department = department.filter(|_| org.index(Field::OrgDepartment).is_some());
    let vacant_titles: HashSet<String> = match vac.index(Field::OrgTitle) {
        Some(_) => vacant
            .rows
            .iter()
            .filter(|row| in_scope(&vac, row, Field::OrgUnit, unit))
            .filter(|row| in_scope(&vac, row, Field::OrgDepartment, vacant_department))
            .filter_map(|row| normalized_title(vac.cell(row, Field::OrgTitle)))
            .collect(),
        None => HashSet::new(),
    };

    let text = |row: &[Cell], field| org.cell(row, field).and_then(Cell::as_text);
    let positions: Vec<PositionRow> = scoped
        .rows
        .iter()
        .map(|row| row.as_slice())
        .map(|row| PositionRow {
            unit: text(row, Field::OrgUnit),
            department: text(row, Field::OrgDepartment),
            title: text(row, Field::OrgTitle),
            incumbent_id: text(row, Field::OrgIncumbentId),
            incumbent_name: text(row, Field::OrgIncumbentName),
            status: classify(
                org.cell(row, Field::OrgIncumbentId),
                org.cell(row, Field::OrgIncumbentName),
                org.cell(row, Field::OrgTitle),
                &vacant_titles,
            ),
        })
        .collect();

    let filled = positions
        .iter()
        .filter(|position| position.status == PositionStatus::Filled)
        .count();

    VacancyReport {
        unit: scope.unit.clone(),
        department: scope.department.clone(),
        total: positions.len(),
        filled,
        vacant: positions.len() - filled,
        positions,
        units: distinct_values(structure, org.index(Field::OrgUnit)),
        departments: distinct_values(&in_unit, org.index(Field::OrgDepartment)),
    }
}

/// Looks up the structure and vacancy sheets (case-insensitively) and builds
/// the report.
pub fn report_from_workbook(workbook: &Workbook, scope: &VacancyScope) -> VacancyOutcome {
    match (workbook.sheet(STRUCTURE_SHEET), workbook.sheet(VACANT_SHEET)) {
        (Some(structure), Some(vacant)) => {
            VacancyOutcome::Report(build_report(structure, vacant, scope))
        }
        _ => VacancyOutcome::MissingSheets,
    }
}
