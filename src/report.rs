//! Headcount report assembled from one employee table.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::aggregate::{self, AgeDistribution, CategoryCount, CategorySummary, GenderBreakdown};
use crate::columns::{EMPLOYEE_FIELDS, Field, FieldMap};
use crate::error::Result;
use crate::model::{Cell, Table};
use crate::roster::{self, Roster};

pub const ALL_UNITS: &str = "Semua Unit";
const ALL_UNITS_DISPLAY: &str = "Semua Unit Kerja";

/// Which rows a report covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum UnitFilter {
    All,
    Unit(String),
}

impl UnitFilter {
    /// `None` and the "Semua Unit" label both select every unit. Any other
    /// selection is kept verbatim so it matches the unit text listed by
    /// [`EmployeeTable::units`].
    pub fn from_selection(selection: Option<&str>) -> Self {
        match selection {
            None => UnitFilter::All,
            Some(unit) if matches!(unit.trim(), "" | ALL_UNITS) => UnitFilter::All,
            Some(unit) => UnitFilter::Unit(unit.to_string()),
        }
    }

    pub fn display(&self) -> &str {
        match self {
            UnitFilter::All => ALL_UNITS_DISPLAY,
            UnitFilter::Unit(unit) => unit,
        }
    }

    fn accepts(&self, cell: Option<&Cell>) -> bool {
        match self {
            UnitFilter::All => true,
            UnitFilter::Unit(unit) => {
                cell.and_then(Cell::as_text).as_deref() == Some(unit.as_str())
            }
        }
    }
}

/// Options that change presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Pin "Karpim - Tetap" and "Karpel - Tetap" at the top of the summary.
    pub pin_permanent: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            pin_permanent: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadcountReport {
    pub unit: UnitFilter,
    pub unit_label: String,
    pub total: usize,
    pub categories: Vec<CategoryCount>,
    pub summary: CategorySummary,
    pub gender: GenderBreakdown,
    pub disability: usize,
    pub age: AgeDistribution,
    pub roster: Roster,
}

/// Employee table with its mandatory columns checked and every field
/// resolved once.
#[derive(Debug, Clone)]
pub struct EmployeeTable {
    table: Table,
    fields: FieldMap,
    unit_idx: usize,
}

impl EmployeeTable {
    /// Fails when the unit or employee group column cannot be resolved.
    pub fn new(table: Table) -> Result<Self> {
        let fields = FieldMap::resolve(&table, &EMPLOYEE_FIELDS);
        let unit_idx = fields.require(Field::Unit)?;
        fields.require(Field::EmployeeGroup)?;
        Ok(Self {
            table,
            fields,
            unit_idx,
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Sorted distinct unit values.
    pub fn units(&self) -> Vec<String> {
        self.table
            .column(self.unit_idx)
            .filter_map(Cell::as_text)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn filter(&self, unit: &UnitFilter) -> Table {
        match unit {
            UnitFilter::All => self.table.clone(),
            UnitFilter::Unit(_) => self
                .table
                .filter_rows(|row| unit.accepts(row.get(self.unit_idx))),
        }
    }

    /// Recomputes every aggregate over the rows of `unit`.
    #[instrument(level = "info", skip(self, unit, options), fields(unit = %unit.display()))]
    pub fn report(&self, unit: &UnitFilter, options: ReportOptions) -> HeadcountReport {
        let filtered = self.filter(unit);
        debug!(rows = filtered.len(), "rows in scope");

        let mut summary = aggregate::category_summary(&filtered, &self.fields);
        summary.rows = aggregate::order_summary(&summary.rows, options.pin_permanent);

        HeadcountReport {
            unit: unit.clone(),
            unit_label: unit.display().to_string(),
            total: filtered.len(),
            categories: aggregate::category_counts(&filtered, &self.fields),
            summary,
            gender: aggregate::gender_breakdown(&filtered, &self.fields),
            disability: aggregate::disability_count(&filtered, &self.fields),
            age: aggregate::age_distribution(&filtered, &self.fields),
            roster: roster::build_roster(&filtered, &self.fields),
        }
    }
}
