//! Headcount aggregates over a (filtered) employee table.
//!
//! Every function is a single pass over the rows it is given and degrades to
//! zero counts when its optional column is absent. Only the unit and employee
//! group columns are mandatory, and those are checked by the caller through
//! [`FieldMap::require`].

use std::collections::HashMap;

use serde::Serialize;

use crate::columns::{Field, FieldMap};
use crate::model::{Cell, Table};

pub const KARPEL_TETAP: &str = "Karpel - Tetap";
pub const KARPIM_TETAP: &str = "Karpim - Tetap";
pub const KARPEL_TIDAK_TETAP: &str = "Karpel - Tidak Tetap";
pub const KARPIM_TIDAK_TETAP: &str = "Karpim - Tidak Tetap";

/// Permanent categories, each summarised as a single row.
pub const PERMANENT_CATEGORIES: [&str; 2] = [KARPEL_TETAP, KARPIM_TETAP];
/// Non-permanent categories, summarised per non-permanent employee type.
pub const NON_PERMANENT_CATEGORIES: [&str; 2] = [KARPEL_TIDAK_TETAP, KARPIM_TIDAK_TETAP];

/// Headcount of one employee group value, missing values included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    /// `None` for rows without an employee group.
    pub category: Option<String>,
    pub count: usize,
    /// Rows of this category carrying a job grade value. Kept for
    /// completeness; reports do not need to show it.
    pub approved: usize,
}

impl CategoryCount {
    pub fn label(&self) -> &str {
        self.category.as_deref().unwrap_or("(kosong)")
    }
}

/// One row of the category summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub label: String,
    pub count: usize,
}

impl SummaryRow {
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Permanent categories plus the per-type split of non-permanent ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub rows: Vec<SummaryRow>,
    pub permanent_total: usize,
    pub non_permanent_total: usize,
}

impl CategorySummary {
    pub fn total(&self) -> usize {
        self.rows.iter().map(|row| row.count).sum()
    }
}

fn category_of(fields: &FieldMap, row: &[Cell]) -> Option<String> {
    fields.cell(row, Field::EmployeeGroup).and_then(Cell::as_text)
}

/// Counts rows per employee group, including a bucket for missing values,
/// ordered by descending count.
pub fn category_counts(table: &Table, fields: &FieldMap) -> Vec<CategoryCount> {
    let mut counts: HashMap<Option<String>, (usize, usize)> = HashMap::new();
    for row in &table.rows {
        let approved = fields
            .cell(row, Field::JobGrade)
            .is_some_and(|cell| !cell.is_empty());
        let entry = counts.entry(category_of(fields, row)).or_default();
        entry.0 += 1;
        if approved {
            entry.1 += 1;
        }
    }

    let mut result: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, (count, approved))| CategoryCount {
            category,
            count,
            approved,
        })
        .collect();
    result.sort_by(|lhs, rhs| {
        rhs.count
            .cmp(&lhs.count)
            .then_with(|| match (&lhs.category, &rhs.category) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
    });
    result
}

/// Builds the category summary: one row per non-empty permanent category and
/// one `"<category>: <type>"` row per distinct type of each non-permanent
/// category. Non-permanent rows without a type are left out.
pub fn category_summary(table: &Table, fields: &FieldMap) -> CategorySummary {
    let mut permanent: HashMap<&str, usize> = HashMap::new();
    let mut by_type: HashMap<(&str, String), usize> = HashMap::new();

    for row in &table.rows {
        let Some(category) = category_of(fields, row) else {
            continue;
        };
        if let Some(label) = PERMANENT_CATEGORIES.iter().find(|label| **label == category) {
            *permanent.entry(*label).or_default() += 1;
        } else if let Some(label) = NON_PERMANENT_CATEGORIES
            .iter()
            .find(|label| **label == category)
        {
            let kind = fields
                .cell(row, Field::NonPermanentType)
                .and_then(Cell::as_text)
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty());
            if let Some(kind) = kind {
                *by_type.entry((*label, kind)).or_default() += 1;
            }
        }
    }

    let mut rows = Vec::new();
    let mut permanent_total = 0;
    for label in PERMANENT_CATEGORIES {
        let count = permanent.get(label).copied().unwrap_or(0);
        if count > 0 {
            rows.push(SummaryRow::new(label, count));
            permanent_total += count;
        }
    }

    for parent in NON_PERMANENT_CATEGORIES {
        let mut split: Vec<(&String, usize)> = by_type
            .iter()
            .filter(|((label, _), _)| *label == parent)
            .map(|((_, kind), count)| (kind, *count))
            .collect();
        split.sort_by(|lhs, rhs| rhs.1.cmp(&lhs.1).then_with(|| lhs.0.cmp(rhs.0)));
        rows.extend(
            split
                .into_iter()
                .map(|(kind, count)| SummaryRow::new(format!("{parent}: {kind}"), count)),
        );
    }

    let total: usize = rows.iter().map(|row| row.count).sum();
    CategorySummary {
        rows,
        permanent_total,
        non_permanent_total: total - permanent_total,
    }
}

/// Orders summary rows by descending count. With `pin_permanent`, "Karpim -
/// Tetap" and then "Karpel - Tetap" come first regardless of their counts.
pub fn order_summary(rows: &[SummaryRow], pin_permanent: bool) -> Vec<SummaryRow> {
    let priority = |label: &str| -> u8 {
        if !pin_permanent {
            return 0;
        }
        match label.trim().to_lowercase().as_str() {
            "karpim - tetap" => 0,
            "karpel - tetap" => 1,
            _ => 2,
        }
    };

    let mut ordered = rows.to_vec();
    ordered.sort_by(|lhs, rhs| {
        priority(&lhs.label)
            .cmp(&priority(&rhs.label))
            .then_with(|| rhs.count.cmp(&lhs.count))
    });
    ordered
}

/// Gender bucket of a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

pub fn classify_gender(cell: Option<&Cell>) -> Gender {
    let text = cell
        .and_then(Cell::as_text)
        .unwrap_or_else(|| "unknown".to_string());
    match text.trim().to_lowercase().as_str() {
        "male" | "m" | "l" => Gender::Male,
        "female" | "f" | "p" => Gender::Female,
        _ => Gender::Other,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenderBreakdown {
    pub male: usize,
    pub female: usize,
    pub other: usize,
}

impl GenderBreakdown {
    pub fn total(&self) -> usize {
        self.male + self.female + self.other
    }
}

/// Partitions every row into male, female or other. Without a gender column
/// every row counts as other.
pub fn gender_breakdown(table: &Table, fields: &FieldMap) -> GenderBreakdown {
    let mut breakdown = GenderBreakdown::default();
    for row in &table.rows {
        match classify_gender(fields.cell(row, Field::Gender)) {
            Gender::Male => breakdown.male += 1,
            Gender::Female => breakdown.female += 1,
            Gender::Other => breakdown.other += 1,
        }
    }
    breakdown
}

/// Values (trimmed, lowercase) that mean "no disability".
pub const NO_DISABILITY_VALUES: [&str; 7] = ["", "nan", "tidak ada", "tidak", "none", "no", "0"];

/// True when any of `columns` holds a value outside [`NO_DISABILITY_VALUES`].
pub fn has_disability(row: &[Cell], columns: &[usize]) -> bool {
    columns.iter().any(|idx| {
        let text = row
            .get(*idx)
            .and_then(Cell::as_text)
            .unwrap_or_else(|| "nan".to_string());
        let normalized = text.trim().to_lowercase();
        !NO_DISABILITY_VALUES.contains(&normalized.as_str())
    })
}

/// Number of records with a disability in at least one disability column.
pub fn disability_count(table: &Table, fields: &FieldMap) -> usize {
    if fields.disability().is_empty() {
        return 0;
    }
    table
        .rows
        .iter()
        .filter(|row| has_disability(row, fields.disability()))
        .count()
}

/// Age brackets; upper bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBucket {
    UpTo24,
    From25To30,
    From31To40,
    From41To50,
    From51To55,
    Over55,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 6] = [
        AgeBucket::UpTo24,
        AgeBucket::From25To30,
        AgeBucket::From31To40,
        AgeBucket::From41To50,
        AgeBucket::From51To55,
        AgeBucket::Over55,
    ];

    /// Bucket of a numeric age; negative or non-finite ages have none.
    pub fn from_age(age: f64) -> Option<Self> {
        if !age.is_finite() || age < 0.0 {
            return None;
        }
        Some(if age <= 24.0 {
            AgeBucket::UpTo24
        } else if age <= 30.0 {
            AgeBucket::From25To30
        } else if age <= 40.0 {
            AgeBucket::From31To40
        } else if age <= 50.0 {
            AgeBucket::From41To50
        } else if age <= 55.0 {
            AgeBucket::From51To55
        } else {
            AgeBucket::Over55
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeBucket::UpTo24 => "<24 Tahun",
            AgeBucket::From25To30 => "25 - 30 Tahun",
            AgeBucket::From31To40 => "31 - 40 Tahun",
            AgeBucket::From41To50 => "41 - 50 Tahun",
            AgeBucket::From51To55 => "51 - 55 Tahun",
            AgeBucket::Over55 => ">55 Tahun",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgeBucketCount {
    pub bucket: AgeBucket,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgeDistribution {
    /// All six buckets in ascending order, zero counts included.
    pub buckets: Vec<AgeBucketCount>,
    /// Rows whose age was missing or not numeric.
    pub excluded: usize,
}

impl AgeDistribution {
    pub fn count(&self, bucket: AgeBucket) -> usize {
        self.buckets
            .iter()
            .find(|entry| entry.bucket == bucket)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }
}

pub fn age_distribution(table: &Table, fields: &FieldMap) -> AgeDistribution {
    let mut counts = [0usize; 6];
    let mut excluded = 0;
    for row in &table.rows {
        let bucket = fields
            .cell(row, Field::Age)
            .and_then(Cell::as_number)
            .and_then(AgeBucket::from_age);
        match bucket {
            Some(bucket) => counts[bucket as usize] += 1,
            None => excluded += 1,
        }
    }

    AgeDistribution {
        buckets: AgeBucket::ALL
            .iter()
            .map(|bucket| AgeBucketCount {
                bucket: *bucket,
                label: bucket.label(),
                count: counts[*bucket as usize],
            })
            .collect(),
        excluded,
    }
}
