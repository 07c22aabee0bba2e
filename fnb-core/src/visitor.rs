use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Budgeted and (when known) actual park attendance for one date.
///
/// Rows for several sub-locations on the same date are merged into a
/// park total with [`VisitorRecord::merge`].
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct VisitorRecord {
    pub date: NaiveDate,
    pub budgeted: u32,
    pub actual: Option<u32>,
}

/// Where the visitor figure used for a prediction came from.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitorSource {
    Actual,
    Budget,
    Override,
}

/// The visitor count fed to the regression for a target date.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct VisitorEstimate {
    pub count: u32,
    pub source: VisitorSource,
}

impl VisitorRecord {
    /// Add another sub-location row for the same date.
    ///
    /// The park actual is only known once every sub-location has reported
    /// one; a single missing figure makes the merged actual `None`.
    pub fn merge(&mut self, other: &VisitorRecord) {
        self.budgeted = self.budgeted.saturating_add(other.budgeted);
        self.actual = match (self.actual, other.actual) {
            (Some(a), Some(b)) => Some(a.saturating_add(b)),
            _ => None,
        };
    }

    /// Visitor covariate for a historical training row: the observed count
    /// when present, otherwise the budget.
    pub fn training_visitors(&self) -> f64 {
        f64::from(self.actual.unwrap_or(self.budgeted))
    }

    /// Visitor figure to predict with for `target`.
    ///
    /// The actual count is only used for dates strictly before `today`;
    /// for today and later the budget (scaled by `budget_factor`) is used
    /// even if an actual figure is already present.
    pub fn estimate_for(&self, today: NaiveDate, budget_factor: f64) -> VisitorEstimate {
        match self.actual {
            Some(actual) if self.date < today => VisitorEstimate {
                count: actual,
                source: VisitorSource::Actual,
            },
            _ => {
                let scaled = (f64::from(self.budgeted) * budget_factor).round().max(0.0);
                VisitorEstimate {
                    count: scaled.min(f64::from(u32::MAX)) as u32,
                    source: VisitorSource::Budget,
                }
            }
        }
    }
}

/// Visitor records indexed by date, one park total per date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitorTable {
    records: BTreeMap<NaiveDate, VisitorRecord>,
}

impl VisitorTable {
    /// Build the table, merging records that share a date.
    pub fn from_records<I: IntoIterator<Item = VisitorRecord>>(records: I) -> Self {
        let mut table: BTreeMap<NaiveDate, VisitorRecord> = BTreeMap::new();
        for record in records {
            table
                .entry(record.date)
                .and_modify(|existing| existing.merge(&record))
                .or_insert(record);
        }
        VisitorTable { records: table }
    }

    pub fn get(&self, date: &NaiveDate) -> Option<&VisitorRecord> {
        self.records.get(date)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First and last date covered, if any.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.keys().next()?;
        let last = self.records.keys().next_back()?;
        Some((*first, *last))
    }
}
