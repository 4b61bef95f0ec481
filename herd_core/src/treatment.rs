//! A single scheduled milestone in a calf's treatment chain.

use crate::calendar::{next_weekday, week_number, weekend_shift, SALE_WEEKDAY};
use crate::TreatmentKind;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A milestone with a planned date and an optional recorded date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Treatment {
    pub kind: TreatmentKind,
    pub expected: NaiveDate,
    pub actual: Option<NaiveDate>,
}

impl Treatment {
    /// The root of every chain. Its date is taken as given, weekends included.
    pub fn birth(date: NaiveDate) -> Self {
        Self {
            kind: TreatmentKind::Birth,
            expected: date,
            actual: None,
        }
    }

    /// Build a fresh node of `kind` from its predecessor's resolved date.
    ///
    /// Sale rolls forward to the next market day; every other kind is
    /// pushed off the weekend.
    pub fn derive(kind: TreatmentKind, predecessor: &Treatment) -> Self {
        let base = predecessor.resolved() + Duration::days(kind.rest_days());
        let expected = match kind {
            TreatmentKind::Birth => predecessor.resolved(),
            TreatmentKind::Sale => next_weekday(base, SALE_WEEKDAY),
            _ => weekend_shift(base),
        };

        Self {
            kind,
            expected,
            actual: None,
        }
    }

    /// Restore a node from stored planned and actual dates
    pub fn restore(kind: TreatmentKind, expected: NaiveDate, actual: Option<NaiveDate>) -> Self {
        Self {
            kind,
            expected,
            actual,
        }
    }

    /// Recorded date if there is one, else the planned date
    pub fn resolved(&self) -> NaiveDate {
        self.actual.unwrap_or(self.expected)
    }

    /// ISO week number of the resolved date
    pub fn week(&self) -> u32 {
        week_number(self.resolved())
    }

    /// Record when the treatment actually happened
    pub fn record(&mut self, date: NaiveDate) {
        self.actual = Some(date);
    }

    /// Schedule ordering: same kinds by resolved date, different kinds by rank
    pub fn schedule_cmp(&self, other: &Treatment) -> Ordering {
        if self.kind == other.kind {
            self.resolved().cmp(&other.resolved())
        } else {
            self.kind.rank().cmp(&other.kind.rank())
        }
    }
}

impl fmt::Display for Treatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<18}: {}", self.kind.as_str(), self.expected)?;
        if let Some(actual) = self.actual {
            write!(f, " (done {})", actual)?;
        }
        Ok(())
    }
}
