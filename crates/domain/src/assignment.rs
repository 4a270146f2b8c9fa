use chrono::{Datelike, Days, NaiveDate, Weekday};
use fieldforce_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Coordinates of one grid cell: an employee row and a visit date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellKey {
    /// Row key, the employee id.
    pub row: String,
    /// Column key, the visit date.
    pub date: NaiveDate,
}

impl CellKey {
    /// Creates a cell key.
    #[must_use]
    pub fn new(row: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            row: row.into(),
            date,
        }
    }
}

/// A location an employee can be sent to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentChoice {
    /// Location id.
    pub id: String,
    /// Location name.
    pub name: String,
    /// Secondary attribute shown under the name, e.g. the city.
    #[serde(default)]
    pub secondary: Option<String>,
    /// Location category, e.g. the store type.
    #[serde(default)]
    pub category: Option<String>,
}

impl AssignmentChoice {
    /// Case-insensitive substring match over name, secondary attribute and category.
    ///
    /// `needle` must already be lowercase.
    #[must_use]
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }

        [
            Some(self.name.as_str()),
            self.secondary.as_deref(),
            self.category.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

/// A visit the server already knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittedAssignment {
    /// Server-side visit id.
    pub visit_id: String,
    /// Assigned employee.
    pub employee_id: String,
    /// Visit date.
    pub date: NaiveDate,
    /// Assigned location.
    pub location: AssignmentChoice,
}

impl CommittedAssignment {
    /// Returns the grid cell this visit occupies.
    #[must_use]
    pub fn cell(&self) -> CellKey {
        CellKey::new(self.employee_id.clone(), self.date)
    }
}

/// One visit to create in a bulk commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssignment {
    /// Employee to send.
    pub employee_id: String,
    /// Location to visit.
    pub location_id: String,
    /// Visit date.
    pub date: NaiveDate,
}

/// Server answer to a bulk commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAssignmentResult {
    /// Visits created.
    pub created: u32,
    /// Visits rejected.
    #[serde(default)]
    pub failed: u32,
}

/// Contiguous range of dates shown as grid columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    start: NaiveDate,
    days: u32,
}

impl DateWindow {
    /// Creates a window of `days` columns starting at `start`.
    pub fn new(start: NaiveDate, days: u32) -> AppResult<Self> {
        if days == 0 {
            return Err(AppError::Validation(
                "date window must span at least one day".to_owned(),
            ));
        }
        if start.checked_add_days(Days::new(u64::from(days))).is_none() {
            return Err(AppError::Validation(format!(
                "date window starting {start} is out of range"
            )));
        }

        Ok(Self { start, days })
    }

    /// Creates a window from an inclusive date range.
    pub fn from_range(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if end < start {
            return Err(AppError::Validation(format!(
                "end date {end} is before start date {start}"
            )));
        }

        let days = u32::try_from((end - start).num_days() + 1).map_err(|_| {
            AppError::Validation(format!("date range {start}..{end} is too long"))
        })?;
        Self::new(start, days)
    }

    /// First column date.
    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last column date, inclusive.
    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.start
            .checked_add_days(Days::new(u64::from(self.days - 1)))
            .unwrap_or(self.start)
    }

    /// Number of columns.
    #[must_use]
    pub fn days(&self) -> u32 {
        self.days
    }

    /// Returns whether the date is a column of this window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end()
    }

    /// Column dates in order.
    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start.iter_days().take(self.days as usize).collect()
    }

    /// Returns the window moved by `offset_days`, keeping its width.
    pub fn shifted(&self, offset_days: i64) -> AppResult<Self> {
        let magnitude = Days::new(offset_days.unsigned_abs());
        let start = if offset_days >= 0 {
            self.start.checked_add_days(magnitude)
        } else {
            self.start.checked_sub_days(magnitude)
        }
        .ok_or_else(|| AppError::Validation("date window shift out of range".to_owned()))?;

        Self::new(start, self.days)
    }
}

/// Returns whether a date falls on the non-assignable weekday.
#[must_use]
pub fn is_blocked_day(date: NaiveDate, blocked_weekday: Option<Weekday>) -> bool {
    blocked_weekday.is_some_and(|weekday| date.weekday() == weekday)
}
