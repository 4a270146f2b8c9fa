//! Employee × date matrix for scheduling visits.
//!
//! Additions are collected as a local pending overlay and committed in one
//! bulk request. Removals act on server-confirmed visits and are sent
//! immediately. A cell resolves as `pending ?? committed ?? empty`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Weekday};
use fieldforce_core::{AppError, AppResult};
use fieldforce_domain::{
    AssignmentChoice, CellKey, CommittedAssignment, DateWindow, Employee, NewAssignment,
    is_blocked_day,
};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::dashboard_ports::AssignmentGateway;
use crate::debounce::Debouncer;

#[cfg(test)]
mod tests;

/// Maximum number of choices rendered in the picker.
pub const CHOICE_DISPLAY_LIMIT: usize = 50;

/// One employee row of the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    /// Employee id, the row key.
    pub employee_id: String,
    /// Label shown in the first column.
    pub label: String,
}

impl From<&Employee> for GridRow {
    fn from(employee: &Employee) -> Self {
        let label = match &employee.code {
            Some(code) => format!("{} ({code})", employee.name),
            None => employee.name.clone(),
        };

        Self {
            employee_id: employee.id.clone(),
            label,
        }
    }
}

/// Grid construction settings.
#[derive(Debug, Clone, Copy)]
pub struct GridConfig {
    /// Weekday on which nothing can be scheduled.
    pub blocked_weekday: Option<Weekday>,
    /// Quiet period for the row search box.
    pub row_search_debounce: Duration,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            blocked_weekday: Some(Weekday::Sun),
            row_search_debounce: Duration::from_millis(300),
        }
    }
}

/// What a cell displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellView<'a> {
    /// Non-assignable day.
    Blocked,
    /// Nothing scheduled.
    Empty,
    /// Chosen locally, not committed yet.
    Pending(&'a AssignmentChoice),
    /// Scheduled on the server.
    Committed(&'a CommittedAssignment),
}

/// Picker state for the cell being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenCell {
    /// Cell being edited.
    pub cell: CellKey,
    /// Row-scoped choices; `None` while loading.
    pub choices: Option<Vec<AssignmentChoice>>,
}

/// Row-scoped choice fetch issued when a cell opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceRequest {
    /// Open generation the answer must match.
    pub generation: u64,
    /// Employee whose locations to load.
    pub employee_id: String,
}

/// Filtered choices, truncated for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceMatches<'a> {
    /// At most [`CHOICE_DISPLAY_LIMIT`] matches, in source order.
    pub visible: Vec<&'a AssignmentChoice>,
    /// Number of choices matching before truncation.
    pub total_matches: usize,
}

/// Outcome of a bulk commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Every pending visit was created.
    Completed {
        /// Visits created.
        created: u32,
    },
    /// Some visits were rejected; pending entries stay until a refetch confirms.
    Partial {
        /// Visits created.
        created: u32,
        /// Visits rejected.
        failed: u32,
    },
}

impl CommitOutcome {
    /// Notification text for the user.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Completed { created } => format!("{created} visits assigned."),
            Self::Partial { created, failed } => format!(
                "{created} visits assigned, {failed} failed. Review the grid before retrying."
            ),
        }
    }
}

/// Visit assignment editor for one date window.
pub struct AssignmentGrid {
    gateway: Arc<dyn AssignmentGateway>,
    config: GridConfig,
    window: DateWindow,
    rows: Vec<GridRow>,
    committed: BTreeMap<CellKey, CommittedAssignment>,
    pending: BTreeMap<CellKey, AssignmentChoice>,
    column_filters: BTreeMap<NaiveDate, String>,
    open_cell: Option<OpenCell>,
    open_generation: u64,
    row_search: String,
    applied_row_search: String,
    row_search_debounce: Debouncer,
    needs_reverification: bool,
}

impl AssignmentGrid {
    /// Creates an empty grid for the window.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn AssignmentGateway>,
        window: DateWindow,
        config: GridConfig,
    ) -> Self {
        Self {
            gateway,
            config,
            window,
            rows: Vec::new(),
            committed: BTreeMap::new(),
            pending: BTreeMap::new(),
            column_filters: BTreeMap::new(),
            open_cell: None,
            open_generation: 0,
            row_search: String::new(),
            applied_row_search: String::new(),
            row_search_debounce: Debouncer::new(config.row_search_debounce),
            needs_reverification: false,
        }
    }

    /// Returns the visible date window.
    #[must_use]
    pub fn window(&self) -> DateWindow {
        self.window
    }

    /// Replaces the employee rows.
    pub fn set_rows(&mut self, rows: Vec<GridRow>) {
        self.rows = rows;
    }

    /// Returns every row.
    #[must_use]
    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    /// Returns whether the last commit needs a refetch before trusting the grid.
    #[must_use]
    pub fn needs_reverification(&self) -> bool {
        self.needs_reverification
    }

    /// Returns pending entries in cell order.
    pub fn pending(&self) -> impl Iterator<Item = (&CellKey, &AssignmentChoice)> {
        self.pending.iter()
    }

    /// Returns the number of pending entries.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Resolves what one cell shows.
    #[must_use]
    pub fn cell(&self, cell: &CellKey) -> CellView<'_> {
        if is_blocked_day(cell.date, self.config.blocked_weekday) {
            return CellView::Blocked;
        }

        if let Some(choice) = self.pending.get(cell) {
            return CellView::Pending(choice);
        }

        match self.committed.get(cell) {
            Some(assignment) => CellView::Committed(assignment),
            None => CellView::Empty,
        }
    }

    /// Loads server-known visits for the window and reconciles pending state.
    pub async fn refresh(&mut self) -> AppResult<()> {
        let employee_ids: Vec<String> = self
            .rows
            .iter()
            .map(|row| row.employee_id.clone())
            .collect();
        let committed = self
            .gateway
            .list_committed(self.window, &employee_ids)
            .await?;
        self.reconcile(committed);
        Ok(())
    }

    /// Replaces server-known visits with a fresh listing.
    ///
    /// Pending entries whose cell is now occupied on the server are dropped.
    pub fn reconcile(&mut self, committed: Vec<CommittedAssignment>) {
        let window = self.window;
        self.committed = committed
            .into_iter()
            .filter(|assignment| window.contains(assignment.date))
            .map(|assignment| (assignment.cell(), assignment))
            .collect();

        let confirmed: Vec<CellKey> = self
            .pending
            .keys()
            .filter(|cell| self.committed.contains_key(*cell))
            .cloned()
            .collect();
        for cell in &confirmed {
            self.pending.remove(cell);
        }

        self.needs_reverification = false;
    }

    /// Starts editing an empty cell.
    ///
    /// Returns the row-scoped fetch to perform, or `None` when the cell is
    /// blocked, already committed, outside the window or on an unknown row.
    pub fn begin_open(&mut self, cell: CellKey) -> Option<ChoiceRequest> {
        if !self.window.contains(cell.date)
            || !self.rows.iter().any(|row| row.employee_id == cell.row)
            || matches!(self.cell(&cell), CellView::Blocked | CellView::Committed(_))
        {
            return None;
        }

        self.open_generation = self.open_generation.saturating_add(1);
        let employee_id = cell.row.clone();
        self.open_cell = Some(OpenCell {
            cell,
            choices: None,
        });

        Some(ChoiceRequest {
            generation: self.open_generation,
            employee_id,
        })
    }

    /// Stores the choices of an open request if it is still the live one.
    pub fn finish_open(
        &mut self,
        generation: u64,
        choices: AppResult<Vec<AssignmentChoice>>,
    ) -> AppResult<bool> {
        if generation != self.open_generation {
            return Ok(false);
        }

        match choices {
            Ok(choices) => {
                if let Some(open_cell) = self.open_cell.as_mut() {
                    open_cell.choices = Some(choices);
                }
                Ok(true)
            }
            Err(error) => {
                self.open_cell = None;
                Err(error)
            }
        }
    }

    /// Opens a cell and loads its row-scoped choices.
    ///
    /// Choices are fetched again on every open; nothing is cached across cells.
    pub async fn open_cell(&mut self, cell: CellKey) -> AppResult<Option<&OpenCell>> {
        let Some(request) = self.begin_open(cell) else {
            return Ok(None);
        };

        let choices = self
            .gateway
            .list_choices_for_row(request.employee_id.as_str())
            .await;
        self.finish_open(request.generation, choices)?;
        Ok(self.open_cell.as_ref())
    }

    /// Returns the cell being edited.
    #[must_use]
    pub fn open(&self) -> Option<&OpenCell> {
        self.open_cell.as_ref()
    }

    /// Closes the picker without assigning.
    pub fn close_cell(&mut self) {
        self.open_cell = None;
    }

    /// Filters the open cell's choices by a case-insensitive substring.
    #[must_use]
    pub fn search_choices(&self, term: &str) -> ChoiceMatches<'_> {
        let needle = term.trim().to_lowercase();
        let choices = self
            .open_cell
            .as_ref()
            .and_then(|open_cell| open_cell.choices.as_deref())
            .unwrap_or_default();

        let mut visible = Vec::new();
        let mut total_matches = 0;
        for choice in choices
            .iter()
            .filter(|choice| choice.matches_lowercase(&needle))
        {
            total_matches += 1;
            if visible.len() < CHOICE_DISPLAY_LIMIT {
                visible.push(choice);
            }
        }

        ChoiceMatches {
            visible,
            total_matches,
        }
    }

    /// Assigns a choice to the open cell as a pending entry.
    pub fn assign(&mut self, choice_id: &str) -> AppResult<CellKey> {
        let open_cell = self
            .open_cell
            .take()
            .ok_or_else(|| AppError::Validation("no cell is open for editing".to_owned()))?;

        let Some(choice) = open_cell
            .choices
            .as_ref()
            .and_then(|choices| choices.iter().find(|choice| choice.id == choice_id))
            .cloned()
        else {
            let error = AppError::Validation(format!(
                "location '{choice_id}' is not available for this employee"
            ));
            self.open_cell = Some(open_cell);
            return Err(error);
        };

        let key = open_cell.cell;
        self.pending.insert(key.clone(), choice);
        Ok(key)
    }

    /// Drops one pending entry. Returns whether it existed.
    pub fn discard_pending(&mut self, cell: &CellKey) -> bool {
        self.pending.remove(cell).is_some()
    }

    /// Deletes a committed visit on the server right away.
    ///
    /// On failure the committed entry stays as it was.
    pub async fn remove_committed(&mut self, cell: &CellKey) -> AppResult<()> {
        let visit_id = self
            .committed
            .get(cell)
            .map(|assignment| assignment.visit_id.clone())
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "no committed visit for employee '{}' on {}",
                    cell.row, cell.date
                ))
            })?;

        self.gateway.delete_assignment(visit_id.as_str()).await?;
        self.committed.remove(cell);
        info!(visit_id = %visit_id, date = %cell.date, "removed committed visit");
        Ok(())
    }

    /// Sends every pending entry in a single request.
    ///
    /// Full success clears the overlay. Partial success keeps every pending
    /// entry and flags the grid for re-verification. Either way a refetch
    /// follows; if it fails the grid stays flagged.
    pub async fn commit(&mut self) -> AppResult<CommitOutcome> {
        if self.pending.is_empty() {
            return Err(AppError::Validation(
                "there are no pending visits to save".to_owned(),
            ));
        }

        let submitted = u32::try_from(self.pending.len()).unwrap_or(u32::MAX);
        let assignments: Vec<NewAssignment> = self
            .pending
            .iter()
            .map(|(cell, choice)| NewAssignment {
                employee_id: cell.row.clone(),
                location_id: choice.id.clone(),
                date: cell.date,
            })
            .collect();

        let result = self.gateway.bulk_create(assignments).await?;
        let created = result.created.min(submitted);
        let failed = result.failed.max(submitted - created);

        let outcome = if failed == 0 {
            self.pending.clear();
            CommitOutcome::Completed { created }
        } else {
            warn!(submitted, created, failed, "bulk visit commit partially failed");
            CommitOutcome::Partial { created, failed }
        };

        self.needs_reverification = true;
        if let Err(error) = self.refresh().await {
            warn!(error = %error, "refetch after bulk commit failed");
        }

        Ok(outcome)
    }

    /// Moves the window by whole days.
    ///
    /// Pending entries and column filters on dates still visible survive;
    /// the rest are pruned. Call [`AssignmentGrid::refresh`] afterwards.
    pub fn shift_window(&mut self, offset_days: i64) -> AppResult<()> {
        let window = self.window.shifted(offset_days)?;
        self.window = window;

        self.pending.retain(|cell, _| window.contains(cell.date));
        self.committed.retain(|cell, _| window.contains(cell.date));
        self.column_filters.retain(|date, _| window.contains(*date));
        if self
            .open_cell
            .as_ref()
            .is_some_and(|open_cell| !window.contains(open_cell.cell.date))
        {
            self.open_cell = None;
        }

        Ok(())
    }

    /// Filters rows by the location shown on one date.
    pub fn set_column_filter(&mut self, date: NaiveDate, term: &str) -> AppResult<()> {
        if !self.window.contains(date) {
            return Err(AppError::Validation(format!(
                "{date} is outside the visible window"
            )));
        }

        let term = term.trim().to_lowercase();
        if term.is_empty() {
            self.column_filters.remove(&date);
        } else {
            self.column_filters.insert(date, term);
        }
        Ok(())
    }

    /// Returns active column filters.
    #[must_use]
    pub fn column_filters(&self) -> &BTreeMap<NaiveDate, String> {
        &self.column_filters
    }

    /// Records a keystroke in the row search box.
    pub fn set_row_search(&mut self, term: impl Into<String>, now: Instant) {
        self.row_search = term.into();
        self.row_search_debounce.schedule(now);
    }

    /// Applies the row search once its quiet period elapsed.
    pub fn poll_row_search(&mut self, now: Instant) -> bool {
        if !self.row_search_debounce.fire_if_due(now) {
            return false;
        }

        self.applied_row_search = self.row_search.trim().to_lowercase();
        true
    }

    /// Rows matching the applied row search and every column filter.
    #[must_use]
    pub fn visible_rows(&self) -> Vec<&GridRow> {
        self.rows
            .iter()
            .filter(|row| {
                self.applied_row_search.is_empty()
                    || row.label.to_lowercase().contains(&self.applied_row_search)
            })
            .filter(|row| {
                self.column_filters.iter().all(|(date, term)| {
                    let cell = CellKey::new(row.employee_id.clone(), *date);
                    let name = match self.cell(&cell) {
                        CellView::Pending(choice) => Some(choice.name.as_str()),
                        CellView::Committed(assignment) => Some(assignment.location.name.as_str()),
                        CellView::Blocked | CellView::Empty => None,
                    };
                    name.is_some_and(|name| name.to_lowercase().contains(term.as_str()))
                })
            })
            .collect()
    }
}
