use std::fmt::Debug;

use fieldforce_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Query parameter carrying the view mode.
pub const VIEW_PARAM: &str = "view";

/// Query parameter carrying the selected entity id.
pub const SELECTION_PARAM: &str = "id";

/// Closed set of screens of one multi-screen page.
pub trait ViewMode: Copy + Eq + Debug + Send + Sync + 'static {
    /// Mode shown when the URL carries nothing usable.
    const ROOT: Self;

    /// Every mode of the page.
    const ALL: &'static [Self];

    /// Stable query-string value.
    fn as_param(&self) -> &'static str;

    /// Whether the mode needs a selected entity id.
    fn requires_selection(&self) -> bool;

    /// Parses a query-string value.
    fn from_param(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.as_param() == value)
    }
}

/// Screens of the dashboard overview page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardView {
    /// Summary cards and live map.
    Overview,
    /// Employees filtered by one attendance status.
    StatusList,
    /// One employee's day.
    EmployeeDetail,
}

impl ViewMode for DashboardView {
    const ROOT: Self = Self::Overview;
    const ALL: &'static [Self] = &[Self::Overview, Self::StatusList, Self::EmployeeDetail];

    fn as_param(&self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::StatusList => "status",
            Self::EmployeeDetail => "employee",
        }
    }

    fn requires_selection(&self) -> bool {
        !matches!(self, Self::Overview)
    }
}

/// Screens of the attendance approvals page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalsView {
    /// Status-tabbed request queue.
    Queue,
    /// One attendance request.
    RequestDetail,
}

impl ViewMode for ApprovalsView {
    const ROOT: Self = Self::Queue;
    const ALL: &'static [Self] = &[Self::Queue, Self::RequestDetail];

    fn as_param(&self) -> &'static str {
        match self {
            Self::Queue => "queue",
            Self::RequestDetail => "request",
        }
    }

    fn requires_selection(&self) -> bool {
        matches!(self, Self::RequestDetail)
    }
}

/// Visible screen plus optional selected entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewState<M> {
    mode: M,
    selected_id: Option<String>,
}

impl<M: ViewMode> Default for ViewState<M> {
    fn default() -> Self {
        Self::root()
    }
}

impl<M: ViewMode> ViewState<M> {
    /// The page's root screen.
    #[must_use]
    pub fn root() -> Self {
        Self {
            mode: M::ROOT,
            selected_id: None,
        }
    }

    /// Creates a validated state.
    ///
    /// A selection is required by drill-down modes and rejected by the others.
    pub fn new(mode: M, selected_id: Option<String>) -> AppResult<Self> {
        let selected_id = selected_id
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        match (mode.requires_selection(), selected_id.is_some()) {
            (true, false) => Err(AppError::Validation(format!(
                "view '{}' requires a selected id",
                mode.as_param()
            ))),
            (false, true) => Err(AppError::Validation(format!(
                "view '{}' does not take a selected id",
                mode.as_param()
            ))),
            _ => Ok(Self { mode, selected_id }),
        }
    }

    /// Returns the view mode.
    #[must_use]
    pub fn mode(&self) -> M {
        self.mode
    }

    /// Returns the selected entity id.
    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    /// Returns whether this is the root screen.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.mode == M::ROOT && self.selected_id.is_none()
    }

    /// Decodes a URL query string, falling back to root on anything invalid.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut mode = None;
        let mut selected_id = None;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                VIEW_PARAM => mode = M::from_param(value.as_ref()),
                SELECTION_PARAM => selected_id = Some(value.into_owned()),
                _ => {}
            }
        }

        Self::new(mode.unwrap_or(M::ROOT), selected_id).unwrap_or_else(|_| Self::root())
    }

    /// Encodes the state, omitting parameters equal to their defaults.
    #[must_use]
    pub fn to_query(&self) -> String {
        self.merge_into("")
    }

    /// Rewrites this page's parameters in an existing query, keeping the others.
    #[must_use]
    pub fn merge_into(&self, existing_query: &str) -> String {
        let existing_query = existing_query.strip_prefix('?').unwrap_or(existing_query);
        let mut serializer = form_urlencoded::Serializer::new(String::new());

        for (key, value) in form_urlencoded::parse(existing_query.as_bytes()) {
            if key != VIEW_PARAM && key != SELECTION_PARAM {
                serializer.append_pair(key.as_ref(), value.as_ref());
            }
        }

        if self.mode != M::ROOT {
            serializer.append_pair(VIEW_PARAM, self.mode.as_param());
        }
        if let Some(selected_id) = &self.selected_id {
            serializer.append_pair(SELECTION_PARAM, selected_id);
        }

        serializer.finish()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{ApprovalsView, DashboardView, ViewMode, ViewState};

    #[test]
    fn root_state_encodes_to_empty_query() {
        assert_eq!(ViewState::<DashboardView>::root().to_query(), "");
    }

    #[test]
    fn drill_down_state_encodes_mode_and_id() {
        let state = ViewState::new(DashboardView::EmployeeDetail, Some("42".to_owned()));
        assert!(state.is_ok());
        let state = state.unwrap_or_else(|_| unreachable!());

        assert_eq!(state.to_query(), "view=employee&id=42");
    }

    #[test]
    fn invalid_url_falls_back_to_root() {
        let unknown_mode = ViewState::<DashboardView>::from_query("view=payroll&id=3");
        assert!(unknown_mode.is_root());

        let missing_id = ViewState::<DashboardView>::from_query("?view=employee");
        assert!(missing_id.is_root());
    }

    #[test]
    fn merge_keeps_unrelated_parameters() {
        let state = ViewState::new(ApprovalsView::RequestDetail, Some("r-9".to_owned()))
            .unwrap_or_else(|_| unreachable!());
        let merged = state.merge_into("?tab=pending&view=queue&id=old");

        assert_eq!(merged, "tab=pending&view=request&id=r-9");
        assert_eq!(
            ViewState::<ApprovalsView>::root().merge_into("tab=pending&id=r-9"),
            "tab=pending"
        );
    }

    fn reachable_dashboard_state() -> impl Strategy<Value = ViewState<DashboardView>> {
        (
            prop::sample::select(DashboardView::ALL.to_vec()),
            "[a-zA-Z0-9 &=?/%+-]{1,24}",
        )
            .prop_filter_map("selection must be meaningful", |(mode, id)| {
                let selection = mode.requires_selection().then_some(id);
                ViewState::new(mode, selection).ok()
            })
    }

    proptest! {
        #[test]
        fn query_round_trip_preserves_state(state in reachable_dashboard_state()) {
            let decoded = ViewState::<DashboardView>::from_query(&state.to_query());
            prop_assert_eq!(decoded, state);
        }
    }
}
