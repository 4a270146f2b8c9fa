//! Application services and ports for the field-force dashboard.

#![forbid(unsafe_code)]

mod aggregate_counter;
mod approvals_board;
mod assignment_grid;
mod dashboard_ports;
mod debounce;
mod list_controller;
mod list_state;
mod preferences;
mod role_resolver;
mod view_sync;

pub use aggregate_counter::{
    CategoryCounter, ClientTallyCounter, ServerCategoryCounter, counter_for_role,
};
pub use approvals_board::ApprovalsBoard;
pub use assignment_grid::{
    AssignmentGrid, CHOICE_DISPLAY_LIMIT, CellView, ChoiceMatches, ChoiceRequest, CommitOutcome,
    GridConfig, GridRow, OpenCell,
};
pub use dashboard_ports::{
    ApprovalGateway, AssignmentGateway, CollectionSource, FullCollectionSource, IdentityGateway,
    PreferenceStore, TokenProvider,
};
pub use debounce::Debouncer;
pub use list_controller::{ListController, ListSnapshot};
pub use list_state::{
    Completion, DEFAULT_SEARCH_DEBOUNCE, FetchTicket, ListState, RenderedList, SectionState,
};
pub use preferences::UxPreferences;
pub use role_resolver::{ResolvedIdentity, RoleResolver};
pub use view_sync::{DEFAULT_ECHO_WINDOW, UrlChange, UrlWrite, ViewSynchronizer};
