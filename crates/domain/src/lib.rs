//! Domain types and pure view logic for the Fieldforce dashboard.

#![forbid(unsafe_code)]

mod assignment;
mod collection;
mod role;
mod view_state;
mod workforce;

pub use assignment::{
    AssignmentChoice, BulkAssignmentResult, CellKey, CommittedAssignment, DateWindow,
    NewAssignment, is_blocked_day,
};
pub use collection::{
    AggregateCounts, CollectionItem, CollectionPage, CollectionQuery, DEFAULT_PAGE_SIZE,
    PageEnvelope, SortDirection, SortSpec, paginate,
};
pub use role::{Role, RoleFlags, ViewAccess, classify_role};
pub use view_state::{
    ApprovalsView, DashboardView, SELECTION_PARAM, VIEW_PARAM, ViewMode, ViewState,
};
pub use workforce::{
    Allowance, ApprovalStatus, AttendanceRequest, CompetitorPrice, DashboardOverview, Employee,
    EmployeeVisit, Expense, LiveLocation, NewCompetitorPrice, NewExpense, SalaryUpdate,
    VisitAuditEntry, VisitNote,
};
