use async_trait::async_trait;
use fieldforce_core::AppResult;
use fieldforce_domain::{
    AssignmentChoice, BulkAssignmentResult, CommittedAssignment, DateWindow, NewAssignment,
};

/// Port for visit scheduling used by the assignment grid.
#[async_trait]
pub trait AssignmentGateway: Send + Sync {
    /// Lists locations valid for one employee.
    async fn list_choices_for_row(&self, employee_id: &str) -> AppResult<Vec<AssignmentChoice>>;

    /// Lists visits already scheduled in the window for the given employees.
    async fn list_committed(
        &self,
        window: DateWindow,
        employee_ids: &[String],
    ) -> AppResult<Vec<CommittedAssignment>>;

    /// Creates every visit in one request.
    async fn bulk_create(&self, assignments: Vec<NewAssignment>)
    -> AppResult<BulkAssignmentResult>;

    /// Deletes one scheduled visit.
    async fn delete_assignment(&self, visit_id: &str) -> AppResult<()>;
}
