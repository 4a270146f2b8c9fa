use fieldforce_core::AppResult;
use fieldforce_domain::{
    AssignmentChoice, BulkAssignmentResult, CommittedAssignment, DateWindow, EmployeeVisit,
    NewAssignment, VisitAuditEntry, VisitNote,
};
use reqwest::Method;
use serde_json::json;

use super::{HttpApiClient, ListDecoding};

impl HttpApiClient {
    /// Lists visits scheduled inside the window, optionally for some employees only.
    pub async fn list_visits(
        &self,
        window: DateWindow,
        employee_ids: &[String],
    ) -> AppResult<Vec<CommittedAssignment>> {
        let mut url = self.endpoint(&["visits"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("startDate", &window.start().to_string())
                .append_pair("endDate", &window.end().to_string());
            if !employee_ids.is_empty() {
                pairs.append_pair("employeeIds", &employee_ids.join(","));
            }
        }

        self.get_list(url, ListDecoding::Strict).await
    }

    /// Lists the locations one employee may be sent to.
    pub async fn list_visit_choices_for_employee(
        &self,
        employee_id: &str,
    ) -> AppResult<Vec<AssignmentChoice>> {
        let url = self.endpoint(&["employees", employee_id, "locations"])?;
        self.get_list(url, ListDecoding::Strict).await
    }

    /// Creates many visits in one request.
    pub async fn bulk_create_visits(
        &self,
        assignments: &[NewAssignment],
    ) -> AppResult<BulkAssignmentResult> {
        let url = self.endpoint(&["visits", "bulk"])?;
        let body = json!({ "visits": assignments });
        self.send_for_object(Method::POST, url, &body).await
    }

    /// Deletes one scheduled visit.
    pub async fn delete_visit(&self, visit_id: &str) -> AppResult<()> {
        let url = self.endpoint(&["visits", visit_id])?;
        self.send_without_result(Method::DELETE, url, None).await
    }

    /// Lists notes left on a visit. A non-JSON body reads as no notes.
    pub async fn list_visit_notes(&self, visit_id: &str) -> AppResult<Vec<VisitNote>> {
        let url = self.endpoint(&["visits", visit_id, "notes"])?;
        self.get_list(url, ListDecoding::Lenient).await
    }

    /// Lists the audit trail of a visit. A non-JSON body reads as empty.
    pub async fn list_visit_audit(&self, visit_id: &str) -> AppResult<Vec<VisitAuditEntry>> {
        let url = self.endpoint(&["visits", visit_id, "audit"])?;
        self.get_list(url, ListDecoding::Lenient).await
    }

    /// Lists an employee's visit history. A non-JSON body reads as empty.
    pub async fn list_employee_visits(&self, employee_id: &str) -> AppResult<Vec<EmployeeVisit>> {
        let url = self.endpoint(&["employees", employee_id, "visits"])?;
        self.get_list(url, ListDecoding::Lenient).await
    }
}
