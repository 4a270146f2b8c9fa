use fieldforce_core::AppResult;
use fieldforce_domain::{CollectionPage, CollectionQuery, Employee};
use reqwest::Method;
use serde_json::json;

use super::{HttpApiClient, ListDecoding};

impl HttpApiClient {
    /// Lists employees visible to the caller, one page at a time.
    pub async fn list_employees(
        &self,
        query: &CollectionQuery,
    ) -> AppResult<CollectionPage<Employee>> {
        let url = self.collection_endpoint(&["employees"], query)?;
        self.get_page(url).await
    }

    /// Fetches one employee.
    pub async fn get_employee(&self, employee_id: &str) -> AppResult<Employee> {
        let url = self.endpoint(&["employees", employee_id])?;
        self.get_object(url).await
    }

    /// Lists the direct reports of a manager or coordinator.
    pub async fn list_subordinates(&self, employee_id: &str) -> AppResult<Vec<Employee>> {
        let url = self.endpoint(&["employees", employee_id, "subordinates"])?;
        self.get_list(url, ListDecoding::Strict).await
    }

    /// Puts a field officer under a coordinator.
    pub async fn assign_field_officer(
        &self,
        coordinator_id: &str,
        field_officer_id: &str,
    ) -> AppResult<()> {
        let url = self.endpoint(&["employees", coordinator_id, "field-officers"])?;
        let body = json!({ "fieldOfficerId": field_officer_id });
        self.send_without_result(Method::POST, url, Some(&body)).await
    }

    /// Removes a field officer from a coordinator's team.
    pub async fn remove_field_officer(
        &self,
        coordinator_id: &str,
        field_officer_id: &str,
    ) -> AppResult<()> {
        let url = self.endpoint(&[
            "employees",
            coordinator_id,
            "field-officers",
            field_officer_id,
        ])?;
        self.send_without_result(Method::DELETE, url, None).await
    }
}
