use fieldforce_core::AppResult;
use fieldforce_domain::{AttendanceRequest, CollectionPage, CollectionQuery};
use reqwest::Method;
use serde_json::json;

use super::{HttpApiClient, ListDecoding};

impl HttpApiClient {
    /// Lists attendance requests for the query's page, status and search term.
    pub async fn list_attendance_requests(
        &self,
        query: &CollectionQuery,
    ) -> AppResult<CollectionPage<AttendanceRequest>> {
        let url = self.collection_endpoint(&["attendance", "requests"], query)?;
        self.get_page(url).await
    }

    /// Lists every attendance request visible to the caller, unpaged.
    pub async fn list_all_attendance_requests(&self) -> AppResult<Vec<AttendanceRequest>> {
        let url = self.endpoint(&["attendance", "requests", "all"])?;
        self.get_list(url, ListDecoding::Strict).await
    }

    /// Approves one request.
    pub async fn approve_attendance(&self, request_id: &str) -> AppResult<()> {
        let url = self.endpoint(&["attendance", "requests", request_id, "approve"])?;
        self.send_without_result(Method::PUT, url, None).await
    }

    /// Rejects one request with a reason.
    pub async fn reject_attendance(&self, request_id: &str, reason: &str) -> AppResult<()> {
        let url = self.endpoint(&["attendance", "requests", request_id, "reject"])?;
        let body = json!({ "reason": reason });
        self.send_without_result(Method::PUT, url, Some(&body)).await
    }
}
