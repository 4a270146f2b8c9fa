use async_trait::async_trait;
use fieldforce_application::{
    ApprovalGateway, AssignmentGateway, CollectionSource, FullCollectionSource, IdentityGateway,
};
use fieldforce_core::{AppError, AppResult, Identity, NonEmptyString};
use fieldforce_domain::{
    AssignmentChoice, AttendanceRequest, BulkAssignmentResult, CollectionPage, CollectionQuery,
    CommittedAssignment, CompetitorPrice, DateWindow, Employee, Expense, NewAssignment,
};
use serde::Deserialize;
use serde_json::Value;

use super::HttpApiClient;

/// `GET /auth/me` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityPayload {
    id: Value,
    #[serde(alias = "displayName", alias = "username", default)]
    name: Option<String>,
    #[serde(alias = "roles", default)]
    authorities: Vec<AuthorityPayload>,
}

/// Authorities arrive either as plain strings or as `{ "authority": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuthorityPayload {
    Name(String),
    Granted { authority: String },
}

impl TryFrom<IdentityPayload> for Identity {
    type Error = AppError;

    fn try_from(payload: IdentityPayload) -> Result<Self, Self::Error> {
        let id = match payload.id {
            Value::String(id) => id,
            Value::Number(id) => id.to_string(),
            other => {
                return Err(AppError::Decode(format!(
                    "identity id must be a string or number, got {other}"
                )));
            }
        };
        let authorities = payload
            .authorities
            .into_iter()
            .map(|authority| match authority {
                AuthorityPayload::Name(name) | AuthorityPayload::Granted { authority: name } => {
                    name
                }
            })
            .collect();

        Ok(Identity::new(
            id.clone(),
            payload.name.unwrap_or(id),
            authorities,
        ))
    }
}

#[async_trait]
impl IdentityGateway for HttpApiClient {
    async fn current_identity(&self) -> AppResult<Identity> {
        let url = self.endpoint(&["auth", "me"])?;
        let payload: IdentityPayload = self.get_object(url).await?;
        Identity::try_from(payload)
    }
}

#[async_trait]
impl AssignmentGateway for HttpApiClient {
    async fn list_choices_for_row(&self, employee_id: &str) -> AppResult<Vec<AssignmentChoice>> {
        self.list_visit_choices_for_employee(employee_id).await
    }

    async fn list_committed(
        &self,
        window: DateWindow,
        employee_ids: &[String],
    ) -> AppResult<Vec<CommittedAssignment>> {
        self.list_visits(window, employee_ids).await
    }

    async fn bulk_create(
        &self,
        assignments: Vec<NewAssignment>,
    ) -> AppResult<BulkAssignmentResult> {
        self.bulk_create_visits(&assignments).await
    }

    async fn delete_assignment(&self, visit_id: &str) -> AppResult<()> {
        self.delete_visit(visit_id).await
    }
}

#[async_trait]
impl ApprovalGateway for HttpApiClient {
    async fn approve(&self, request_id: &str) -> AppResult<()> {
        self.approve_attendance(request_id).await
    }

    async fn reject(&self, request_id: &str, reason: &NonEmptyString) -> AppResult<()> {
        self.reject_attendance(request_id, reason.as_str()).await
    }
}

#[async_trait]
impl CollectionSource<AttendanceRequest> for HttpApiClient {
    async fn fetch_page(
        &self,
        query: &CollectionQuery,
    ) -> AppResult<CollectionPage<AttendanceRequest>> {
        self.list_attendance_requests(query).await
    }
}

#[async_trait]
impl FullCollectionSource<AttendanceRequest> for HttpApiClient {
    async fn fetch_all(&self) -> AppResult<Vec<AttendanceRequest>> {
        self.list_all_attendance_requests().await
    }
}

#[async_trait]
impl CollectionSource<Employee> for HttpApiClient {
    async fn fetch_page(&self, query: &CollectionQuery) -> AppResult<CollectionPage<Employee>> {
        self.list_employees(query).await
    }
}

#[async_trait]
impl CollectionSource<Expense> for HttpApiClient {
    async fn fetch_page(&self, query: &CollectionQuery) -> AppResult<CollectionPage<Expense>> {
        self.list_expenses(query).await
    }
}

#[async_trait]
impl CollectionSource<CompetitorPrice> for HttpApiClient {
    async fn fetch_page(
        &self,
        query: &CollectionQuery,
    ) -> AppResult<CollectionPage<CompetitorPrice>> {
        self.list_competitor_prices(query).await
    }
}
