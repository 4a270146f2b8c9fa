use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use fieldforce_core::AppError;
use serde::{Deserialize, Serialize};

use crate::collection::CollectionItem;

/// Approval state of an attendance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    /// Waiting for a decision.
    Pending,
    /// Accepted.
    Approved,
    /// Refused.
    Rejected,
}

impl ApprovalStatus {
    /// Status tabs in display order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Transport values of every status, in tab order.
    #[must_use]
    pub fn categories() -> Vec<String> {
        Self::ALL
            .iter()
            .map(|status| status.as_str().to_owned())
            .collect()
    }
}

impl FromStr for ApprovalStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(AppError::Validation(format!(
                "unknown approval status '{value}'"
            ))),
        }
    }
}

/// An employee in the team hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Employee id.
    pub id: String,
    /// Full name.
    pub name: String,
    /// Employee code shown in tables.
    #[serde(default)]
    pub code: Option<String>,
    /// Role as reported by the backend.
    #[serde(default)]
    pub role: Option<String>,
    /// Direct manager or coordinator.
    #[serde(default)]
    pub manager_id: Option<String>,
    /// City of the employee's territory.
    #[serde(default)]
    pub city: Option<String>,
}

impl CollectionItem for Employee {
    fn category(&self) -> Option<&str> {
        self.role.as_deref()
    }

    fn search_fields(&self) -> Vec<&str> {
        [
            Some(self.name.as_str()),
            self.code.as_deref(),
            self.city.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn sort_value(&self, field: &str) -> Option<String> {
        match field {
            "id" => Some(self.id.clone()),
            "name" => Some(self.name.to_lowercase()),
            "code" => self.code.clone(),
            "city" => self.city.clone(),
            _ => None,
        }
    }
}

/// A leave or attendance-regularisation request waiting for approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRequest {
    /// Request id.
    pub id: String,
    /// Requesting employee.
    pub employee_id: String,
    /// Requesting employee's name.
    pub employee_name: String,
    /// Request type, e.g. full day or half day.
    #[serde(default)]
    pub request_type: Option<String>,
    /// First day covered.
    pub start_date: NaiveDate,
    /// Last day covered.
    pub end_date: NaiveDate,
    /// Free-text reason.
    #[serde(default)]
    pub reason: Option<String>,
    /// Current approval status.
    pub status: ApprovalStatus,
}

impl CollectionItem for AttendanceRequest {
    fn category(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn search_fields(&self) -> Vec<&str> {
        [
            Some(self.employee_name.as_str()),
            self.request_type.as_deref(),
            self.reason.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn sort_value(&self, field: &str) -> Option<String> {
        match field {
            "id" => Some(self.id.clone()),
            "employeeName" => Some(self.employee_name.to_lowercase()),
            "startDate" => Some(self.start_date.to_string()),
            "endDate" => Some(self.end_date.to_string()),
            "status" => Some(self.status.as_str().to_owned()),
            _ => None,
        }
    }
}

/// Expense claim filed by an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Expense id.
    pub id: String,
    /// Claiming employee.
    pub employee_id: String,
    /// Expense category, e.g. travel.
    pub expense_type: String,
    /// Claimed amount.
    pub amount: f64,
    /// Date of expense.
    pub date: NaiveDate,
    /// Approval status.
    pub status: ApprovalStatus,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of an expense claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    /// Claiming employee.
    pub employee_id: String,
    /// Expense category.
    pub expense_type: String,
    /// Claimed amount.
    pub amount: f64,
    /// Date of expense.
    pub date: NaiveDate,
    /// Optional description.
    pub description: Option<String>,
}

/// Daily allowance configured for an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allowance {
    /// Employee receiving the allowance.
    pub employee_id: String,
    /// Employee name.
    pub employee_name: String,
    /// Base monthly salary.
    pub base_salary: f64,
    /// Travel allowance per day.
    pub travel_allowance: f64,
    /// Daily allowance per working day.
    pub daily_allowance: f64,
}

/// Salary or allowance change for one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryUpdate {
    /// New base salary.
    pub base_salary: f64,
    /// New travel allowance.
    pub travel_allowance: f64,
    /// New daily allowance.
    pub daily_allowance: f64,
}

/// Competitor shelf price observed during a visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorPrice {
    /// Record id.
    pub id: String,
    /// Competitor brand.
    pub brand: String,
    /// Product observed.
    pub product: String,
    /// Observed price.
    pub price: f64,
    /// Store where it was observed.
    #[serde(default)]
    pub store_name: Option<String>,
    /// Observation date.
    pub recorded_on: NaiveDate,
}

/// Body of a competitor price observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCompetitorPrice {
    /// Competitor brand.
    pub brand: String,
    /// Product observed.
    pub product: String,
    /// Observed price.
    pub price: f64,
    /// Store id.
    pub store_id: String,
    /// Observation date.
    pub recorded_on: NaiveDate,
}

/// Dashboard summary counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardOverview {
    /// Employees under the viewer.
    pub total_employees: u64,
    /// Employees checked in today.
    pub present_today: u64,
    /// Employees on leave today.
    pub on_leave_today: u64,
    /// Visits planned for today.
    pub visits_planned_today: u64,
    /// Visits completed today.
    pub visits_completed_today: u64,
    /// Attendance requests waiting for approval.
    pub pending_approvals: u64,
}

/// Last known position of a field employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveLocation {
    /// Employee id.
    pub employee_id: String,
    /// Employee name.
    pub employee_name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Time of the fix.
    pub recorded_at: DateTime<Utc>,
}

/// Free-text note attached to a visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitNote {
    /// Note id.
    pub id: String,
    /// Note text.
    pub text: String,
    /// Author name.
    #[serde(default)]
    pub author: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// One state change of a visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitAuditEntry {
    /// Action performed, e.g. checked in.
    pub action: String,
    /// Who performed it.
    #[serde(default)]
    pub actor: Option<String>,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
}

/// A visit in one employee's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeVisit {
    /// Visit id.
    pub id: String,
    /// Location name.
    pub location_name: String,
    /// Visit date.
    pub date: NaiveDate,
    /// Visit status, e.g. completed.
    pub status: String,
}
