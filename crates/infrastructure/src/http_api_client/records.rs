use fieldforce_core::AppResult;
use fieldforce_domain::{
    Allowance, ApprovalStatus, CollectionPage, CollectionQuery, CompetitorPrice, Expense,
    NewCompetitorPrice, NewExpense, SalaryUpdate,
};
use reqwest::Method;
use serde_json::json;

use super::{HttpApiClient, ListDecoding, to_json};

impl HttpApiClient {
    // Expenses and allowances

    /// Lists expense claims, one page at a time.
    pub async fn list_expenses(
        &self,
        query: &CollectionQuery,
    ) -> AppResult<CollectionPage<Expense>> {
        let url = self.collection_endpoint(&["expenses"], query)?;
        self.get_page(url).await
    }

    /// Files an expense claim.
    pub async fn create_expense(&self, expense: &NewExpense) -> AppResult<Expense> {
        let url = self.endpoint(&["expenses"])?;
        self.send_for_object(Method::POST, url, expense).await
    }

    /// Moves an expense claim to another status.
    pub async fn update_expense_status(
        &self,
        expense_id: &str,
        status: ApprovalStatus,
    ) -> AppResult<()> {
        let url = self.endpoint(&["expenses", expense_id, "status"])?;
        let body = json!({ "status": status });
        self.send_without_result(Method::PUT, url, Some(&body)).await
    }

    /// Lists salary and allowance figures per employee.
    pub async fn list_allowances(&self) -> AppResult<Vec<Allowance>> {
        let url = self.endpoint(&["allowances"])?;
        self.get_list(url, ListDecoding::Strict).await
    }

    /// Replaces an employee's salary and allowances.
    pub async fn update_salary(&self, employee_id: &str, update: &SalaryUpdate) -> AppResult<()> {
        let url = self.endpoint(&["employees", employee_id, "salary"])?;
        let body = to_json(update)?;
        self.send_without_result(Method::PUT, url, Some(&body)).await
    }

    // Competitor pricing

    /// Lists recorded competitor prices, one page at a time.
    pub async fn list_competitor_prices(
        &self,
        query: &CollectionQuery,
    ) -> AppResult<CollectionPage<CompetitorPrice>> {
        let url = self.collection_endpoint(&["competitor-prices"], query)?;
        self.get_page(url).await
    }

    /// Records a competitor price observed in a store.
    pub async fn create_competitor_price(
        &self,
        price: &NewCompetitorPrice,
    ) -> AppResult<CompetitorPrice> {
        let url = self.endpoint(&["competitor-prices"])?;
        self.send_for_object(Method::POST, url, price).await
    }

    /// Deletes a competitor price record.
    pub async fn delete_competitor_price(&self, price_id: &str) -> AppResult<()> {
        let url = self.endpoint(&["competitor-prices", price_id])?;
        self.send_without_result(Method::DELETE, url, None).await
    }
}
