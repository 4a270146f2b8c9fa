use fieldforce_core::AppResult;
use fieldforce_domain::{DashboardOverview, LiveLocation};

use super::{HttpApiClient, ListDecoding};

impl HttpApiClient {
    /// Fetches today's headline numbers.
    pub async fn dashboard_overview(&self) -> AppResult<DashboardOverview> {
        let url = self.endpoint(&["dashboard", "overview"])?;
        self.get_object(url).await
    }

    /// Lists the last reported position of every tracked employee.
    pub async fn live_locations(&self) -> AppResult<Vec<LiveLocation>> {
        let url = self.endpoint(&["dashboard", "live-locations"])?;
        self.get_list(url, ListDecoding::Strict).await
    }
}
