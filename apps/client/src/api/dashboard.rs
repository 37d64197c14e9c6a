use resume_domain::dashboard::DashboardResponse;

use crate::error::ClientError;
use crate::http::ApiClient;

impl ApiClient {
    /// Also refreshes the cached balance, which may have moved on another device.
    pub async fn dashboard(&self) -> Result<DashboardResponse, ClientError> {
        let dashboard: DashboardResponse = self.get("/api/dashboard/").await?;
        self.session().set_credits(dashboard.stats.credits);
        Ok(dashboard)
    }
}
