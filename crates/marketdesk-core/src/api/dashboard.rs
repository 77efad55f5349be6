//! Dashboard endpoint: headline figures and the period reports.

use anyhow::{Context, Result};
use serde::Deserialize;

use super::AdminClient;
use crate::models::report::OverviewResponse;
use crate::models::{JoiningReport, Overview, Period, RevenueReport};

const DASHBOARD_PATH: &str = "/admin/dashboard/overview";

#[derive(Debug, Default, Deserialize)]
struct DashboardPayload {
    #[serde(default)]
    overview: Option<OverviewResponse>,
    #[serde(rename = "revenueReport", default)]
    revenue_report: Option<RevenueReport>,
    #[serde(rename = "joiningReport", default)]
    joining_report: Option<JoiningReport>,
}

impl AdminClient {
    async fn dashboard(&self, period: Option<Period>) -> Result<DashboardPayload> {
        let query: Vec<(&str, String)> = period
            .map(|p| vec![("period", p.as_str().to_string())])
            .unwrap_or_default();
        self.get(DASHBOARD_PATH, &query)
            .await
            .context("Failed to fetch dashboard")
    }

    /// Total revenue, sellers and users. Missing figures read as zero.
    pub async fn overview(&self) -> Result<Overview> {
        let payload = self.dashboard(None).await?;
        Ok(payload.overview.unwrap_or_default().into())
    }

    pub async fn revenue_report(&self, period: Period) -> Result<RevenueReport> {
        let payload = self.dashboard(Some(period)).await?;
        let mut report = payload.revenue_report.unwrap_or_default();
        report.period.get_or_insert(period);
        Ok(report)
    }

    pub async fn joining_report(&self, period: Period) -> Result<JoiningReport> {
        let payload = self.dashboard(Some(period)).await?;
        let mut report = payload.joining_report.unwrap_or_default();
        report.period.get_or_insert(period);
        Ok(report)
    }
}
