//! Report generation requests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kinds of report the server can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Income and expenses over the period.
    FinancialSummary,
    /// Occupancy and revenue per property.
    PropertyPerformance,
    /// Current tenants and their leases.
    TenantReport,
    /// Maintenance requests over the period.
    MaintenanceReport,
}

/// Body of `POST reports/generate/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Report kind.
    pub report_type: ReportType,
    /// First day covered.
    pub start_date: NaiveDate,
    /// Last day covered.
    pub end_date: NaiveDate,
    /// Restrict to these properties; empty means all.
    #[serde(default)]
    pub property_ids: Vec<u64>,
    /// Custom title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ReportRequest {
    /// Creates a request covering `start_date..=end_date`.
    #[must_use]
    pub const fn new(report_type: ReportType, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            report_type,
            start_date,
            end_date,
            property_ids: Vec::new(),
            title: None,
        }
    }
}
