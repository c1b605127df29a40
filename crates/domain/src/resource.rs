//! REST collections exposed by the property-management API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A REST collection registered on the API router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    /// `users/`
    Users,
    /// `properties/`
    Properties,
    /// `property-images/`
    PropertyImages,
    /// `tenants/`
    Tenants,
    /// `leases/`
    Leases,
    /// `maintenance/`
    Maintenance,
    /// `payments/`
    Payments,
    /// `accounting/transactions/`
    Transactions,
    /// `accounting/periods/`
    AccountingPeriods,
    /// `billing/plans/`
    SubscriptionPlans,
    /// `billing/subscriptions/`
    Subscriptions,
    /// `billing/payment-methods/`
    PaymentMethods,
    /// `billing/invoices/`
    Invoices,
    /// `notifications/`
    Notifications,
    /// `notification-preferences/`
    NotificationPreferences,
    /// `audit/`
    AuditLogs,
    /// `documents/`
    Documents,
}

impl Resource {
    /// Every collection, in router registration order.
    pub const ALL: &'static [Self] = &[
        Self::Users,
        Self::Properties,
        Self::PropertyImages,
        Self::Tenants,
        Self::Leases,
        Self::Maintenance,
        Self::Payments,
        Self::Transactions,
        Self::AccountingPeriods,
        Self::SubscriptionPlans,
        Self::Subscriptions,
        Self::PaymentMethods,
        Self::Invoices,
        Self::Notifications,
        Self::NotificationPreferences,
        Self::AuditLogs,
        Self::Documents,
    ];

    /// Collection path relative to the API root, with trailing slash.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Users => "users/",
            Self::Properties => "properties/",
            Self::PropertyImages => "property-images/",
            Self::Tenants => "tenants/",
            Self::Leases => "leases/",
            Self::Maintenance => "maintenance/",
            Self::Payments => "payments/",
            Self::Transactions => "accounting/transactions/",
            Self::AccountingPeriods => "accounting/periods/",
            Self::SubscriptionPlans => "billing/plans/",
            Self::Subscriptions => "billing/subscriptions/",
            Self::PaymentMethods => "billing/payment-methods/",
            Self::Invoices => "billing/invoices/",
            Self::Notifications => "notifications/",
            Self::NotificationPreferences => "notification-preferences/",
            Self::AuditLogs => "audit/",
            Self::Documents => "documents/",
        }
    }

    /// Short name used on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Properties => "properties",
            Self::PropertyImages => "property-images",
            Self::Tenants => "tenants",
            Self::Leases => "leases",
            Self::Maintenance => "maintenance",
            Self::Payments => "payments",
            Self::Transactions => "transactions",
            Self::AccountingPeriods => "accounting-periods",
            Self::SubscriptionPlans => "plans",
            Self::Subscriptions => "subscriptions",
            Self::PaymentMethods => "payment-methods",
            Self::Invoices => "invoices",
            Self::Notifications => "notifications",
            Self::NotificationPreferences => "notification-preferences",
            Self::AuditLogs => "audit",
            Self::Documents => "documents",
        }
    }

    /// Path of one item: `<collection>/<id>/`.
    #[must_use]
    pub fn item_path(self, id: &str) -> String {
        format!("{}{id}/", self.path())
    }

    /// Path of a custom action, on the collection or on one item.
    #[must_use]
    pub fn action_path(self, id: Option<&str>, action: &str) -> String {
        match id {
            Some(id) => format!("{}{action}/", self.item_path(id)),
            None => format!("{}{action}/", self.path()),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        let wanted = s.trim().trim_matches('/').to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.name() == wanted || r.path().trim_end_matches('/') == wanted)
            .ok_or_else(|| DomainError::UnknownResource(s.to_string()))
    }
}

/// Filters and paging for a collection listing.
///
/// Maps onto the server's page-number pagination plus its search, ordering
/// and field filter backends.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListQuery {
    /// 1-based page number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Items per page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Free-text search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Ordering field, `-` prefix for descending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
    /// Exact-match field filters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<(String, String)>,
}

impl ListQuery {
    /// Creates an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a page.
    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the search term.
    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub fn ordering(mut self, field: impl Into<String>) -> Self {
        self.ordering = Some(field.into());
        self
    }

    /// Adds a field filter.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Flattens the query into key/value pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(size) = self.page_size {
            pairs.push(("page_size".to_string(), size.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        if let Some(ordering) = &self.ordering {
            pairs.push(("ordering".to_string(), ordering.clone()));
        }
        pairs.extend(self.filters.iter().cloned());
        pairs
    }
}

/// Paginated listing envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of items across all pages.
    pub count: u64,
    /// URL of the next page.
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page.
    #[serde(default)]
    pub previous: Option<String>,
    /// Items on this page.
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Returns true if more pages follow.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.next.is_some()
    }
}
