//! Console user accounts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of an account in the property-management system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// Administrator
    Admin,
    /// Property manager
    Manager,
    /// Property owner
    #[default]
    Owner,
    /// Tenant
    Tenant,
}

impl UserType {
    /// Human-readable role name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Manager => "Property Manager",
            Self::Owner => "Property Owner",
            Self::Tenant => "Tenant",
        }
    }
}

/// The authenticated account as returned by `users/me/` and login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server identifier.
    pub id: u64,
    /// Login name.
    pub username: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Account role.
    #[serde(default)]
    pub user_type: UserType,
}

impl User {
    /// Full name, falling back to the username when no name is set.
    #[must_use]
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.full_name(), self.user_type.display_name())
    }
}
