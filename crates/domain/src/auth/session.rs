//! Session lifecycle state and events.

use serde::{Deserialize, Serialize};

/// State of the token-refresh machine for the current refresh token.
///
/// ```text
/// Idle --401--> Refreshing --ok--> Idle
///                          --err-> Expired --login--> Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No refresh outstanding.
    #[default]
    Idle,
    /// A refresh call is in flight; new faults join it.
    Refreshing,
    /// Credentials were cleared; only a fresh login leaves this state.
    Expired,
}

impl SessionState {
    /// Returns a user-friendly label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "active",
            Self::Refreshing => "refreshing",
            Self::Expired => "expired",
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The user logged out.
    Logout,
    /// The refresh endpoint rejected the refresh token or was unreachable.
    RefreshFailed,
    /// A refresh was needed but no refresh token was stored.
    MissingRefreshToken,
}

/// Notifications published by the session core for top-level consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Tokens were stored after a successful login.
    LoggedIn {
        /// Name of the user that logged in.
        username: String,
    },
    /// The access token was replaced by a refresh.
    Refreshed,
    /// Credentials were cleared; the consumer should ask for a new login.
    Terminated {
        /// Cause of termination.
        reason: TerminationReason,
    },
}

impl SessionEvent {
    /// Returns true if the session ended without the user asking, so the
    /// consumer must send the user back to login.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::Terminated {
                reason: TerminationReason::RefreshFailed | TerminationReason::MissingRefreshToken
            }
        )
    }
}
