//! PMS Application - Session core and API services
//!
//! This crate holds the authenticated request layer and everything built on
//! it. I/O happens only through the ports in [`ports`]; adapters live in
//! `pms-infrastructure`.

pub mod auth;
pub mod client;
pub mod error;
pub mod error_message;
pub mod health;
pub mod ports;
pub mod resources;
pub mod session;
pub mod templates;

#[cfg(test)]
mod test_support;

pub use auth::{MemoryTokenStore, RefreshCoordinator, RefreshError, SessionEvents};
pub use client::AuthenticatedClient;
pub use error::{ApiError, ApiResult};
pub use error_message::{ErrorCategory, UserMessage, user_message};
pub use health::HealthClient;
pub use ports::{HttpClient, HttpClientError, TokenStore, TokenStoreError};
pub use resources::{ReportsClient, ResourceClient};
pub use session::SessionService;
pub use templates::TemplatesClient;
