//! PMS Domain - Core types
//!
//! This crate defines the domain model for the property-management API
//! client. All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod health;
pub mod report;
pub mod request;
pub mod resource;
pub mod response;
pub mod settings;
pub mod template;
pub mod user;

pub use auth::{
    AccessToken, Credentials, LoginResponse, LogoutRequest, RefreshRequest, RefreshResponse,
    RefreshToken, Registration, SessionEvent, SessionState, TerminationReason, TokenPair,
};
pub use error::{DomainError, DomainResult};
pub use health::ServiceHealth;
pub use report::{ReportRequest, ReportType};
pub use request::{ApiRequest, Headers, HttpMethod, MultipartForm, RequestBody};
pub use resource::{ListQuery, Page, Resource};
pub use response::{ApiErrorBody, ApiResponse, StatusCode};
pub use settings::ClientSettings;
pub use template::{DocumentGeneration, DownloadedFile, TemplateValidation};
pub use user::{User, UserType};
