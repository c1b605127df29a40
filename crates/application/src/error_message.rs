//! Turns [`ApiError`]s into text fit for an end user.

use std::collections::BTreeMap;

use pms_domain::ApiErrorBody;

use crate::error::ApiError;
use crate::ports::HttpClientError;

const GENERIC: &str = "Something went wrong. Please try again.";
const TIMED_OUT: &str = "Request timed out. Please try again.";
const CONNECTION: &str = "Connection issue. Please check your internet and try again.";
const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Broad class of a failure, for choosing how to present it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The submitted data was rejected.
    Validation,
    /// The session is missing or expired.
    Authentication,
    /// The user may not do this.
    Permission,
    /// The target does not exist.
    NotFound,
    /// The change conflicts with existing data.
    Conflict,
    /// Too many requests.
    RateLimited,
    /// The server failed.
    Server,
    /// The server could not be reached.
    Network,
    /// Anything else.
    Unknown,
}

/// A failure rendered for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage {
    /// Failure class.
    pub category: ErrorCategory,
    /// Main message.
    pub text: String,
    /// Per-field validation messages.
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl UserMessage {
    fn plain(category: ErrorCategory, text: impl Into<String>) -> Self {
        Self {
            category,
            text: text.into(),
            field_errors: BTreeMap::new(),
        }
    }
}

impl std::fmt::Display for UserMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)?;
        for (field, messages) in &self.field_errors {
            write!(f, "\n  {field}: {}", messages.join(" "))?;
        }
        Ok(())
    }
}

/// Maps an error to the message shown to the user.
#[must_use]
pub fn user_message(error: &ApiError) -> UserMessage {
    match error {
        ApiError::Status { status, body } => from_status(status.as_u16(), body),
        ApiError::Transport(HttpClientError::Timeout { .. }) => {
            UserMessage::plain(ErrorCategory::Network, TIMED_OUT)
        }
        ApiError::Transport(transport) if transport.is_connectivity() => {
            UserMessage::plain(ErrorCategory::Network, CONNECTION)
        }
        ApiError::Transport(_) => UserMessage::plain(ErrorCategory::Network, GENERIC),
        _ => UserMessage::plain(ErrorCategory::Unknown, GENERIC),
    }
}

fn from_status(code: u16, body: &ApiErrorBody) -> UserMessage {
    let mut field_errors: BTreeMap<String, Vec<String>> = body
        .fields
        .iter()
        .map(|(field, messages)| {
            let friendly = messages.iter().map(|m| friendly_field_message(m)).collect();
            (field.clone(), friendly)
        })
        .collect();

    let text = match field_errors.remove(NON_FIELD_ERRORS) {
        Some(messages) if !messages.is_empty() => messages.join(" "),
        _ => match body.server_message() {
            Some(message) if (400..500).contains(&code) && code != 401 => message.to_string(),
            _ => status_text(code).to_string(),
        },
    };

    UserMessage {
        category: category(code),
        text,
        field_errors,
    }
}

/// Generic text for a status code.
#[must_use]
pub const fn status_text(code: u16) -> &'static str {
    match code {
        400 => "Please check your information and try again.",
        401 => "Your session has expired. Please sign in again.",
        403 => "You don't have permission to perform this action.",
        404 => "The item you're looking for doesn't exist.",
        405 => "This action is not allowed.",
        409 => "This action conflicts with existing data.",
        422 => "Please check your information - some details are invalid.",
        429 => "You're making requests too quickly. Please wait a moment.",
        500 => "Something went wrong on our end. Please try again.",
        502 | 503 => "Service is temporarily unavailable. Please try again.",
        504 => TIMED_OUT,
        _ => GENERIC,
    }
}

const fn category(code: u16) -> ErrorCategory {
    match code {
        400 | 422 => ErrorCategory::Validation,
        401 => ErrorCategory::Authentication,
        403 | 405 => ErrorCategory::Permission,
        404 => ErrorCategory::NotFound,
        409 => ErrorCategory::Conflict,
        429 => ErrorCategory::RateLimited,
        500..=599 => ErrorCategory::Server,
        _ => ErrorCategory::Unknown,
    }
}

/// Rewrites a raw validation message in plain words.
///
/// Messages that match no known pattern are kept as they are.
#[must_use]
pub fn friendly_field_message(message: &str) -> String {
    let lower = message.to_lowercase();
    let friendly = if lower.contains("required") {
        "This field is required."
    } else if lower.contains("invalid") {
        "Please enter valid information."
    } else if lower.contains("max_length") {
        "This text is too long."
    } else if lower.contains("min_value") {
        "This value is too small."
    } else if lower.contains("max_value") {
        "This value is too large."
    } else if lower.contains("unique") {
        "This value is already in use."
    } else {
        return message.to_string();
    };
    friendly.to_string()
}
