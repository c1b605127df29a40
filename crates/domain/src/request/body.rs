//! HTTP Request body types

use serde::{Deserialize, Serialize};

/// Body of an outgoing API request.
///
/// JSON is the default encoding for the REST API. Multipart form data is only
/// used for file uploads (documents, property images).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// JSON document
    Json(serde_json::Value),
    /// Multipart form data
    Multipart(MultipartForm),
}

impl RequestBody {
    /// Creates a JSON body from a serializable value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::Json)
    }

    /// Returns whether the body is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the content type implied by the body, if any.
    ///
    /// Multipart bodies return `None` because the boundary is chosen by the
    /// transport.
    #[must_use]
    pub const fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Json(_) => Some("application/json"),
            Self::Empty | Self::Multipart(_) => None,
        }
    }
}

/// A multipart form made of named parts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MultipartForm {
    /// Parts in submission order.
    pub parts: Vec<MultipartPart>,
}

impl MultipartForm {
    /// Creates an empty form.
    #[must_use]
    pub const fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Adds a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            content: PartContent::Text(value.into()),
        });
        self
    }

    /// Adds a file field.
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            content: PartContent::File {
                file_name: file_name.into(),
                bytes,
            },
        });
        self
    }
}

/// One named part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipartPart {
    /// Form field name.
    pub name: String,
    /// Part payload.
    pub content: PartContent,
}

/// Payload of a multipart part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartContent {
    /// Plain text value.
    Text(String),
    /// File upload.
    File {
        /// File name reported to the server; also drives MIME detection.
        file_name: String,
        /// Raw file contents.
        bytes: Vec<u8>,
    },
}
