//! Document templates and the documents generated from them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::response::ApiResponse;

/// Body of `POST templates/generate/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentGeneration {
    /// Template to fill.
    pub template_id: u64,
    /// Values for the template's variables.
    #[serde(default)]
    pub variables: Map<String, Value>,
    /// Title of the generated document; the server picks one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Model the document belongs to, e.g. `lease`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_model: Option<String>,
    /// Id of the related record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_id: Option<u64>,
}

impl DocumentGeneration {
    /// Generation of `template_id` with no variables.
    #[must_use]
    pub fn new(template_id: u64) -> Self {
        Self {
            template_id,
            variables: Map::new(),
            title: None,
            related_model: None,
            related_id: None,
        }
    }

    /// Attaches the document to a record.
    #[must_use]
    pub fn related_to(mut self, model: impl Into<String>, id: u64) -> Self {
        self.related_model = Some(model.into());
        self.related_id = Some(id);
        self
    }
}

/// Answer of `POST templates/validate/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateValidation {
    /// Whether the template renders.
    pub is_valid: bool,
    /// Server report: errors, warnings and the variables found.
    #[serde(default)]
    pub validation: Value,
}

/// A file downloaded from the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Name suggested by `Content-Disposition`.
    pub file_name: Option<String>,
    /// Media type of the body.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl DownloadedFile {
    /// Takes the body and file metadata out of a response.
    #[must_use]
    pub fn from_response(response: ApiResponse) -> Self {
        Self {
            file_name: response
                .headers
                .get("Content-Disposition")
                .and_then(disposition_file_name),
            content_type: response.headers.get("Content-Type").map(str::to_string),
            bytes: response.body,
        }
    }
}

/// Reads `filename="..."` out of a `Content-Disposition` value.
fn disposition_file_name(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}
