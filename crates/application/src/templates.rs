//! Document templates: browsing, generating, downloading and validating.

use pms_domain::{ApiRequest, DocumentGeneration, DownloadedFile, TemplateValidation};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::client::AuthenticatedClient;
use crate::error::ApiResult;

/// Root of the templates API, relative to the API root.
pub const TEMPLATES_PATH: &str = "templates/";

#[derive(Deserialize)]
struct TemplateList {
    templates: Vec<Value>,
}

#[derive(Deserialize)]
struct VariableList {
    variables: Value,
}

#[derive(Deserialize)]
struct GeneratedDocument {
    document: Value,
}

#[derive(Deserialize)]
struct DocumentList {
    documents: Vec<Value>,
}

/// Client for `templates/` and the documents generated from templates.
#[derive(Debug, Clone)]
pub struct TemplatesClient {
    client: AuthenticatedClient,
}

impl TemplatesClient {
    /// Creates a templates client.
    #[must_use]
    pub const fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    /// Lists active templates, optionally narrowed by category and type.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list(
        &self,
        category: Option<&str>,
        template_type: Option<&str>,
    ) -> ApiResult<Vec<Value>> {
        let request = ApiRequest::get(TEMPLATES_PATH)
            .with_query(filters(&[("category", category), ("type", template_type)]));
        let list: TemplateList = self.client.send_json(request).await?;
        Ok(list.templates)
    }

    /// Fetches a template together with its variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; 404 for unknown or inactive
    /// templates.
    pub async fn get(&self, id: u64) -> ApiResult<Value> {
        self.client.get_json(format!("{TEMPLATES_PATH}{id}/")).await
    }

    /// Describes the variables a template expects.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn variables(&self, id: u64) -> ApiResult<Value> {
        let list: VariableList = self
            .client
            .get_json(format!("{TEMPLATES_PATH}{id}/variables/"))
            .await?;
        Ok(list.variables)
    }

    /// Fills a template and stores the result as a generated document.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the variables do not fit the
    /// template.
    pub async fn generate(&self, generation: &DocumentGeneration) -> ApiResult<Value> {
        let generated: GeneratedDocument = self
            .client
            .post_json(format!("{TEMPLATES_PATH}generate/"), generation)
            .await?;
        Ok(generated.document)
    }

    /// Lists the caller's generated documents, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn generated(
        &self,
        status: Option<&str>,
        template_type: Option<&str>,
    ) -> ApiResult<Vec<Value>> {
        let request = ApiRequest::get(format!("{TEMPLATES_PATH}generated/"))
            .with_query(filters(&[("status", status), ("template_type", template_type)]));
        let list: DocumentList = self.client.send_json(request).await?;
        Ok(list.documents)
    }

    /// Downloads the content of a generated document.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; 404 when the document has no
    /// content yet.
    pub async fn download(&self, document_id: u64) -> ApiResult<DownloadedFile> {
        let request = ApiRequest::get(format!("{TEMPLATES_PATH}generated/{document_id}/download/"))
            .with_header("Accept", "*/*");
        let response = self.client.send(request).await?;
        Ok(DownloadedFile::from_response(response))
    }

    /// Checks template source without saving it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; 400 for empty content.
    pub async fn validate(&self, content: &str) -> ApiResult<TemplateValidation> {
        self.client
            .post_json(
                format!("{TEMPLATES_PATH}validate/"),
                &json!({ "content": content }),
            )
            .await
    }
}

fn filters(pairs: &[(&str, Option<&str>)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .filter_map(|(name, value)| value.map(|value| ((*name).to_string(), value.to_string())))
        .collect()
}
