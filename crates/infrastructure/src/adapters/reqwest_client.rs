//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! Request paths are resolved against the configured API root.

use std::time::Duration;

use async_trait::async_trait;
use pms_application::ports::{HttpClient, HttpClientError};
use pms_domain::request::{MultipartForm, PartContent};
use pms_domain::{ApiRequest, ApiResponse, ClientSettings, Headers, HttpMethod, RequestBody};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Url};
use tracing::trace;

/// HTTP client implementation using reqwest.
///
/// Wraps a `reqwest::Client` configured from [`ClientSettings`].
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl ReqwestHttpClient {
    /// Creates a client for the API root and timeout in `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the client cannot be
    /// built.
    pub fn new(settings: &ClientSettings) -> Result<Self, HttpClientError> {
        let base_url = settings
            .base_url()
            .map_err(|e| HttpClientError::InvalidUrl(e.to_string()))?;
        let timeout = Duration::from_secs(settings.timeout_secs);
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Returns the API root requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Joins the request path and query onto the base URL.
    ///
    /// Absolute URLs, such as pagination `next` links, are used as given.
    fn resolve(&self, request: &ApiRequest) -> Result<Url, HttpClientError> {
        let path = request.path.trim_start_matches('/');
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {path}")))?;
        if !request.query.is_empty() {
            let encoded = serde_urlencoded::to_string(&request.query)
                .map_err(|e| HttpClientError::InvalidUrl(e.to_string()))?;
            let query = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
                _ => encoded,
            };
            url.set_query(Some(&query));
        }
        Ok(url)
    }

    /// Builds the request body from domain `RequestBody`.
    fn build_body(
        builder: reqwest::RequestBuilder,
        body: &RequestBody,
    ) -> Result<reqwest::RequestBuilder, HttpClientError> {
        match body {
            RequestBody::Empty => Ok(builder),
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(value)
                    .map_err(|e| HttpClientError::InvalidBody(format!("Invalid JSON: {e}")))?;
                Ok(builder.header("Content-Type", "application/json").body(bytes))
            }
            RequestBody::Multipart(form) => Ok(builder.multipart(Self::build_form(form)?)),
        }
    }

    fn build_form(form: &MultipartForm) -> Result<Form, HttpClientError> {
        let mut multipart = Form::new();
        for part in &form.parts {
            multipart = match &part.content {
                PartContent::Text(value) => multipart.text(part.name.clone(), value.clone()),
                PartContent::File { file_name, bytes } => {
                    let mime = mime_guess::from_path(file_name).first_or_octet_stream();
                    let file = Part::bytes(bytes.clone())
                        .file_name(file_name.clone())
                        .mime_str(mime.essence_str())
                        .map_err(|e| HttpClientError::InvalidBody(e.to_string()))?;
                    multipart.part(part.name.clone(), file)
                }
            };
        }
        Ok(multipart)
    }

    /// Maps reqwest errors to domain `HttpClientError`.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> HttpClientError {
        if error.is_timeout() {
            return HttpClientError::Timeout { timeout_ms };
        }

        if error.is_connect() {
            let message = error.to_string();
            let host = error
                .url()
                .and_then(Url::host_str)
                .unwrap_or("unknown")
                .to_string();
            let lower = message.to_lowercase();
            if lower.contains("dns") || lower.contains("resolve") {
                return HttpClientError::DnsError { host, message };
            }
            if lower.contains("refused") {
                return HttpClientError::ConnectionRefused {
                    host,
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return HttpClientError::ConnectionFailed(message);
        }

        HttpClientError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, HttpClientError> {
        let url = self.resolve(request)?;
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        trace!(%url, method = %request.method, "dispatching");

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        builder = Self::build_body(builder, &request.body)?;

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?;

        let status = response.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            headers.append(name.as_str(), value.to_str().unwrap_or("<binary>"));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?
            .to_vec();

        Ok(ApiResponse::new(status, headers, body))
    }
}
