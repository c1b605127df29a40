//! Typed access to the REST collections and the reports endpoints.

use pms_domain::{
    ApiRequest, HttpMethod, ListQuery, MultipartForm, Page, ReportRequest, RequestBody, Resource,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::{AuthenticatedClient, json_body};
use crate::error::ApiResult;

/// CRUD operations over any [`Resource`].
#[derive(Debug, Clone)]
pub struct ResourceClient {
    client: AuthenticatedClient,
}

impl ResourceClient {
    /// Creates a resource client.
    #[must_use]
    pub const fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    /// Lists one page of a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the page cannot be decoded.
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: Resource,
        query: &ListQuery,
    ) -> ApiResult<Page<T>> {
        let request = ApiRequest::get(resource.path()).with_query(query.to_pairs());
        self.client.send_json(request).await
    }

    /// Fetches one item.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the item cannot be decoded.
    pub async fn retrieve<T: DeserializeOwned>(&self, resource: Resource, id: &str) -> ApiResult<T> {
        self.client.get_json(resource.item_path(id)).await
    }

    /// Creates an item.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects the item.
    pub async fn create<B, T>(&self, resource: Resource, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.client.post_json(resource.path(), body).await
    }

    /// Updates some fields of an item (`PATCH`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects the change.
    pub async fn update<B, T>(&self, resource: Resource, id: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.client.patch_json(resource.item_path(id), body).await
    }

    /// Replaces an item (`PUT`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects the item.
    pub async fn replace<B, T>(&self, resource: Resource, id: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.client.put_json(resource.item_path(id), body).await
    }

    /// Deletes an item.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn destroy(&self, resource: Resource, id: &str) -> ApiResult<()> {
        self.client.delete(resource.item_path(id)).await
    }

    /// Calls a custom action such as `leases/{id}/renew/` or
    /// `notifications/mark_all_read/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the answer cannot be decoded.
    pub async fn action<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        resource: Resource,
        id: Option<&str>,
        action: &str,
        body: Option<&Value>,
    ) -> ApiResult<T> {
        let mut request = ApiRequest::new(method, resource.action_path(id, action));
        if let Some(body) = body {
            request = request.with_body(json_body(body)?);
        }
        self.client.send_json(request).await
    }

    /// Uploads a multipart form to a collection, e.g. a new document.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects the upload.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        resource: Resource,
        form: MultipartForm,
    ) -> ApiResult<T> {
        let request = ApiRequest::post(resource.path()).with_body(RequestBody::Multipart(form));
        self.client.send_json(request).await
    }
}

/// Report generation and management.
#[derive(Debug, Clone)]
pub struct ReportsClient {
    client: AuthenticatedClient,
}

impl ReportsClient {
    /// Creates a reports client.
    #[must_use]
    pub const fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    /// Generates a report.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn generate(&self, request: &ReportRequest) -> ApiResult<Value> {
        self.client.post_json("reports/generate/", request).await
    }

    /// Lists previously generated reports.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list(&self) -> ApiResult<Value> {
        self.client.get_json("reports/list/").await
    }

    /// Lists the available report templates.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn templates(&self) -> ApiResult<Value> {
        self.client.get_json("reports/templates/").await
    }

    /// Deletes a generated report.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.client.delete(format!("reports/{id}/delete/")).await
    }
}
