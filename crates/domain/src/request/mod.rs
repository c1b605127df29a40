//! Outgoing API request types
//!
//! This module contains everything needed to describe a REST call:
//! method, path relative to the API base URL, query, headers and body.

mod body;
mod header;
mod method;
mod spec;

pub use body::{MultipartForm, MultipartPart, PartContent, RequestBody};
pub use header::{AUTHORIZATION, Headers, REQUEST_ID};
pub use method::HttpMethod;
pub use spec::ApiRequest;
