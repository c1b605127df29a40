//! Port adapters backed by third-party crates.

mod reqwest_client;

pub use reqwest_client::ReqwestHttpClient;
