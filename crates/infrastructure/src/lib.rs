//! PMS Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration loading and
//! tracing setup for the binary.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod serialization;
pub mod telemetry;

pub use adapters::ReqwestHttpClient;
pub use self::config::{ConfigError, load_settings};
pub use persistence::FileTokenStore;
pub use serialization::{
    SerializationError, from_json, from_json_bytes, to_json_stable, to_json_stable_bytes,
};
pub use telemetry::init_tracing;
