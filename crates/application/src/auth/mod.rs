//! Session core.
//!
//! This module provides:
//! - In-memory token storage
//! - The single-flight refresh coordinator
//! - Session event fan-out for top-level consumers

mod events;
mod refresh;
mod token_store;

pub use events::SessionEvents;
pub use refresh::{RefreshCoordinator, RefreshError, TOKEN_REFRESH_PATH};
pub use token_store::MemoryTokenStore;
