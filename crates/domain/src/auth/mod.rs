//! Authentication types: credentials, tokens, and session lifecycle.

mod session;
mod token;
mod wire;

pub use session::{SessionEvent, SessionState, TerminationReason};
pub use token::{AccessToken, RefreshToken, TokenPair};
pub use wire::{
    Credentials, LoginResponse, LogoutRequest, RefreshRequest, RefreshResponse, Registration,
};
