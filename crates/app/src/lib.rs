//! PMS Console - command-line front end
//!
//! Parses the command line, wires the adapters together and runs one
//! command. This crate is the session consumer: it listens for session
//! events and tells the user when a new login is needed.

pub mod cli;
pub mod commands;
pub mod console;
pub mod prompt;

pub use cli::{Cli, Command, ReportsCommand, TemplatesCommand};
pub use console::Console;
