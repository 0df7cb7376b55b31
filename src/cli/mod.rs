//! CLI module
//!
//! Command-line interface over the pager and the session store.
//!
//! # Commands
//!
//! - `search` - Run a filtered search and load one or more pages
//! - `login` - Validate a token and persist the session
//! - `whoami` - Show the persisted identity
//! - `logout` - End the session locally and on the backend

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
