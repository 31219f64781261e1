//! Command-line interface
//!
//! - init: write config and create an empty catalog
//! - serve: run the HTTP API
//! - user-create, feed-create, feed-add-user, feed-remove-user,
//!   column-create, files: administrative commands on the catalog

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_response;
