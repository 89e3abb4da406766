//! # Systems Lab Server
//!
//! Outer surface over `syslab-core`: a clap CLI and a line-delimited JSON
//! tool loop. Both route through [`tools::dispatch`].

#![warn(missing_docs)]

pub mod cli;
pub mod tools;

pub use cli::{action, command, parse_param, Action, CliError};
pub use tools::{dispatch, handle_line, serve, ServeStats, ToolCall, ToolError, ToolFailure, ToolResponse, TOOLS};
