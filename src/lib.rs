//! Gemini tools MCP server - exposes Gemini CLI prompt, research, code
//! analysis and summarization as MCP tools.
//!
//! File-valued parameters are confined to a configured set of allowed
//! directories before anything is read or handed to the CLI.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod gemini;
pub mod logging;
pub mod sandbox;
pub mod server;
pub mod tools;

pub use config::{Config, DEFAULT_GEMINI_MODEL};
pub use error::{ErrorKind, GeminiError, Result};
pub use gemini::{GeminiCli, Invocation};
pub use sandbox::{AllowedDirectories, PathRequirement};
pub use server::{run_server, GeminiServer};
pub use tools::{GeminiTools, ToolRequest, ToolResult};
