//! Runtime configuration.

use crate::sandbox::AllowedDirectories;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding the allowed directories.
pub const ALLOWED_DIRS_ENV: &str = "GEMINI_MCP_ALLOWED_DIRS";

/// Model used when a tool call does not name one.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro";

/// File context larger than this is passed through a scratch file.
pub const DEFAULT_INLINE_LIMIT: usize = 32 * 1024;

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    pub allowed_dirs: Arc<AllowedDirectories>,
    /// Program name or path of the Gemini CLI.
    pub gemini_program: PathBuf,
    pub default_model: String,
    pub inline_limit: usize,
    pub timeout: Option<Duration>,
    /// Where scratch files are created. `None` uses the OS temp dir.
    pub scratch_dir: Option<PathBuf>,
}

impl Config {
    pub fn new(allowed_dirs: AllowedDirectories) -> Self {
        Self {
            allowed_dirs: Arc::new(allowed_dirs),
            gemini_program: PathBuf::from("gemini"),
            default_model: DEFAULT_GEMINI_MODEL.to_string(),
            inline_limit: DEFAULT_INLINE_LIMIT,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            scratch_dir: None,
        }
    }

    pub fn with_gemini_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.gemini_program = program.into();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_inline_limit(mut self, limit: usize) -> Self {
        self.inline_limit = limit;
        self
    }

    /// A zero duration disables the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = if timeout.is_zero() { None } else { Some(timeout) };
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }
}

/// Parse an OS path-separator delimited directory list.
///
/// Returns `None` when the list holds no usable entries, so callers fall
/// back to the working directory.
pub fn parse_allowed_dirs(raw: &OsStr) -> Option<AllowedDirectories> {
    let dirs: Vec<PathBuf> = std::env::split_paths(raw)
        .filter(|p| !p.as_os_str().to_string_lossy().trim().is_empty())
        .collect();

    if dirs.is_empty() {
        None
    } else {
        Some(AllowedDirectories::new(dirs))
    }
}

/// Resolve the allowed directory set from an explicit value, falling back to
/// the current working directory.
pub fn allowed_dirs_or_cwd(raw: Option<&OsStr>) -> std::io::Result<AllowedDirectories> {
    match raw.and_then(parse_allowed_dirs) {
        Some(dirs) => Ok(dirs),
        None => AllowedDirectories::current_dir(),
    }
}
