//! Gemini CLI execution module.

use crate::config::Config;
use crate::error::{GeminiError, Result};
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tokio::time::timeout;

/// Lowercase stderr phrases that indicate missing or expired credentials.
const AUTH_PHRASES: &[&str] = &["not authenticated", "login required", "credentials"];

const SCRATCH_PREFIX: &str = "gemini-context-";

/// One fully planned call to the Gemini CLI.
///
/// `files` must already have passed the sandbox check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub prompt: String,
    pub model: String,
    pub files: Vec<PathBuf>,
}

/// Runs the Gemini CLI as a child process.
#[derive(Debug, Clone)]
pub struct GeminiCli {
    program: PathBuf,
    inline_limit: usize,
    timeout: Option<Duration>,
    scratch_dir: Option<PathBuf>,
}

/// Build the argument vector for a prompt. Never passed through a shell.
pub fn build_args(model: &str, prompt: &str) -> Vec<String> {
    vec![
        "-m".to_string(),
        model.to_string(),
        "-p".to_string(),
        prompt.to_string(),
    ]
}

/// Read the given files and render them as one context block.
pub async fn load_context(files: &[PathBuf]) -> Result<String> {
    let mut context = String::new();
    for path in files {
        let bytes = tokio::fs::read(path).await?;
        context.push_str(&format!("--- {} ---\n", path.display()));
        context.push_str(&String::from_utf8_lossy(&bytes));
        if !context.ends_with('\n') {
            context.push('\n');
        }
    }
    Ok(context)
}

/// Check whether stderr looks like an authentication failure.
///
/// Besides the fixed phrases, matches the word `auth` and words starting with
/// `authenticat`, so "author" or "OAuth" alone do not count.
pub fn is_auth_failure(stderr: &str) -> bool {
    let lowered = stderr.to_lowercase();
    if AUTH_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
        return true;
    }

    lowered
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == "auth" || word.starts_with("authenticat"))
}

/// Map a finished process to its result text or a classified error.
pub fn interpret_output(output: &Output) -> Result<String> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    if output.status.success() {
        return Ok(stdout.trim().to_string());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(classify_failure(output.status.code(), stdout.trim(), stderr.trim()))
}

fn classify_failure(code: Option<i32>, stdout: &str, stderr: &str) -> GeminiError {
    if is_auth_failure(stderr) {
        return GeminiError::AuthenticationRequired(stderr.to_string());
    }

    let message = if stderr.is_empty() { stdout } else { stderr };
    GeminiError::CliFailure {
        code,
        message: message.to_string(),
    }
}

impl GeminiCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            inline_limit: crate::config::DEFAULT_INLINE_LIMIT,
            timeout: None,
            scratch_dir: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.gemini_program.clone(),
            inline_limit: config.inline_limit,
            timeout: config.timeout,
            scratch_dir: config.scratch_dir.clone(),
        }
    }

    /// Find the gemini executable path.
    pub fn find_executable(&self) -> Result<PathBuf> {
        which::which(&self.program)
            .map_err(|_| GeminiError::GeminiNotFound(self.program.to_string_lossy().to_string()))
    }

    /// Run a planned invocation and return the CLI's trimmed stdout.
    ///
    /// Context up to the inline limit is appended to the prompt. Anything
    /// larger goes through a scratch file piped to the CLI's stdin, which is
    /// removed when this function returns, whatever the outcome.
    pub async fn run(&self, invocation: &Invocation) -> Result<String> {
        let context = load_context(&invocation.files).await?;

        let mut prompt = invocation.prompt.clone();
        let scratch = if context.is_empty() {
            None
        } else if context.len() <= self.inline_limit {
            prompt.push_str("\n\n");
            prompt.push_str(&context);
            None
        } else {
            Some(self.write_scratch(&context).await?)
        };

        let args = build_args(&invocation.model, &prompt);
        tracing::debug!(
            model = %invocation.model,
            files = invocation.files.len(),
            prompt_len = prompt.len(),
            scratch = scratch.is_some(),
            "Invoking gemini"
        );

        self.execute(&args, scratch.as_ref()).await
    }

    /// Run the CLI with raw arguments, for diagnostics.
    pub async fn run_args(&self, args: &[String]) -> Result<String> {
        self.execute(args, None).await
    }

    async fn write_scratch(&self, context: &str) -> Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX).suffix(".txt");
        let scratch = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        tokio::fs::write(scratch.path(), context).await?;
        tracing::debug!(
            "Wrote {} bytes of file context to {}",
            context.len(),
            scratch.path().display()
        );
        Ok(scratch)
    }

    async fn execute(&self, args: &[String], stdin: Option<&NamedTempFile>) -> Result<String> {
        let gemini_path = self.find_executable()?;

        let stdin = match stdin {
            Some(scratch) => Stdio::from(scratch.reopen()?),
            None => Stdio::null(),
        };

        // Piped stdout and stderr are drained together by wait_with_output,
        // so a full stderr buffer cannot stall the child.
        let child = Command::new(&gemini_path)
            .args(args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    GeminiError::GeminiNotFound(gemini_path.to_string_lossy().to_string())
                }
                _ => GeminiError::Io(e),
            })?;

        let output = match self.timeout {
            Some(limit) => timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| GeminiError::ProcessTimeout(limit))??,
            None => child.wait_with_output().await?,
        };

        interpret_output(&output).inspect_err(|e| {
            tracing::warn!("Gemini CLI exited with {}: {}", output.status, e);
        })
    }
}
