//! Installation checks behind the `setup` and `test` commands.

use crate::error::GeminiError;
use crate::gemini::GeminiCli;
use crate::sandbox::AllowedDirectories;
use crate::tools::{GeminiTools, PromptRequest, ToolRequest, ToolResult};

pub const SMOKE_TEST_PROMPT: &str = "Say 'Hello from Gemini MCP!'";

#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub ok: bool,
    pub detail: String,
}

impl CheckOutcome {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            ok: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            ok: false,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SetupReport {
    pub checks: Vec<CheckOutcome>,
}

impl SetupReport {
    pub fn all_ok(&self) -> bool {
        self.checks.iter().all(|c| c.ok)
    }
}

/// Check that the Gemini CLI is installed, runs, and is authenticated.
///
/// Version and authentication checks are skipped when the binary is missing.
pub async fn check_setup(cli: &GeminiCli, allowed_dirs: &AllowedDirectories) -> SetupReport {
    let mut report = SetupReport::default();

    match cli.find_executable() {
        Ok(path) => {
            report
                .checks
                .push(CheckOutcome::pass("Gemini CLI installation", format!("Found at: {}", path.display())));

            let version = match cli.run_args(&["--version".to_string()]).await {
                Ok(version) => CheckOutcome::pass("Gemini CLI version", version),
                Err(e) => CheckOutcome::fail("Gemini CLI version", format!("Could not get version: {e}")),
            };
            report.checks.push(version);

            let hello = ["-p".to_string(), "Hello".to_string()];
            let auth = match cli.run_args(&hello).await {
                Ok(_) => CheckOutcome::pass("Authentication", "Authentication working"),
                Err(e @ GeminiError::AuthenticationRequired(_)) => {
                    CheckOutcome::fail("Authentication", format!("Not authenticated. {}", e.hint()))
                }
                Err(e) => CheckOutcome::fail("Authentication", e.to_string()),
            };
            report.checks.push(auth);
        }
        Err(e) => {
            report.checks.push(CheckOutcome::fail(
                "Gemini CLI installation",
                format!("{e}. {}", e.hint()),
            ));
        }
    }

    let roots: Vec<String> = allowed_dirs
        .roots()
        .iter()
        .map(|r| r.display().to_string())
        .collect();
    report.checks.push(CheckOutcome::pass(
        "Allowed directories",
        roots.join(", "),
    ));

    report
}

/// Send one fixed prompt through the normal tool path.
pub async fn smoke_test(tools: &GeminiTools) -> ToolResult {
    tools
        .call(ToolRequest::Prompt(PromptRequest {
            prompt: SMOKE_TEST_PROMPT.to_string(),
            context: None,
            model: None,
        }))
        .await
}
