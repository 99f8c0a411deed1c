//! Typed tool requests and the dispatcher that turns them into Gemini calls.

use crate::config::Config;
use crate::error::{ErrorKind, GeminiError, Result};
use crate::gemini::{GeminiCli, Invocation};
use crate::sandbox::{AllowedDirectories, PathRequirement};
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Input parameters for the gemini_prompt tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(
    description = "Parameters for sending a prompt to Gemini",
    extend("required" = ["prompt"])
)]
pub struct PromptRequest {
    #[schemars(description = "The prompt to send to Gemini")]
    #[serde(default)]
    pub prompt: String,

    #[schemars(description = "Additional context to prepend to the prompt")]
    #[serde(default)]
    pub context: Option<String>,

    #[schemars(description = "The model to use (default: gemini-2.5-pro)")]
    #[serde(default)]
    pub model: Option<String>,
}

/// Input parameters for the gemini_research tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(
    description = "Parameters for researching a topic with Gemini",
    extend("required" = ["topic"])
)]
pub struct ResearchRequest {
    #[schemars(description = "The research topic or question")]
    #[serde(default)]
    pub topic: String,

    #[schemars(description = "List of file paths to include as context")]
    #[serde(default)]
    pub files: Vec<String>,

    #[schemars(description = "The model to use (default: gemini-2.5-pro)")]
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    Review,
    Explain,
    Optimize,
    Security,
    Test,
    /// Any value not listed above.
    #[serde(other)]
    Other,
}

impl AnalysisType {
    fn instruction(self) -> &'static str {
        match self {
            AnalysisType::Review => {
                "Please review this code and identify potential issues, bugs, or areas for improvement."
            }
            AnalysisType::Explain => {
                "Please explain what this code does in detail, including its purpose and how it works."
            }
            AnalysisType::Optimize => {
                "Please suggest optimizations for this code to improve performance, readability, or maintainability."
            }
            AnalysisType::Security => {
                "Please analyze this code for security vulnerabilities and suggest fixes."
            }
            AnalysisType::Test => "Please suggest test cases and testing strategies for this code.",
            AnalysisType::Other => "Please analyze this code.",
        }
    }
}

/// Input parameters for the gemini_analyze_code tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(
    description = "Parameters for analyzing code files with Gemini",
    extend("required" = ["files", "analysis_type"])
)]
pub struct AnalyzeCodeRequest {
    #[schemars(description = "List of code files to analyze")]
    #[serde(default)]
    pub files: Vec<String>,

    #[schemars(description = "Type of analysis to perform")]
    #[serde(default)]
    pub analysis_type: Option<AnalysisType>,

    #[schemars(description = "Specific question about the code")]
    #[serde(default)]
    pub specific_question: Option<String>,

    #[schemars(description = "The model to use (default: gemini-2.5-pro)")]
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SummaryType {
    #[default]
    Brief,
    Detailed,
    BulletPoints,
    Executive,
    /// Any value not listed above; summarized like `brief`.
    #[serde(other)]
    Other,
}

impl SummaryType {
    fn instruction(self) -> &'static str {
        match self {
            SummaryType::Brief | SummaryType::Other => {
                "Please provide a brief summary of the following content in 2-3 sentences."
            }
            SummaryType::Detailed => {
                "Please provide a detailed summary of the following content, covering all main points."
            }
            SummaryType::BulletPoints => "Please summarize the following content as bullet points.",
            SummaryType::Executive => {
                "Please provide an executive summary of the following content suitable for decision makers."
            }
        }
    }
}

/// Input parameters for the gemini_summarize tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Parameters for summarizing text or files with Gemini")]
pub struct SummarizeRequest {
    #[schemars(description = "Text content to summarize")]
    #[serde(default)]
    pub content: Option<String>,

    #[schemars(description = "Files to summarize (alternative to content)")]
    #[serde(default)]
    pub files: Vec<String>,

    #[schemars(description = "Type of summary (default: brief)")]
    #[serde(default)]
    pub summary_type: SummaryType,

    #[schemars(description = "The model to use (default: gemini-2.5-pro)")]
    #[serde(default)]
    pub model: Option<String>,
}

/// A single tool call.
#[derive(Debug, Clone)]
pub enum ToolRequest {
    Prompt(PromptRequest),
    Research(ResearchRequest),
    AnalyzeCode(AnalyzeCodeRequest),
    Summarize(SummarizeRequest),
}

impl ToolRequest {
    pub fn tool_name(&self) -> &'static str {
        match self {
            ToolRequest::Prompt(_) => "gemini_prompt",
            ToolRequest::Research(_) => "gemini_research",
            ToolRequest::AnalyzeCode(_) => "gemini_analyze_code",
            ToolRequest::Summarize(_) => "gemini_summarize",
        }
    }
}

/// Outcome of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ToolResult {
    pub fn success(text: String) -> Self {
        Self {
            success: true,
            text,
            error_kind: None,
            hint: None,
        }
    }

    pub fn failure(error: &GeminiError) -> Self {
        Self {
            success: false,
            text: error.to_string(),
            error_kind: Some(error.kind()),
            hint: Some(error.hint().to_string()),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn research_prompt(topic: &str) -> String {
    format!(
        "Please research the following topic and provide a comprehensive analysis:

Topic: {topic}

Please include:
1. Overview and background
2. Key findings and insights
3. Relevant details and examples
4. Conclusions and recommendations

Be thorough but concise."
    )
}

/// Turns tool requests into sandboxed Gemini CLI invocations.
#[derive(Debug, Clone)]
pub struct GeminiTools {
    allowed_dirs: Arc<AllowedDirectories>,
    cli: GeminiCli,
    default_model: String,
}

impl GeminiTools {
    pub fn new(config: &Config) -> Self {
        Self {
            allowed_dirs: Arc::clone(&config.allowed_dirs),
            cli: GeminiCli::from_config(config),
            default_model: config.default_model.clone(),
        }
    }

    /// Execute a tool call. Every failure is folded into the returned result.
    pub async fn call(&self, request: ToolRequest) -> ToolResult {
        let span = tracing::info_span!(
            "tool_call",
            tool = request.tool_name(),
            call_id = %Uuid::new_v4()
        );

        async move {
            let outcome = match self.plan(&request) {
                Ok(invocation) => self.cli.run(&invocation).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(text) => {
                    tracing::info!("Tool call succeeded ({} bytes)", text.len());
                    ToolResult::success(text)
                }
                Err(e) => {
                    tracing::warn!(kind = ?e.kind(), "Tool call failed: {}", e);
                    ToolResult::failure(&e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Validate a request and build the invocation it maps to.
    ///
    /// File paths are checked against the sandbox here, so a rejected path
    /// fails the call before any file is read or process spawned.
    pub fn plan(&self, request: &ToolRequest) -> Result<Invocation> {
        match request {
            ToolRequest::Prompt(req) => {
                let prompt = non_blank(Some(req.prompt.as_str()))
                    .ok_or_else(|| GeminiError::MissingParameter("prompt".to_string()))?;
                let prompt = match non_blank(req.context.as_deref()) {
                    Some(context) => format!("{context}\n\n{prompt}"),
                    None => prompt.to_string(),
                };
                Ok(self.invocation(prompt, req.model.as_deref(), Vec::new()))
            }
            ToolRequest::Research(req) => {
                let topic = non_blank(Some(req.topic.as_str()))
                    .ok_or_else(|| GeminiError::MissingParameter("topic".to_string()))?;
                let files = self.resolve_files(&req.files)?;
                Ok(self.invocation(research_prompt(topic), req.model.as_deref(), files))
            }
            ToolRequest::AnalyzeCode(req) => {
                if req.files.is_empty() {
                    return Err(GeminiError::MissingParameter("files".to_string()));
                }
                let analysis_type = req
                    .analysis_type
                    .ok_or_else(|| GeminiError::MissingParameter("analysis_type".to_string()))?;
                let files = self.resolve_files(&req.files)?;
                let base = analysis_type.instruction();
                let prompt = match non_blank(req.specific_question.as_deref()) {
                    Some(question) => format!("{base}\n\nSpecific question: {question}"),
                    None => base.to_string(),
                };
                Ok(self.invocation(prompt, req.model.as_deref(), files))
            }
            ToolRequest::Summarize(req) => {
                let instruction = req.summary_type.instruction();
                if let Some(content) = non_blank(req.content.as_deref()) {
                    let prompt = format!("{instruction}\n\nContent:\n{content}");
                    return Ok(self.invocation(prompt, req.model.as_deref(), Vec::new()));
                }
                if req.files.is_empty() {
                    return Err(GeminiError::MissingParameter(
                        "content or files (either content or files must be provided for summarization)"
                            .to_string(),
                    ));
                }
                let files = self.resolve_files(&req.files)?;
                Ok(self.invocation(instruction.to_string(), req.model.as_deref(), files))
            }
        }
    }

    fn resolve_files(&self, files: &[String]) -> Result<Vec<PathBuf>> {
        files
            .iter()
            .map(|file| self.allowed_dirs.validate(file, PathRequirement::File))
            .collect()
    }

    fn invocation(&self, prompt: String, model: Option<&str>, files: Vec<PathBuf>) -> Invocation {
        let model = non_blank(model).unwrap_or(self.default_model.as_str()).to_string();
        Invocation {
            prompt,
            model,
            files,
        }
    }
}
