//! MCP Server implementation for the Gemini tools.

use crate::config::Config;
use crate::logging::{apply_level, LogLevelHandle};
use crate::tools::{
    AnalyzeCodeRequest, GeminiTools, PromptRequest, ResearchRequest, SummarizeRequest,
    ToolRequest, ToolResult,
};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::service::RequestContext;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, RoleServer, ServiceExt};

const SERVER_INSTRUCTIONS: &str = "Gemini MCP Server - research, code analysis and summarization through Gemini CLI.

File parameters must point at regular files inside the server's allowed directories \
(GEMINI_MCP_ALLOWED_DIRS, default: the server's working directory).

Failed calls return an error result whose text is a JSON object with `success`, `text`, \
`error_kind` and `hint`.";

/// Shape a tool result as an MCP response.
///
/// Successes carry the plain Gemini output. Failures are error results holding
/// the serialized `ToolResult`, so clients see the error kind and hint.
pub fn to_call_result(result: ToolResult) -> CallToolResult {
    if result.success {
        return CallToolResult::success(vec![Content::text(result.text)]);
    }

    let json_str = serde_json::to_string(&result)
        .unwrap_or_else(|_| r#"{"success":false,"text":"Unknown error"}"#.to_string());
    CallToolResult::error(vec![Content::text(json_str)])
}

/// The Gemini MCP Server.
#[derive(Clone)]
pub struct GeminiServer {
    tool_router: ToolRouter<Self>,
    tools: GeminiTools,
    log_handle: Option<LogLevelHandle>,
}

#[tool_router]
impl GeminiServer {
    pub fn new(tools: GeminiTools) -> Self {
        Self {
            tool_router: Self::tool_router(),
            tools,
            log_handle: None,
        }
    }

    #[tool(
        name = "gemini_prompt",
        description = "Send a prompt to Gemini CLI and get a response. Optional `context` is prepended to the prompt."
    )]
    async fn gemini_prompt(
        &self,
        Parameters(input): Parameters<PromptRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.dispatch(ToolRequest::Prompt(input)).await)
    }

    #[tool(
        name = "gemini_research",
        description = "Use Gemini to research a topic with optional file context. Files must be inside the allowed directories."
    )]
    async fn gemini_research(
        &self,
        Parameters(input): Parameters<ResearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.dispatch(ToolRequest::Research(input)).await)
    }

    #[tool(
        name = "gemini_analyze_code",
        description = "Use Gemini to analyze code files. `analysis_type` is one of review, explain, optimize, security, test."
    )]
    async fn gemini_analyze_code(
        &self,
        Parameters(input): Parameters<AnalyzeCodeRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.dispatch(ToolRequest::AnalyzeCode(input)).await)
    }

    #[tool(
        name = "gemini_summarize",
        description = "Use Gemini to summarize content from files or text. Provide either `content` or `files`; `summary_type` is one of brief, detailed, bullet_points, executive."
    )]
    async fn gemini_summarize(
        &self,
        Parameters(input): Parameters<SummarizeRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.dispatch(ToolRequest::Summarize(input)).await)
    }
}

impl GeminiServer {
    /// Let clients change the log level through `logging/setLevel`.
    pub fn with_log_handle(mut self, handle: LogLevelHandle) -> Self {
        self.log_handle = Some(handle);
        self
    }

    async fn dispatch(&self, request: ToolRequest) -> CallToolResult {
        to_call_result(self.tools.call(request).await)
    }

    /// Every tool this server registers, as advertised to clients.
    pub fn tool_definitions(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }
}

#[tool_handler]
impl rmcp::ServerHandler for GeminiServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder()
                .enable_logging()
                .enable_tools()
                .build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }

    async fn set_level(
        &self,
        request: SetLevelRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<(), McpError> {
        tracing::info!("Client set log level to {:?}", request.level);
        match &self.log_handle {
            Some(handle) => apply_level(handle, request.level).map_err(|e| {
                McpError::internal_error(format!("Failed to set log level: {e}"), None)
            }),
            None => Ok(()),
        }
    }
}

/// Create and run the MCP server over stdio transport.
///
/// With a `log_handle`, `logging/setLevel` requests swap the active filter.
pub async fn run_server(
    config: Config,
    log_handle: Option<LogLevelHandle>,
) -> anyhow::Result<()> {
    tracing::info!("Starting Gemini MCP Server...");
    tracing::info!("Gemini CLI: {}", config.gemini_program.display());
    tracing::info!("Allowed directories: {:?}", config.allowed_dirs.roots());

    let mut server = GeminiServer::new(GeminiTools::new(&config));
    if let Some(handle) = log_handle {
        server = server.with_log_handle(handle);
    }
    let service = server.serve(rmcp::transport::stdio()).await?;

    tracing::info!("Gemini MCP Server is running");

    service.waiting().await?;

    tracing::info!("Gemini MCP Server shutting down");
    Ok(())
}
