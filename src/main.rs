//! Gemini tools MCP server CLI entry point.

use clap::{Parser, Subcommand};
use gemini_tools_mcp::config::{
    allowed_dirs_or_cwd, Config, ALLOWED_DIRS_ENV, DEFAULT_GEMINI_MODEL, DEFAULT_INLINE_LIMIT,
    DEFAULT_TIMEOUT_SECS,
};
use gemini_tools_mcp::diagnostics::{check_setup, smoke_test};
use gemini_tools_mcp::{GeminiCli, GeminiServer, GeminiTools};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// CLI calls made by `setup` and `test` give up after this long.
const DIAGNOSTIC_TIMEOUT_SECS: u64 = 10;

/// Gemini MCP Server - AI research assistant via Gemini CLI.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directories files may be read from, separated by the OS path separator
    #[arg(long, env = ALLOWED_DIRS_ENV, global = true)]
    allowed_dirs: Option<OsString>,

    /// Gemini CLI program name or path
    #[arg(long, env = "GEMINI_CLI_PATH", default_value = "gemini", global = true)]
    gemini_path: PathBuf,

    /// Model used when a tool call does not name one
    #[arg(long, env = "GEMINI_MCP_DEFAULT_MODEL", default_value = DEFAULT_GEMINI_MODEL, global = true)]
    model: String,

    /// File context above this many bytes is piped through a scratch file
    #[arg(long, env = "GEMINI_MCP_INLINE_LIMIT", default_value_t = DEFAULT_INLINE_LIMIT, global = true)]
    inline_limit: usize,

    /// Seconds to wait for the Gemini CLI (0 waits forever)
    #[arg(long, env = "GEMINI_MCP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    timeout_secs: u64,

    /// Directory for scratch files (default: system temp dir)
    #[arg(long, env = "GEMINI_MCP_SCRATCH_DIR", global = true)]
    scratch_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server on stdio (default)
    Serve,
    /// Check Gemini CLI setup and provide guidance
    Setup,
    /// Test Gemini CLI installation and basic functionality
    Test,
    /// List all available MCP tools
    ListTools,
}

impl Args {
    fn config(&self) -> anyhow::Result<Config> {
        let allowed_dirs = allowed_dirs_or_cwd(self.allowed_dirs.as_deref())?;
        let mut config = Config::new(allowed_dirs)
            .with_gemini_program(&self.gemini_path)
            .with_default_model(&self.model)
            .with_inline_limit(self.inline_limit)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(dir) = &self.scratch_dir {
            config = config.with_scratch_dir(dir);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing; stdout belongs to the MCP transport
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    let (filter, log_handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = args.config()?;

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => gemini_tools_mcp::run_server(config, Some(log_handle)).await,
        Commands::Setup => setup(config).await,
        Commands::Test => test_gemini(config).await,
        Commands::ListTools => {
            println!("Available Gemini MCP Tools\n");
            let server = GeminiServer::new(GeminiTools::new(&config));
            for tool in server.tool_definitions() {
                println!("{}", tool.name);
                println!("  {}\n", tool.description.as_deref().unwrap_or_default());
            }
            Ok(())
        }
    }
}

async fn setup(config: Config) -> anyhow::Result<()> {
    let config = config.with_timeout(Duration::from_secs(DIAGNOSTIC_TIMEOUT_SECS));
    let cli = GeminiCli::from_config(&config);

    println!("Gemini MCP Setup Check\n");
    let report = check_setup(&cli, &config.allowed_dirs).await;
    for (i, check) in report.checks.iter().enumerate() {
        let mark = if check.ok { "✓" } else { "✗" };
        println!("{}. {}", i + 1, check.name);
        println!("   {} {}\n", mark, check.detail);
    }

    if report.all_ok() {
        println!("Everything looks good! Run the server with: gemini-tools-mcp");
        Ok(())
    } else {
        anyhow::bail!("Some issues need to be resolved. Address the issues above and run setup again.")
    }
}

async fn test_gemini(config: Config) -> anyhow::Result<()> {
    let config = config.with_timeout(Duration::from_secs(DIAGNOSTIC_TIMEOUT_SECS));
    let tools = GeminiTools::new(&config);

    println!("Gemini CLI Test\n");
    let result = smoke_test(&tools).await;
    if result.success {
        println!("✓ Gemini CLI is working!\n");
        println!("Response: {}", result.text);
        return Ok(());
    }

    println!("✗ Gemini CLI test failed");
    println!("Error: {}", result.text);
    if let Some(hint) = result.hint {
        println!("\n{hint}");
    }
    anyhow::bail!("Gemini CLI test failed")
}
