#![cfg(unix)]

mod common;

use common::Fixture;
use gemini_tools_mcp::tools::{
    AnalysisType, AnalyzeCodeRequest, PromptRequest, ResearchRequest, SummarizeRequest,
    SummaryType,
};
use gemini_tools_mcp::{ErrorKind, GeminiTools, ToolRequest, DEFAULT_GEMINI_MODEL};
use std::time::Duration;

/// Prints each argument on its own line.
const ECHO_ARGS: &str = r#"printf '%s\n' "$@""#;

/// Prints whatever arrives on stdin.
const ECHO_STDIN: &str = "cat";

fn prompt(text: &str) -> ToolRequest {
    ToolRequest::Prompt(PromptRequest {
        prompt: text.to_string(),
        context: None,
        model: None,
    })
}

fn summarize_files(files: Vec<String>) -> ToolRequest {
    ToolRequest::Summarize(SummarizeRequest {
        content: None,
        files,
        summary_type: SummaryType::Detailed,
        model: None,
    })
}

#[tokio::test]
async fn test_success_returns_stdout() {
    let fixture = Fixture::new("printf 'X'");
    let result = fixture.tools().call(prompt("anything")).await;
    assert!(result.success, "{result:?}");
    assert_eq!(result.text, "X");
    assert_eq!(result.error_kind, None);
}

#[tokio::test]
async fn test_argument_vector() {
    let fixture = Fixture::new(ECHO_ARGS);
    let result = fixture.tools().call(prompt("What is Python?")).await;
    assert!(result.success, "{result:?}");
    assert_eq!(
        result.text,
        format!("-m\n{DEFAULT_GEMINI_MODEL}\n-p\nWhat is Python?")
    );
}

#[tokio::test]
async fn test_prompt_text_is_not_shell_interpreted() {
    let fixture = Fixture::new(ECHO_ARGS);
    let marker = fixture.workspace.path().join("pwned");
    let text = format!("hello; touch {} $(touch {})", marker.display(), marker.display());
    let result = fixture.tools().call(prompt(&text)).await;
    assert!(result.success);
    assert!(result.text.ends_with(&text));
    assert!(!marker.exists());
}

#[tokio::test]
async fn test_auth_failure_maps_to_authentication_required() {
    let fixture = Fixture::new("echo 'Error: not authenticated' >&2\nexit 1");
    let result = fixture.tools().call(prompt("hello")).await;
    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::AuthenticationRequired));
    assert!(result.text.contains("not authenticated"));
    assert!(result.hint.unwrap().contains("gemini auth login"));
}

#[tokio::test]
async fn test_nonzero_exit_maps_to_external_tool_failure() {
    let fixture = Fixture::new("echo 'Error: Invalid prompt' >&2\nexit 3");
    let result = fixture.tools().call(prompt("Bad prompt")).await;
    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::ExternalToolFailure));
    assert!(result.text.contains("Error: Invalid prompt"));
    assert!(result.text.contains("3"));
}

#[tokio::test]
async fn test_missing_binary_maps_to_binary_not_found() {
    let fixture = Fixture::new(ECHO_ARGS);
    std::fs::remove_file(&fixture.program).unwrap();
    let result = fixture.tools().call(prompt("hello")).await;
    assert_eq!(result.error_kind, Some(ErrorKind::BinaryNotFound));
    assert!(result.hint.unwrap().contains("PATH"));
}

#[tokio::test]
async fn test_small_file_context_is_inlined() {
    let fixture = Fixture::new(ECHO_ARGS);
    let result = fixture
        .tools()
        .call(ToolRequest::AnalyzeCode(AnalyzeCodeRequest {
            files: vec![fixture.file("test2.py")],
            analysis_type: Some(AnalysisType::Review),
            specific_question: None,
            model: Some("gemini-2.5-flash".to_string()),
        }))
        .await;
    assert!(result.success, "{result:?}");
    assert!(result.text.starts_with("-m\ngemini-2.5-flash\n-p\nPlease review this code"));
    assert!(result.text.contains("test2.py ---\nprint('Hello, World!')"));
    assert_eq!(fixture.scratch_entries(), 0);
}

#[tokio::test]
async fn test_large_file_context_goes_through_scratch_file() {
    let fixture = Fixture::new(&format!("{ECHO_ARGS}\necho '== stdin =='\n{ECHO_STDIN}"));
    let big = "lorem ipsum ".repeat(64);
    let path = fixture.write_file("big.txt", &big);
    let tools = GeminiTools::new(&fixture.config().with_inline_limit(64));

    let result = tools.call(summarize_files(vec![path])).await;

    assert!(result.success, "{result:?}");
    let (args, stdin) = result.text.split_once("== stdin ==").unwrap();
    assert!(!args.contains("lorem ipsum"));
    assert!(stdin.contains("big.txt ---"));
    assert!(stdin.contains(big.trim()));
    assert_eq!(fixture.scratch_entries(), 0);
}

#[tokio::test]
async fn test_scratch_file_removed_after_cli_failure() {
    let fixture = Fixture::new("cat > /dev/null\necho 'boom' >&2\nexit 1");
    let path = fixture.write_file("big.txt", &"x".repeat(1024));
    let tools = GeminiTools::new(&fixture.config().with_inline_limit(16));

    let result = tools.call(summarize_files(vec![path])).await;

    assert_eq!(result.error_kind, Some(ErrorKind::ExternalToolFailure));
    assert_eq!(fixture.scratch_entries(), 0);
}

#[tokio::test]
async fn test_scratch_file_removed_after_timeout() {
    let fixture = Fixture::new("exec sleep 5");
    let path = fixture.write_file("big.txt", &"x".repeat(1024));
    let config = fixture
        .config()
        .with_inline_limit(16)
        .with_timeout(Duration::from_millis(200));
    let tools = GeminiTools::new(&config);

    let result = tools.call(summarize_files(vec![path])).await;

    assert_eq!(result.error_kind, Some(ErrorKind::Timeout));
    assert_eq!(fixture.scratch_entries(), 0);
}

#[tokio::test]
async fn test_rejected_path_spawns_nothing() {
    let fixture = Fixture::new("touch \"$(dirname \"$0\")/spawned\"");
    let escape = format!("{}/../../etc/passwd", fixture.workspace.path().display());

    let result = fixture
        .tools()
        .call(ToolRequest::Research(ResearchRequest {
            topic: "secrets".to_string(),
            files: vec![fixture.file("test1.txt"), escape],
            model: None,
        }))
        .await;

    assert_eq!(result.error_kind, Some(ErrorKind::PathOutsideSandbox));
    assert!(result.hint.unwrap().contains("allowed directory"));
    assert!(!fixture.bin.path().join("spawned").exists());
    assert_eq!(fixture.scratch_entries(), 0);
}

#[tokio::test]
async fn test_missing_file_inside_sandbox() {
    let fixture = Fixture::new(ECHO_ARGS);
    let result = fixture
        .tools()
        .call(summarize_files(vec![fixture.file("nope.txt")]))
        .await;
    assert_eq!(result.error_kind, Some(ErrorKind::PathNotFound));
}

#[tokio::test]
async fn test_summarize_without_content_or_files() {
    let fixture = Fixture::new(ECHO_ARGS);
    let result = fixture
        .tools()
        .call(ToolRequest::Summarize(SummarizeRequest::default()))
        .await;
    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::MissingParameter));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_calls_do_not_interfere() {
    let fixture = Fixture::new(&format!("sleep 0.2\n{ECHO_ARGS}"));
    let first = fixture.write_file("first.txt", "alpha contents");
    let second = fixture.write_file("second.txt", "beta contents");
    let tools = fixture.tools();

    let (a, b) = tokio::join!(
        tools.call(summarize_files(vec![first])),
        tools.call(summarize_files(vec![second])),
    );

    assert!(a.success && b.success, "{a:?} {b:?}");
    assert!(a.text.contains("alpha contents") && !a.text.contains("beta contents"));
    assert!(b.text.contains("beta contents") && !b.text.contains("alpha contents"));
}
