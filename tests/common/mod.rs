//! Shared fixtures: a stub Gemini executable and a sandboxed workspace.

#![allow(dead_code)]

use gemini_tools_mcp::{AllowedDirectories, Config, GeminiTools};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

pub struct Fixture {
    pub workspace: TempDir,
    pub scratch: TempDir,
    pub bin: TempDir,
    pub program: PathBuf,
}

impl Fixture {
    /// Create a fixture whose Gemini CLI is a shell script with `body`.
    pub fn new(body: &str) -> Self {
        let workspace = TempDir::new().unwrap();
        fs::write(workspace.path().join("test1.txt"), "Test content 1").unwrap();
        fs::write(workspace.path().join("test2.py"), "print('Hello, World!')").unwrap();

        let bin = TempDir::new().unwrap();
        let program = bin.path().join("gemini");
        fs::write(&program, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();

        Self {
            workspace,
            scratch: TempDir::new().unwrap(),
            bin,
            program,
        }
    }

    pub fn config(&self) -> Config {
        Config::new(AllowedDirectories::new([self.workspace.path()]))
            .with_gemini_program(&self.program)
            .with_scratch_dir(self.scratch.path())
            .with_timeout(Duration::from_secs(30))
    }

    pub fn tools(&self) -> GeminiTools {
        GeminiTools::new(&self.config())
    }

    pub fn file(&self, name: &str) -> String {
        self.workspace.path().join(name).to_string_lossy().to_string()
    }

    pub fn write_file(&self, name: &str, content: &str) -> String {
        fs::write(self.workspace.path().join(name), content).unwrap();
        self.file(name)
    }

    pub fn scratch_entries(&self) -> usize {
        count_entries(self.scratch.path())
    }
}

pub fn count_entries(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}
