//! Common test utilities for proftrack integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't touch the
//! user's `~/.local/share/proftrack/` or `~/.config/proftrack/`.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// Shared secret used by `TestEnv::init`.
pub const SECRET: &str = "correct horse";

/// A test environment with isolated data and config directories.
///
/// The `pt()` method returns a `Command` that sets `PT_DATA_DIR` and
/// `PT_CONFIG_DIR` per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub data_dir: TempDir,
    pub config_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment with a database and shared secret.
    pub fn init() -> Self {
        let env = Self::new();
        env.pt()
            .args(["system", "init", "--secret", SECRET])
            .assert()
            .success();
        env
    }

    /// Initialized, logged in, with admin mode on.
    pub fn admin() -> Self {
        let env = Self::init();
        env.pt().args(["login", SECRET]).assert().success();
        env.pt().arg("admin").assert().success();
        env
    }

    /// Get a Command for the pt binary with isolated directories.
    pub fn pt(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_pt"));
        cmd.env("PT_DATA_DIR", self.data_dir.path());
        cmd.env("PT_CONFIG_DIR", self.config_dir.path());
        cmd.env_remove("PT_SHARED_SECRET");
        cmd.env_remove("PT_API_KEY");
        cmd.env_remove("PT_BACKEND");
        cmd.env_remove("PT_LOG");
        cmd
    }

    /// Run a command expected to succeed and parse its JSON output.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.pt().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "pt {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    /// Add a professor and return its id.
    pub fn add_professor(&self, name: &str, institution: &str, extra: &[&str]) -> String {
        let mut args = vec!["professor", "add", name, institution];
        args.extend_from_slice(extra);
        let value = self.json(&args);
        value["id"].as_str().unwrap().to_string()
    }

    pub fn data_path(&self) -> &std::path::Path {
        self.data_dir.path()
    }

    pub fn config_path(&self) -> &std::path::Path {
        self.config_dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
