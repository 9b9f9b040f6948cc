//! ESLint invocation and its JSON report format.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

/// Engine severity codes: 0 is off, 1 warning, 2 error.
pub const SEVERITY_WARNING: u8 = 1;
pub const SEVERITY_ERROR: u8 = 2;

fn default_position() -> u32 {
    1
}

/// One diagnostic from the engine's JSON report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintMessage {
    #[serde(default)]
    pub rule_id: Option<String>,
    pub severity: u8,
    pub message: String,
    // file-scope diagnostics (e.g. parse failures) may omit positions
    #[serde(default = "default_position")]
    pub line: u32,
    #[serde(default)]
    pub end_line: Option<u32>,
    #[serde(default = "default_position")]
    pub column: u32,
    #[serde(default)]
    pub end_column: Option<u32>,
}

/// Per-file record of the engine's JSON report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    /// Absolute path on the engine side.
    pub file_path: String,
    pub messages: Vec<LintMessage>,
    #[serde(default)]
    pub error_count: u32,
    #[serde(default)]
    pub warning_count: u32,
}

/// Aggregated lint results for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintReport {
    pub files: Vec<FileReport>,
    pub error_count: u32,
    pub warning_count: u32,
}

impl LintReport {
    #[must_use]
    pub fn from_files(files: Vec<FileReport>) -> Self {
        let error_count = files.iter().map(|f| f.error_count).sum();
        let warning_count = files.iter().map(|f| f.warning_count).sum();
        Self {
            files,
            error_count,
            warning_count,
        }
    }
}

/// The lint engine seam.
#[async_trait]
pub trait LintRunner: Send + Sync {
    /// Lint the given targets and return the aggregated report.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine cannot be invoked or its report
    /// cannot be parsed; lint findings themselves are not errors.
    async fn run(&self, targets: &[String]) -> Result<LintReport>;
}

/// Runs the project-local ESLint via npx with the JSON formatter.
pub struct EslintRunner {
    workspace: PathBuf,
    extensions: Vec<String>,
}

impl EslintRunner {
    #[must_use]
    pub fn new(workspace: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            workspace: workspace.into(),
            extensions,
        }
    }
}

#[async_trait]
impl LintRunner for EslintRunner {
    async fn run(&self, targets: &[String]) -> Result<LintReport> {
        if targets.is_empty() {
            debug!("No lint targets after filtering, skipping engine invocation");
            return Ok(LintReport::default());
        }

        debug!(targets = targets.len(), "Invoking eslint");

        let output = Command::new("npx")
            .arg("--no-install")
            .arg("eslint")
            .arg("--format")
            .arg("json")
            .arg("--ext")
            .arg(self.extensions.join(","))
            .args(targets)
            .current_dir(&self.workspace)
            .output()
            .await
            .context("Failed to launch eslint")?;

        // exit code 1 means findings were reported; anything above is an
        // invocation failure
        match output.status.code() {
            Some(0 | 1) => {}
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                bail!("eslint failed: {}", stderr.trim());
            }
        }

        let files: Vec<FileReport> = serde_json::from_slice(&output.stdout)
            .context("Failed to parse eslint JSON report")?;

        Ok(LintReport::from_files(files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "filePath": "/home/runner/work/repo/repo/src/a.ts",
            "messages": [
                {
                    "ruleId": "no-unused-vars",
                    "severity": 2,
                    "message": "'x' is defined but never used.",
                    "line": 3,
                    "column": 7,
                    "endLine": 3,
                    "endColumn": 8
                },
                {
                    "ruleId": "no-console",
                    "severity": 1,
                    "message": "Unexpected console statement.",
                    "line": 10,
                    "column": 1
                }
            ],
            "errorCount": 1,
            "warningCount": 1
        },
        {
            "filePath": "/home/runner/work/repo/repo/src/b.ts",
            "messages": [],
            "errorCount": 0,
            "warningCount": 0
        }
    ]"#;

    #[test]
    fn parses_engine_report() {
        let files: Vec<FileReport> = serde_json::from_str(SAMPLE).unwrap();
        let report = LintReport::from_files(files);

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.warning_count, 1);

        let first = &report.files[0].messages[0];
        assert_eq!(first.rule_id.as_deref(), Some("no-unused-vars"));
        assert_eq!(first.severity, SEVERITY_ERROR);
        assert_eq!(first.end_line, Some(3));

        let second = &report.files[0].messages[1];
        assert_eq!(second.severity, SEVERITY_WARNING);
        assert_eq!(second.end_line, None);
        assert_eq!(second.end_column, None);
    }

    #[test]
    fn message_without_position_defaults_to_line_one() {
        let raw = r#"{
            "ruleId": null,
            "severity": 2,
            "message": "Parsing error: unexpected token"
        }"#;
        let message: LintMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(message.line, 1);
        assert_eq!(message.column, 1);
        assert!(message.rule_id.is_none());
    }

    #[tokio::test]
    async fn empty_target_list_skips_the_engine() {
        let runner = EslintRunner::new("/nonexistent", vec![".ts".to_string()]);
        let report = runner.run(&[]).await.unwrap();
        assert_eq!(report, LintReport::default());
    }
}
