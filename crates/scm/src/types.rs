//! Wire types shared with the GitHub checks and commits APIs.

use serde::{Deserialize, Serialize};

/// A file touched by a commit, as reported by the commits API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileChange {
    /// Path relative to the repository root.
    #[serde(rename = "filename")]
    pub path: String,
    pub status: FileStatus,
}

/// Per-file change status in the commits API vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    Renamed,
    Copied,
    Changed,
    Unchanged,
}

impl FileStatus {
    /// Whether a file with this status carries content worth linting.
    ///
    /// Removed files no longer exist, unchanged files were already linted
    /// on an earlier commit, and a rename without edits has no new content.
    #[must_use]
    pub fn is_lintable(self) -> bool {
        matches!(
            self,
            FileStatus::Added | FileStatus::Modified | FileStatus::Copied | FileStatus::Changed
        )
    }
}

/// Changed-file paths of a pull request plus its latest commit oid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestFiles {
    pub paths: Vec<String>,
    /// Head commit the check run should report against.
    pub head_oid: String,
}

/// Identity of an existing check run, used for reuse-by-name lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckRunSummary {
    pub id: u64,
    pub name: String,
}

/// Final verdict attached to a completed check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Conclusion {
    Success,
    Failure,
}

impl Conclusion {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Conclusion::Success => "success",
            Conclusion::Failure => "failure",
        }
    }

    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, Conclusion::Failure)
    }
}

/// Severity of a single check-run annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationLevel {
    Notice,
    Warning,
    Failure,
}

/// One inline annotation attached to a check-run update.
///
/// Lines and columns are 1-based. The checks API rejects column fields on
/// annotations spanning more than one line, so they stay optional here and
/// are omitted from the payload when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckAnnotation {
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_column: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,
    pub annotation_level: AnnotationLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub message: String,
}
