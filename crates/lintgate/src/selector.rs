//! Resolves which files to lint from the trigger context.

use scm::{FileChange, GithubClient};
use tracing::{debug, warn};

use crate::config::{ActionConfig, TriggerContext};

/// What the engine should be pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSelection {
    /// Lint the configured default target.
    Workspace,
    /// Lint exactly these paths, in order.
    Paths(Vec<String>),
}

/// Resolved lint targets plus the commit the check run reports against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub files: FileSelection,
    pub head_sha: String,
}

/// Resolve the file selection for this run.
///
/// An explicit glob wins over lint-all, which wins over the trigger diff.
/// A failed host query never aborts the run: selection falls back to the
/// whole workspace, anchored at the raw trigger sha.
pub async fn select_files(client: &GithubClient, config: &ActionConfig) -> Selection {
    if let Some(glob) = &config.custom_glob {
        return Selection {
            files: FileSelection::Paths(split_glob(glob)),
            head_sha: config.sha.clone(),
        };
    }

    if config.lint_all {
        return Selection {
            files: FileSelection::Workspace,
            head_sha: config.sha.clone(),
        };
    }

    match &config.trigger {
        TriggerContext::PullRequest { number } => {
            match client.pull_request_files(*number).await {
                Ok(pr) => {
                    let paths = filter_paths(pr.paths, &config.extensions);
                    debug!(number, files = paths.len(), "Selected pull request files");
                    Selection {
                        files: FileSelection::Paths(paths),
                        head_sha: pr.head_oid,
                    }
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        number,
                        "Failed to query pull request files, linting the whole workspace"
                    );
                    Selection {
                        files: FileSelection::Workspace,
                        head_sha: config.sha.clone(),
                    }
                }
            }
        }
        TriggerContext::Push { sha } => match client.commit_files(sha).await {
            Ok(changes) => {
                let paths = filter_changes(changes, &config.extensions);
                debug!(sha, files = paths.len(), "Selected push commit files");
                Selection {
                    files: FileSelection::Paths(paths),
                    head_sha: sha.clone(),
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    sha,
                    "Failed to query commit files, linting the whole workspace"
                );
                Selection {
                    files: FileSelection::Workspace,
                    head_sha: sha.clone(),
                }
            }
        },
    }
}

/// Split an explicit glob input on commas, entries used verbatim.
#[must_use]
pub fn split_glob(glob: &str) -> Vec<String> {
    glob.split(',')
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keep paths with a lintable extension, skipping generated declarations.
///
/// Order-preserving and idempotent.
#[must_use]
pub fn filter_paths(paths: Vec<String>, extensions: &[String]) -> Vec<String> {
    paths
        .into_iter()
        .filter(|path| is_lintable_path(path, extensions))
        .collect()
}

/// Reduce a push's file-change list to lintable paths.
#[must_use]
pub fn filter_changes(changes: Vec<FileChange>, extensions: &[String]) -> Vec<String> {
    let paths = changes
        .into_iter()
        .filter(|change| change.status.is_lintable())
        .map(|change| change.path)
        .collect();
    filter_paths(paths, extensions)
}

fn is_lintable_path(path: &str, extensions: &[String]) -> bool {
    !path.ends_with(".d.ts") && extensions.iter().any(|ext| path.ends_with(ext.as_str()))
}
