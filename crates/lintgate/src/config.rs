//! Action configuration assembled from inputs and runner environment.

use std::path::PathBuf;

use clap::Parser;
use scm::RepoId;
use serde_json::Value;
use thiserror::Error;

/// CI lint gate - runs ESLint over changed files and annotates the check run
#[derive(Debug, Parser)]
#[command(name = "lintgate")]
#[command(about = "Runs ESLint over changed files and annotates the check run")]
#[command(version)]
pub struct Cli {
    /// Token used for GitHub API calls
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Reuse the in-progress check run whose name matches this job name
    #[arg(long, env = "INPUT_JOB-NAME")]
    pub job_name: Option<String>,

    /// Truthy to lint the default target instead of the changed-file diff
    #[arg(long, env = "INPUT_LINT-ALL")]
    pub lint_all: Option<String>,

    /// Comma-separated paths or globs to lint, overriding change detection
    #[arg(long, env = "INPUT_CUSTOM-GLOB")]
    pub custom_glob: Option<String>,

    /// Extensions considered lintable
    #[arg(long, env = "INPUT_EXTENSIONS", value_delimiter = ',', default_value = ".ts,.js,.tsx,.jsx")]
    pub extensions: Vec<String>,

    /// Target linted when no diff-based selection applies
    #[arg(long, env = "INPUT_DEFAULT-TARGET", default_value = "src")]
    pub default_target: String,

    /// Name given to a newly created check run
    #[arg(long, env = "INPUT_CHECK-NAME", default_value = "lintgate")]
    pub check_name: String,

    /// Repository in owner/name form
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: String,

    /// Commit sha that triggered the workflow
    #[arg(long, env = "GITHUB_SHA")]
    pub sha: String,

    /// Checkout root on the runner
    #[arg(long, env = "GITHUB_WORKSPACE")]
    pub workspace: PathBuf,

    /// Event that triggered the workflow (push, pull_request, ...)
    #[arg(long, env = "GITHUB_EVENT_NAME", default_value = "push")]
    pub event_name: String,

    /// Path to the event payload written by the runner
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: Option<PathBuf>,

    /// REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub api_url: String,

    /// GraphQL endpoint URL
    #[arg(long, env = "GITHUB_GRAPHQL_URL", default_value = "https://api.github.com/graphql")]
    pub graphql_url: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// The event that started this invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerContext {
    PullRequest { number: u64 },
    Push { sha: String },
}

/// Everything the orchestrator needs for one run, resolved up front.
#[derive(Debug, Clone)]
pub struct ActionConfig {
    pub token: String,
    pub repo: RepoId,
    pub sha: String,
    pub workspace: PathBuf,
    pub trigger: TriggerContext,
    pub job_name: Option<String>,
    pub lint_all: bool,
    pub custom_glob: Option<String>,
    pub extensions: Vec<String>,
    pub default_target: String,
    pub check_name: String,
    pub api_url: String,
    pub graphql_url: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid repository `{0}`: expected owner/name")]
    InvalidRepository(String),
    #[error("failed to read event payload at {path}: {source}")]
    EventPayload {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed event payload: {0}")]
    MalformedPayload(String),
}

impl Cli {
    /// Resolve the CLI surface into an [`ActionConfig`].
    ///
    /// Reads the event payload from disk only when the trigger needs it.
    pub fn into_config(self) -> Result<ActionConfig, ConfigError> {
        let repo = parse_repository(&self.repository)?;

        let payload = match (&self.event_path, is_pull_request_event(&self.event_name)) {
            (Some(path), true) => {
                let raw = std::fs::read_to_string(path).map_err(|source| {
                    ConfigError::EventPayload {
                        path: path.clone(),
                        source,
                    }
                })?;
                Some(serde_json::from_str(&raw).map_err(|e| {
                    ConfigError::MalformedPayload(e.to_string())
                })?)
            }
            _ => None,
        };
        let trigger = resolve_trigger(&self.event_name, payload.as_ref(), &self.sha)?;

        Ok(ActionConfig {
            token: self.token,
            repo,
            sha: self.sha,
            workspace: self.workspace,
            trigger,
            job_name: self.job_name.filter(|s| !s.is_empty()),
            lint_all: self.lint_all.as_deref().is_some_and(is_truthy),
            custom_glob: self.custom_glob.filter(|s| !s.is_empty()),
            extensions: self.extensions,
            default_target: self.default_target,
            check_name: self.check_name,
            api_url: self.api_url,
            graphql_url: self.graphql_url,
        })
    }
}

fn parse_repository(repository: &str) -> Result<RepoId, ConfigError> {
    match repository.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(RepoId {
                owner: owner.to_string(),
                name: name.to_string(),
            })
        }
        _ => Err(ConfigError::InvalidRepository(repository.to_string())),
    }
}

fn is_pull_request_event(event_name: &str) -> bool {
    matches!(event_name, "pull_request" | "pull_request_target")
}

/// Resolve the trigger context from the event name and payload.
///
/// Pull request events require a `pull_request.number` in the payload;
/// every other event is treated as a push anchored at the trigger sha.
pub fn resolve_trigger(
    event_name: &str,
    payload: Option<&Value>,
    sha: &str,
) -> Result<TriggerContext, ConfigError> {
    if !is_pull_request_event(event_name) {
        return Ok(TriggerContext::Push {
            sha: sha.to_string(),
        });
    }

    let number = payload
        .and_then(|p| p.get("pull_request"))
        .and_then(|pr| pr.get("number"))
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            ConfigError::MalformedPayload("pull_request.number missing".to_string())
        })?;

    Ok(TriggerContext::PullRequest { number })
}

/// Action inputs are strings; accept the usual spellings of true.
fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
