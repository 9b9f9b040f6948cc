//! GitHub API client for changed-file queries and the check-run lifecycle.

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::types::{CheckAnnotation, CheckRunSummary, Conclusion, FileChange, PullRequestFiles};

/// The checks API rejects updates carrying more annotations than this.
pub const MAX_ANNOTATIONS_PER_UPDATE: usize = 50;

const PULL_REQUEST_FILES_QUERY: &str = "\
query($owner: String!, $name: String!, $number: Int!) {
  repository(owner: $owner, name: $name) {
    pullRequest(number: $number) {
      files(first: 100) { nodes { path } }
      commits(last: 1) { nodes { commit { oid } } }
    }
  }
}";

/// Repository coordinates in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// GitHub API client scoped to one repository.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    token: String,
    api_url: String,
    graphql_url: String,
    repo: RepoId,
}

impl GithubClient {
    /// Create a new GitHub client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(token: &str, repo: RepoId, api_url: &str, graphql_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("lintgate/0.1"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            token: token.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            graphql_url: graphql_url.to_string(),
            repo,
        })
    }

    /// Fetch the changed-file paths of a pull request plus its latest
    /// commit oid, first page of 100.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails, the response carries GraphQL
    /// errors, or the pull request has no commit node.
    pub async fn pull_request_files(&self, number: u64) -> Result<PullRequestFiles> {
        debug!(repo = %self.repo, number, "Querying pull request files");

        let body = json!({
            "query": PULL_REQUEST_FILES_QUERY,
            "variables": {
                "owner": self.repo.owner,
                "name": self.repo.name,
                "number": number,
            },
        });

        let response = self
            .client
            .post(&self.graphql_url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .await
            .context("Failed to send pull request query")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("GitHub API error: {status} - {body}"));
        }

        let reply: GraphQlResponse = response
            .json()
            .await
            .context("Failed to parse pull request query response")?;

        if let Some(errors) = reply.errors {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            bail!("GraphQL error: {}", messages.join("; "));
        }

        let pull_request = reply
            .data
            .and_then(|d| d.repository)
            .and_then(|r| r.pull_request)
            .ok_or_else(|| anyhow!("pull request #{number} not found in {}", self.repo))?;

        let head_oid = pull_request
            .commits
            .nodes
            .into_iter()
            .flatten()
            .next_back()
            .map(|n| n.commit.oid)
            .ok_or_else(|| anyhow!("pull request #{number} has no commits"))?;

        let paths = pull_request
            .files
            .map(|f| f.nodes.into_iter().flatten().map(|n| n.path).collect())
            .unwrap_or_default();

        Ok(PullRequestFiles { paths, head_oid })
    }

    /// Fetch the file-change list of a single commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn commit_files(&self, sha: &str) -> Result<Vec<FileChange>> {
        debug!(repo = %self.repo, sha, "Querying commit files");

        let url = format!(
            "{}/repos/{}/{}/commits/{}",
            self.api_url,
            self.repo.owner,
            self.repo.name,
            urlencoding::encode(sha)
        );

        let commit: CommitDetail = self
            .get_json(&url, "Failed to fetch commit files")
            .await?;

        Ok(commit.files)
    }

    /// List in-progress check runs for a ref.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn list_check_runs(&self, git_ref: &str) -> Result<Vec<CheckRunSummary>> {
        let url = format!(
            "{}/repos/{}/{}/commits/{}/check-runs?status=in_progress",
            self.api_url,
            self.repo.owner,
            self.repo.name,
            urlencoding::encode(git_ref)
        );

        let list: CheckRunList = self
            .get_json(&url, "Failed to list check runs")
            .await?;

        Ok(list.check_runs)
    }

    /// Create an in-progress check run anchored to a commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn create_check_run(&self, name: &str, head_sha: &str) -> Result<u64> {
        debug!(repo = %self.repo, name, head_sha, "Creating check run");

        let url = format!(
            "{}/repos/{}/{}/check-runs",
            self.api_url, self.repo.owner, self.repo.name
        );
        let body = json!({
            "name": name,
            "head_sha": head_sha,
            "status": "in_progress",
            "started_at": Utc::now().to_rfc3339(),
        });

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .await
            .context("Failed to send create check run request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("GitHub API error creating check run: {status} - {body}"));
        }

        let created: CreatedCheckRun = response
            .json()
            .await
            .context("Failed to parse create check run response")?;

        Ok(created.id)
    }

    /// Complete a check run with a conclusion, output and annotations.
    ///
    /// Annotations are sent in batches of [`MAX_ANNOTATIONS_PER_UPDATE`];
    /// the conclusion and completed status ride on the final update only,
    /// so the run transitions to `completed` exactly once.
    ///
    /// # Errors
    ///
    /// Returns an error if any update call fails.
    pub async fn complete_check_run(
        &self,
        id: u64,
        conclusion: Conclusion,
        title: &str,
        summary: &str,
        annotations: &[CheckAnnotation],
    ) -> Result<()> {
        debug!(
            repo = %self.repo,
            id,
            conclusion = conclusion.as_str(),
            annotations = annotations.len(),
            "Completing check run"
        );

        let url = format!(
            "{}/repos/{}/{}/check-runs/{id}",
            self.api_url, self.repo.owner, self.repo.name
        );

        let empty: &[CheckAnnotation] = &[];
        let batches: Vec<&[CheckAnnotation]> = if annotations.is_empty() {
            vec![empty]
        } else {
            annotations.chunks(MAX_ANNOTATIONS_PER_UPDATE).collect()
        };
        let last = batches.len() - 1;

        for (index, batch) in batches.into_iter().enumerate() {
            let mut body = json!({
                "output": {
                    "title": title,
                    "summary": summary,
                    "annotations": batch,
                },
            });
            if index == last {
                body["status"] = json!("completed");
                body["conclusion"] = json!(conclusion);
                body["completed_at"] = json!(Utc::now().to_rfc3339());
            }

            let response = self
                .client
                .patch(&url)
                .header(AUTHORIZATION, format!("Bearer {}", self.token))
                .json(&body)
                .send()
                .await
                .context("Failed to send check run update request")?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(anyhow!("GitHub API error updating check run: {status} - {body}"));
            }
        }

        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("GitHub API error: {status} - {body}"));
        }

        response.json().await.context(what.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<GraphQlData>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
struct RepositoryNode {
    #[serde(rename = "pullRequest")]
    pull_request: Option<PullRequestNode>,
}

#[derive(Debug, Deserialize)]
struct PullRequestNode {
    files: Option<FileConnection>,
    commits: CommitConnection,
}

#[derive(Debug, Deserialize)]
struct FileConnection {
    nodes: Vec<Option<FileNode>>,
}

#[derive(Debug, Deserialize)]
struct FileNode {
    path: String,
}

#[derive(Debug, Deserialize)]
struct CommitConnection {
    nodes: Vec<Option<CommitNode>>,
}

#[derive(Debug, Deserialize)]
struct CommitNode {
    commit: CommitOid,
}

#[derive(Debug, Deserialize)]
struct CommitOid {
    oid: String,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    #[serde(default)]
    files: Vec<FileChange>,
}

#[derive(Debug, Deserialize)]
struct CheckRunList {
    check_runs: Vec<CheckRunSummary>,
}

#[derive(Debug, Deserialize)]
struct CreatedCheckRun {
    id: u64,
}
