//! Best-effort check-run reporting.
//!
//! Every API failure here is downgraded to a warning: a token without
//! checks permissions still gets a full lint run with log-only output.

use anyhow::Result;
use scm::{CheckAnnotation, Conclusion, GithubClient};
use tracing::{info, warn};

/// Holds the check run for one invocation, if one could be acquired.
pub struct CheckReporter<'a> {
    client: &'a GithubClient,
    check_name: String,
    run_id: Option<u64>,
}

impl<'a> CheckReporter<'a> {
    /// Reuse an in-progress run matched by job name, or create a new one.
    ///
    /// Never fails: on any API error the reporter carries no run id and
    /// [`finalize`](Self::finalize) becomes a no-op.
    pub async fn acquire(
        client: &'a GithubClient,
        check_name: &str,
        job_name: Option<&str>,
        head_sha: &str,
    ) -> CheckReporter<'a> {
        let run_id = match Self::find_or_create(client, check_name, job_name, head_sha).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(
                    error = %e,
                    "Could not acquire a check run, annotations will not be published"
                );
                None
            }
        };

        Self {
            client,
            check_name: check_name.to_string(),
            run_id,
        }
    }

    async fn find_or_create(
        client: &GithubClient,
        check_name: &str,
        job_name: Option<&str>,
        head_sha: &str,
    ) -> Result<u64> {
        if let Some(job) = job_name {
            match client.list_check_runs(head_sha).await {
                Ok(runs) => {
                    if let Some(run) = runs.iter().find(|r| r.name.eq_ignore_ascii_case(job)) {
                        info!(id = run.id, name = %run.name, "Reusing in-progress check run");
                        return Ok(run.id);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to list check runs for reuse");
                }
            }
        }

        client.create_check_run(check_name, head_sha).await
    }

    /// Whether a run was acquired and will receive the final update.
    #[must_use]
    pub fn has_run(&self) -> bool {
        self.run_id.is_some()
    }

    /// Publish the final conclusion and annotations, best-effort.
    pub async fn finalize(
        &self,
        conclusion: Conclusion,
        summary: &str,
        annotations: &[CheckAnnotation],
    ) {
        let Some(id) = self.run_id else {
            return;
        };

        if let Err(e) = self
            .client
            .complete_check_run(id, conclusion, &self.check_name, summary, annotations)
            .await
        {
            warn!(error = %e, id, "Failed to update the check run");
        }
    }

    /// Mark the run failed when the lint step itself died.
    pub async fn finalize_failure(&self, summary: &str) {
        self.finalize(Conclusion::Failure, summary, &[]).await;
    }
}
