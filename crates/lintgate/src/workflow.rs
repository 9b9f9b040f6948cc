//! Orchestrates one lint run end to end.

use anyhow::{Context, Result};
use scm::{Conclusion, GithubClient};
use tracing::info;

use crate::actions;
use crate::annotate;
use crate::config::ActionConfig;
use crate::eslint::LintRunner;
use crate::report::CheckReporter;
use crate::selector::{self, FileSelection};

/// Matcher owner id used by the runner to attribute matched log lines.
const MATCHER_OWNER: &str = "eslint";

/// What the process exit state is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub conclusion: Conclusion,
    pub summary: String,
}

/// Run the whole pipeline: select files, lint, report.
///
/// Degradable steps (file discovery, check-run acquisition, the final
/// update) warn and continue; an engine failure marks the run failed
/// best-effort and then propagates.
///
/// # Errors
///
/// Returns an error when the lint engine cannot be invoked or the GitHub
/// client cannot be constructed.
pub async fn run(config: &ActionConfig, runner: &dyn LintRunner) -> Result<Outcome> {
    let matcher = config.workspace.join(".github/eslint-matcher.json");
    if matcher.exists() {
        actions::add_matcher(&matcher);
    }

    let client = GithubClient::new(
        &config.token,
        config.repo.clone(),
        &config.api_url,
        &config.graphql_url,
    )?;

    let selection = selector::select_files(&client, config).await;
    info!(sha = %selection.head_sha, "Resolved lint selection");

    let reporter = CheckReporter::acquire(
        &client,
        &config.check_name,
        config.job_name.as_deref(),
        &selection.head_sha,
    )
    .await;

    let targets = match &selection.files {
        FileSelection::Workspace => vec![config.default_target.clone()],
        FileSelection::Paths(paths) => paths.clone(),
    };

    let report = match runner.run(&targets).await {
        Ok(report) => report,
        Err(e) => {
            reporter
                .finalize_failure("The lint step failed to complete")
                .await;
            return Err(e).context("lint step failed");
        }
    };

    // from here on the API annotations carry the diagnostics; the matcher
    // would double-report them from the grouped log
    actions::remove_matcher(MATCHER_OWNER);

    let verdict = annotate::build_verdict(&report, &config.workspace);
    annotate::log_report(&report, &config.workspace);
    info!(
        errors = report.error_count,
        warnings = report.warning_count,
        conclusion = verdict.conclusion.as_str(),
        "Lint completed"
    );

    reporter
        .finalize(verdict.conclusion, &verdict.summary, &verdict.annotations)
        .await;

    Ok(Outcome {
        conclusion: verdict.conclusion,
        summary: verdict.summary,
    })
}
