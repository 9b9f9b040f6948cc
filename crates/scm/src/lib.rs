//! GitHub client for check runs and changed-file queries.
//!
//! Wraps the small slice of the GitHub API this tool consumes: the
//! changed-file list of a pull request (GraphQL) or a commit (REST), and
//! the check-run lifecycle used to publish lint annotations.

mod github;
mod types;

pub use github::{GithubClient, RepoId, MAX_ANNOTATIONS_PER_UPDATE};
pub use types::{
    AnnotationLevel, CheckAnnotation, CheckRunSummary, Conclusion, FileChange, FileStatus,
    PullRequestFiles,
};
