//! GitHub client tests against a mocked API server.

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scm::{AnnotationLevel, CheckAnnotation, Conclusion, FileStatus, GithubClient, RepoId};

fn client_for(server: &MockServer) -> GithubClient {
    GithubClient::new(
        "test-token",
        RepoId {
            owner: "5dlabs".to_string(),
            name: "lintgate".to_string(),
        },
        &server.uri(),
        &format!("{}/graphql", server.uri()),
    )
    .unwrap()
}

fn annotation(line: u32) -> CheckAnnotation {
    CheckAnnotation {
        path: "src/a.ts".to_string(),
        start_line: line,
        end_line: line,
        start_column: Some(1),
        end_column: Some(1),
        annotation_level: AnnotationLevel::Warning,
        title: Some("no-console".to_string()),
        message: "Unexpected console statement.".to_string(),
    }
}

#[tokio::test]
async fn pull_request_files_returns_paths_and_head_oid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "repository": {
                    "pullRequest": {
                        "files": { "nodes": [ { "path": "src/a.ts" }, { "path": "README.md" } ] },
                        "commits": { "nodes": [ { "commit": { "oid": "abc123" } } ] },
                    }
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let files = client_for(&server).pull_request_files(17).await.unwrap();
    assert_eq!(files.paths, vec!["src/a.ts", "README.md"]);
    assert_eq!(files.head_oid, "abc123");

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["variables"]["owner"], "5dlabs");
    assert_eq!(body["variables"]["name"], "lintgate");
    assert_eq!(body["variables"]["number"], 17);
}

#[tokio::test]
async fn pull_request_files_surfaces_graphql_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [ { "message": "Resource not accessible by integration" } ]
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).pull_request_files(17).await.unwrap_err();
    assert!(err.to_string().contains("Resource not accessible"));
}

#[tokio::test]
async fn pull_request_files_requires_a_commit_node() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "repository": {
                    "pullRequest": {
                        "files": { "nodes": [] },
                        "commits": { "nodes": [] },
                    }
                }
            }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).pull_request_files(17).await.unwrap_err();
    assert!(err.to_string().contains("no commits"));
}

#[tokio::test]
async fn commit_files_parses_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/5dlabs/lintgate/commits/deadbeef"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "deadbeef",
            "files": [
                { "filename": "src/a.ts", "status": "modified" },
                { "filename": "src/b.ts", "status": "removed" },
                { "filename": "src/c.ts", "status": "renamed" },
            ]
        })))
        .mount(&server)
        .await;

    let files = client_for(&server).commit_files("deadbeef").await.unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(files[0].path, "src/a.ts");
    assert_eq!(files[0].status, FileStatus::Modified);
    assert_eq!(files[1].status, FileStatus::Removed);
    assert_eq!(files[2].status, FileStatus::Renamed);
}

#[tokio::test]
async fn commit_files_reports_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let err = client_for(&server).commit_files("deadbeef").await.unwrap_err();
    let text = err.to_string();
    assert!(text.contains("403"), "unexpected error: {text}");
}

#[tokio::test]
async fn list_check_runs_filters_to_in_progress() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/5dlabs/lintgate/commits/deadbeef/check-runs"))
        .and(query_param("status", "in_progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 1,
            "check_runs": [ { "id": 42, "name": "Lint", "status": "in_progress" } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let runs = client_for(&server).list_check_runs("deadbeef").await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].id, 42);
    assert_eq!(runs[0].name, "Lint");
}

#[tokio::test]
async fn create_check_run_posts_in_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/5dlabs/lintgate/check-runs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 7 })))
        .expect(1)
        .mount(&server)
        .await;

    let id = client_for(&server)
        .create_check_run("lintgate", "deadbeef")
        .await
        .unwrap();
    assert_eq!(id, 7);

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["name"], "lintgate");
    assert_eq!(body["head_sha"], "deadbeef");
    assert_eq!(body["status"], "in_progress");
    assert!(body["started_at"].is_string());
}

#[tokio::test]
async fn complete_check_run_batches_annotations() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/repos/5dlabs/lintgate/check-runs/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 7 })))
        .expect(3)
        .mount(&server)
        .await;

    let annotations: Vec<CheckAnnotation> = (1..=120).map(annotation).collect();
    client_for(&server)
        .complete_check_run(7, Conclusion::Failure, "lintgate", "3 error(s)", &annotations)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let bodies: Vec<Value> = requests.iter().map(|r| serde_json::from_slice(&r.body).unwrap()).collect();
    assert_eq!(bodies.len(), 3);

    assert_eq!(bodies[0]["output"]["annotations"].as_array().unwrap().len(), 50);
    assert_eq!(bodies[1]["output"]["annotations"].as_array().unwrap().len(), 50);
    assert_eq!(bodies[2]["output"]["annotations"].as_array().unwrap().len(), 20);

    // only the final batch completes the run
    assert!(bodies[0].get("conclusion").is_none());
    assert!(bodies[1].get("conclusion").is_none());
    assert_eq!(bodies[2]["conclusion"], "failure");
    assert_eq!(bodies[2]["status"], "completed");
    assert!(bodies[2]["completed_at"].is_string());
}

#[tokio::test]
async fn complete_check_run_without_annotations_sends_one_update() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/repos/5dlabs/lintgate/check-runs/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 7 })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .complete_check_run(
            7,
            Conclusion::Success,
            "lintgate",
            "0 error(s), 0 warning(s) found",
            &[],
        )
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["status"], "completed");
    assert_eq!(body["conclusion"], "success");
    assert_eq!(body["output"]["summary"], "0 error(s), 0 warning(s) found");
}
