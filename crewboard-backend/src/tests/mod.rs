pub(crate) mod support;

use crate::auth::{issue_token, JwtConfig};
use crate::clock::SystemClock;
use crate::objectstore::DbObjectStorage;
use crate::project::{FILE_FIELD, METADATA_FIELD};
use crate::{build_app, AppState};
use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::Router;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::*;
use chrono::Utc;
use crewboard_shared::comment::{CommentUpdate, CommentView};
use crewboard_shared::project::{ProjectDetail, ProjectRequest, ProjectSummary};
use crewboard_shared::response::{CommonApiResponse, PageApiResponse, SliceApiResponse};
use crewboard_shared::UserId;
use serde_json::Value;
use std::sync::{Arc, Once};
use support::project_request;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

static INIT: Once = Once::new();

const PUBLIC_URL: &str = "http://localhost";

async fn setup_test_server() -> TestServer {
    INIT.call_once(|| {
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;
        tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new(
                "crewboard_backend=debug,tower_http=debug,info",
            ))
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
    let conn = crate::storage::start_db(None)
        .await
        .expect("Failed to start in-memory db");
    let storage = Arc::new(DbObjectStorage::new(conn.clone(), PUBLIC_URL));
    let appstate = AppState::with_parts(conn, storage, Arc::new(SystemClock), JwtConfig::test());
    let shared_state = Arc::new(RwLock::new(appstate));
    let app: Router = build_app(&shared_state);

    let config = TestServerConfig {
        expect_success_by_default: true,
        restrict_requests_with_http_schema: false,
        default_content_type: None,
        default_scheme: Some("http".into()),
        ..Default::default()
    };

    TestServer::new_with_config(app, config).expect("Failed to start test server")
}

/// A fresh user and the header value that authenticates them
fn bearer() -> (UserId, HeaderValue) {
    let user = UserId::new();
    let token = issue_token(user, &JwtConfig::test(), Utc::now()).expect("Failed to issue token");
    let value = HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header");
    (user, value)
}

fn submission(request: &ProjectRequest, file: Option<(&str, &[u8])>) -> MultipartForm {
    let metadata = serde_json::to_string(request).expect("Failed to serialize request");
    let form = MultipartForm::new().add_text(METADATA_FIELD, metadata);
    match file {
        Some((filename, body)) => form.add_part(
            FILE_FIELD,
            Part::bytes(body.to_vec())
                .file_name(filename)
                .mime_type("text/plain"),
        ),
        None => form,
    }
}

async fn only_project(server: &TestServer) -> ProjectSummary {
    let res = server.get("/api/v1/projects").await;
    let page: PageApiResponse<ProjectSummary> = res.json();
    assert_eq!(page.data.len(), 1);
    page.data
        .into_iter()
        .next()
        .expect("there's exactly one project")
}

#[tokio::test]
async fn test_requires_token() {
    let server = setup_test_server().await;

    let form = submission(&project_request("Anonymous", &["Backend"]), None);
    let res = server
        .post("/api/v1/projects")
        .multipart(form)
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 401);
    let body: Value = res.json();
    assert_eq!(body["code"], "UNAUTHORIZED");

    let res = server
        .get("/api/v1/projects/mine")
        .add_header(
            AUTHORIZATION,
            HeaderValue::from_static("Bearer not-a-real-token"),
        )
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 401);

    // reading is public
    server.get("/api/v1/projects").await.assert_status_ok();
    server.get("/api/v1/projects/hot").await.assert_status_ok();
}

#[tokio::test]
async fn test_api_project_lifecycle() {
    let server = setup_test_server().await;
    let (owner, token) = bearer();

    let request = project_request("Crewboard", &["Backend"]);
    let res = server
        .post("/api/v1/projects")
        .add_header(AUTHORIZATION, token.clone())
        .multipart(submission(&request, Some(("brief.txt", b"the first brief".as_slice()))))
        .await;
    let body: CommonApiResponse<String> = res.json();
    assert_eq!(body.result, "OK");
    assert_eq!(body.data, "Project saved");

    let summary = only_project(&server).await;
    assert_eq!(summary.title, "Crewboard");
    assert_eq!(summary.position, "Backend");
    assert_eq!(summary.user_id, owner);
    assert!(summary.recent);
    let first_url = summary.file_url.clone().expect("file url was stored");
    assert!(first_url.starts_with("http://localhost/api/v1/files/"));

    // the stored file is served back
    let file_path = first_url.trim_start_matches(PUBLIC_URL);
    let res = server.get(file_path).await;
    assert_eq!(res.text(), "the first brief");
    let content_type = res.header(CONTENT_TYPE);
    assert!(content_type
        .to_str()
        .expect("ascii header")
        .starts_with("text/plain"));
    let disposition = res.header(CONTENT_DISPOSITION);
    assert!(disposition
        .to_str()
        .expect("ascii header")
        .contains("brief.txt"));

    let res = server
        .get(&format!("/api/v1/projects/{}", summary.id))
        .await;
    let detail: CommonApiResponse<ProjectDetail> = res.json();
    assert_eq!(detail.data.view_count, 1);
    assert_eq!(detail.data.recruits.len(), 1);
    assert_eq!(detail.data.recruits[0].position, "Backend");

    // replace the recruits and the file
    let request = project_request("Crewboard", &["Backend", "Frontend"]);
    info!("updating project {}", summary.id);
    let res = server
        .put(&format!("/api/v1/projects/{}", summary.id))
        .add_header(AUTHORIZATION, token.clone())
        .multipart(submission(&request, Some(("brief.txt", b"the second brief".as_slice()))))
        .await;
    let body: CommonApiResponse<String> = res.json();
    assert_eq!(body.data, "Project updated");

    let summary = only_project(&server).await;
    assert_eq!(summary.position, "Backend, Frontend");
    let second_url = summary.file_url.clone().expect("file url was kept");
    assert_ne!(first_url, second_url);
    server
        .get(first_url.trim_start_matches(PUBLIC_URL))
        .expect_failure()
        .await
        .assert_status_not_found();
    let res = server.get(second_url.trim_start_matches(PUBLIC_URL)).await;
    assert_eq!(res.text(), "the second brief");

    // updating without a file keeps the current one
    let request = project_request("Crewboard v2", &["Frontend"]);
    server
        .patch(&format!("/api/v1/projects/{}", summary.id))
        .add_header(AUTHORIZATION, token.clone())
        .multipart(submission(&request, None))
        .await
        .assert_status_ok();
    let summary = only_project(&server).await;
    assert_eq!(summary.title, "Crewboard v2");
    assert_eq!(summary.file_url.as_deref(), Some(second_url.as_str()));

    let res = server
        .get("/api/v1/projects/mine")
        .add_header(AUTHORIZATION, token.clone())
        .await;
    let mine: PageApiResponse<ProjectSummary> = res.json();
    assert_eq!(mine.total_elements, 1);

    let res = server
        .delete(&format!("/api/v1/projects/{}", summary.id))
        .add_header(AUTHORIZATION, token)
        .await;
    let body: CommonApiResponse<String> = res.json();
    assert_eq!(body.data, "Project deleted");

    server
        .get(&format!("/api/v1/projects/{}", summary.id))
        .expect_failure()
        .await
        .assert_status_not_found();
    server
        .get(second_url.trim_start_matches(PUBLIC_URL))
        .expect_failure()
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_api_ownership() {
    let server = setup_test_server().await;
    let (_, owner) = bearer();
    let (_, stranger) = bearer();

    server
        .post("/api/v1/projects")
        .add_header(AUTHORIZATION, owner.clone())
        .multipart(submission(&project_request("Mine", &["Design"]), None))
        .await
        .assert_status_ok();
    let summary = only_project(&server).await;

    let res = server
        .put(&format!("/api/v1/projects/{}", summary.id))
        .add_header(AUTHORIZATION, stranger.clone())
        .multipart(submission(&project_request("Theirs", &["QA"]), None))
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 403);
    let body: Value = res.json();
    assert_eq!(body["code"], "FORBIDDEN");

    // someone else's project can't be found for deletion
    let res = server
        .delete(&format!("/api/v1/projects/{}", summary.id))
        .add_header(AUTHORIZATION, stranger)
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 404);

    let summary = only_project(&server).await;
    assert_eq!(summary.title, "Mine");
    assert_eq!(summary.position, "Design");
}

#[tokio::test]
async fn test_api_bad_submissions() {
    let server = setup_test_server().await;
    let (_, token) = bearer();

    let res = server
        .post("/api/v1/projects")
        .add_header(AUTHORIZATION, token.clone())
        .multipart(MultipartForm::new().add_text("title", "no metadata here"))
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 400);

    let res = server
        .post("/api/v1/projects")
        .add_header(AUTHORIZATION, token.clone())
        .multipart(MultipartForm::new().add_text(METADATA_FIELD, "{not json"))
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 400);

    let res = server
        .post("/api/v1/projects")
        .add_header(AUTHORIZATION, token)
        .multipart(submission(&project_request("   ", &[]), None))
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 400);
    let body: Value = res.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let page: PageApiResponse<ProjectSummary> = server.get("/api/v1/projects").await.json();
    assert_eq!(page.total_elements, 0);

    server
        .get(&format!("/api/v1/projects/{}", Uuid::new_v4()))
        .expect_failure()
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_api_search_and_favorites() {
    let server = setup_test_server().await;
    let (_, owner) = bearer();
    let (_, fan) = bearer();

    for (title, positions) in [
        ("Rust compiler study", vec!["Backend"]),
        ("Portfolio site", vec!["Frontend", "Design"]),
        ("Rusty robots", vec!["Embedded"]),
    ] {
        server
            .post("/api/v1/projects")
            .add_header(AUTHORIZATION, owner.clone())
            .multipart(submission(&project_request(title, &positions), None))
            .await
            .assert_status_ok();
    }

    let page: PageApiResponse<ProjectSummary> = server
        .get("/api/v1/projects")
        .add_query_param("keyword", "Rust")
        .await
        .json();
    assert_eq!(page.total_elements, 2);

    let page: PageApiResponse<ProjectSummary> = server
        .get("/api/v1/projects")
        .add_query_param("position", "Design")
        .await
        .json();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.data[0].title, "Portfolio site");

    let page: PageApiResponse<ProjectSummary> = server
        .get("/api/v1/projects")
        .add_query_param("size", 2)
        .add_query_param("page", 1)
        .await
        .json();
    assert_eq!(page.total_elements, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.data.len(), 1);

    let portfolio = server
        .get("/api/v1/projects")
        .add_query_param("keyword", "Portfolio")
        .await
        .json::<PageApiResponse<ProjectSummary>>()
        .data
        .remove(0);

    let res = server
        .post(&format!("/api/v1/projects/{}/favorite", portfolio.id))
        .add_header(AUTHORIZATION, fan.clone())
        .await;
    let body: CommonApiResponse<String> = res.json();
    assert_eq!(body.data, "Favorite added");

    let favorites: PageApiResponse<ProjectSummary> = server
        .get("/api/v1/projects/favorites")
        .add_header(AUTHORIZATION, fan.clone())
        .await
        .json();
    assert_eq!(favorites.total_elements, 1);
    assert_eq!(favorites.data[0].id, portfolio.id);

    server
        .delete(&format!("/api/v1/projects/{}/favorite", portfolio.id))
        .add_header(AUTHORIZATION, fan.clone())
        .await
        .assert_status_ok();
    let favorites: PageApiResponse<ProjectSummary> = server
        .get("/api/v1/projects/favorites")
        .add_header(AUTHORIZATION, fan.clone())
        .await
        .json();
    assert!(favorites.data.is_empty());

    server
        .post(&format!("/api/v1/projects/{}/favorite", Uuid::new_v4()))
        .add_header(AUTHORIZATION, fan)
        .expect_failure()
        .await
        .assert_status_not_found();

    // the one that was looked at most comes first
    server
        .get(&format!("/api/v1/projects/{}", portfolio.id))
        .await
        .assert_status_ok();
    let hot: CommonApiResponse<Vec<ProjectSummary>> = server
        .get("/api/v1/projects/hot")
        .add_query_param("size", 2)
        .await
        .json();
    assert_eq!(hot.data.len(), 2);
    assert_eq!(hot.data[0].id, portfolio.id);
}

#[tokio::test]
async fn test_api_comments() {
    let server = setup_test_server().await;
    let (_, owner) = bearer();
    let (_, other) = bearer();

    server
        .post("/api/v1/projects")
        .add_header(AUTHORIZATION, owner.clone())
        .multipart(submission(&project_request("Chatty", &["Backend"]), None))
        .await
        .assert_status_ok();
    let project = only_project(&server).await;
    let path = format!("/api/v1/comments/{}", project.id);

    let res = server
        .post(&path)
        .add_header(AUTHORIZATION, owner.clone())
        .text("Looking forward to this")
        .await;
    let body: CommonApiResponse<String> = res.json();
    assert_eq!(body.data, "Comment saved");

    let comments: SliceApiResponse<CommentView> = server.get(&path).await.json();
    assert!(!comments.has_next);
    assert_eq!(comments.data.len(), 1);
    let comment = comments.data[0].clone();
    assert_eq!(comment.content, "Looking forward to this");

    let update = CommentUpdate {
        comment_id: comment.id,
        content: "Not mine to edit".to_string(),
    };
    let res = server
        .patch(&path)
        .add_header(AUTHORIZATION, other.clone())
        .json(&update)
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 403);

    let update = CommentUpdate {
        comment_id: comment.id,
        content: "Edited".to_string(),
    };
    server
        .patch(&path)
        .add_header(AUTHORIZATION, owner.clone())
        .json(&update)
        .await
        .assert_status_ok();
    let comments: SliceApiResponse<CommentView> = server.get(&path).await.json();
    assert_eq!(comments.data[0].content, "Edited");
    assert!(comments.data[0].last_modified.is_some());

    let detail: CommonApiResponse<ProjectDetail> = server
        .get(&format!("/api/v1/projects/{}", project.id))
        .await
        .json();
    assert_eq!(detail.data.comment_count, 1);

    server
        .delete(&path)
        .add_header(AUTHORIZATION, owner)
        .add_query_param("comment_id", comment.id)
        .await
        .assert_status_ok();
    let comments: SliceApiResponse<CommentView> = server.get(&path).await.json();
    assert!(comments.data.is_empty());

    server
        .post(&format!("/api/v1/comments/{}", Uuid::new_v4()))
        .add_header(AUTHORIZATION, other)
        .text("Anyone here?")
        .expect_failure()
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_openapi_is_served() {
    let server = setup_test_server().await;
    let res = server.get("/api/v1/openapi.json").await;
    let doc: Value = res.json();
    assert!(doc["paths"]["/api/v1/projects"].is_object());
}

#[tokio::test]
async fn test_api_malformed_parameters() {
    let server = setup_test_server().await;
    let (_, token) = bearer();

    let huge_page = (u64::MAX / 2).to_string();
    for path in [
        "/api/v1/projects",
        "/api/v1/projects/favorites",
        "/api/v1/projects/mine",
    ] {
        let res = server
            .get(path)
            .add_header(AUTHORIZATION, token.clone())
            .add_query_param("page", &huge_page)
            .expect_failure()
            .await;
        assert_eq!(res.status_code(), 400, "{path}");
        let body: Value = res.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    let res = server
        .get(&format!("/api/v1/comments/{}", Uuid::new_v4()))
        .add_query_param("page", u64::MAX)
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 400);

    // rejections from parsing come back in the same json shape
    let res = server
        .get("/api/v1/projects")
        .add_query_param("page", "abc")
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 400);
    let body: Value = res.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].is_string());

    let res = server
        .get("/api/v1/projects/not-a-uuid")
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 400);
    let body: Value = res.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let res = server
        .patch(&format!("/api/v1/comments/{}", Uuid::new_v4()))
        .add_header(AUTHORIZATION, token.clone())
        .json(&serde_json::json!({ "content": "missing the id" }))
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 400);
    let body: Value = res.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let res = server
        .delete(&format!("/api/v1/comments/{}", Uuid::new_v4()))
        .add_header(AUTHORIZATION, token)
        .add_query_param("comment_id", "nope")
        .expect_failure()
        .await;
    assert_eq!(res.status_code(), 400);
}
