//! API integration tests
//!
//! Drive the upload, download and cleanup routes through the full router.

use anyhow::Result;
use axum::body::Bytes;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::{TestResponse, TestServer};
use dupcheck::config::ServerConfig;
use dupcheck::server::app::{create_app, AppState};
use dupcheck::store::{DerivedFileStore, InMemorySessionRecords};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

const BOUNDARY: &str = "dupcheck-test-boundary";
const SCENARIO_CSV: &str = "k,v\nA,1\nB,2\nA,1\nC,3\nB,2\n";

/// Create a test server exporting into a fresh temporary directory
async fn setup_test_server() -> Result<(TestServer, TempDir)> {
    setup_test_server_with(ServerConfig::default()).await
}

async fn setup_test_server_with(config: ServerConfig) -> Result<(TestServer, TempDir)> {
    let export_dir = TempDir::new()?;
    let store = Arc::new(DerivedFileStore::new(
        export_dir.path(),
        Arc::new(InMemorySessionRecords::new()),
    ));
    let state = AppState::new(store)?;
    let app = create_app(state, &config)?;
    let server = TestServer::new(app)?;

    Ok((server, export_dir))
}

fn multipart_body(field: &str, filename: &str, content: &str) -> Bytes {
    Bytes::from(format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: text/csv\r\n\
         \r\n\
         {content}\r\n\
         --{b}--\r\n",
        b = BOUNDARY,
    ))
}

fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

async fn upload(
    server: &TestServer,
    cookie: Option<&HeaderValue>,
    filename: &str,
    content: &str,
) -> TestResponse {
    let mut request = server
        .post("/upload")
        .content_type(&multipart_content_type())
        .bytes(multipart_body("file", filename, content));
    if let Some(cookie) = cookie {
        request = request.add_header(header::COOKIE, cookie.clone());
    }
    request.await
}

/// Turn the `Set-Cookie` of a response into the `Cookie` header to send back
fn session_cookie(response: &TestResponse) -> HeaderValue {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie to be issued")
        .to_str()
        .unwrap();
    let pair = set_cookie.split(';').next().unwrap();
    HeaderValue::from_str(pair).unwrap()
}

fn export_files(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let (server, dir) = setup_test_server().await?;

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["service"], "dupcheck");
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
    assert_eq!(body["export_dir"], dir.path().display().to_string());
    assert_eq!(body["active_sessions"], 0);

    Ok(())
}

#[tokio::test]
async fn test_index_renders_upload_form() -> Result<()> {
    let (server, _dir) = setup_test_server().await?;

    let response = server.get("/").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains(r#"action="/upload""#));

    Ok(())
}

#[tokio::test]
async fn test_upload_without_file_part() -> Result<()> {
    let (server, _dir) = setup_test_server().await?;

    let response = server
        .post("/upload")
        .content_type(&multipart_content_type())
        .bytes(multipart_body("attachment", "data.csv", SCENARIO_CSV))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "No file part");

    Ok(())
}

#[tokio::test]
async fn test_upload_that_is_not_multipart() -> Result<()> {
    let (server, _dir) = setup_test_server().await?;

    let response = server
        .post("/upload")
        .content_type("text/csv")
        .bytes(Bytes::from_static(SCENARIO_CSV.as_bytes()))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "No file part");

    Ok(())
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() -> Result<()> {
    let config = ServerConfig {
        max_upload_bytes: 64,
        ..ServerConfig::default()
    };
    let (server, dir) = setup_test_server_with(config).await?;

    let content = "k,v\n".to_string() + &"A,1\n".repeat(100);
    let response = upload(&server, None, "big.csv", &content).await;

    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(export_files(&dir).is_empty());

    Ok(())
}

#[tokio::test]
async fn test_distinct_large_ids_are_not_duplicates() -> Result<()> {
    let (server, dir) = setup_test_server().await?;

    let response = upload(
        &server,
        None,
        "ids.csv",
        "id\n10000000000000000001\n10000000000000000002\n",
    )
    .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("No duplicate rows found."));
    assert!(export_files(&dir).is_empty());

    Ok(())
}

#[tokio::test]
async fn test_upload_with_empty_filename() -> Result<()> {
    let (server, dir) = setup_test_server().await?;

    let response = upload(&server, None, "", SCENARIO_CSV).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "No selected file");
    assert!(export_files(&dir).is_empty());

    Ok(())
}

#[tokio::test]
async fn test_upload_then_download_duplicates() -> Result<()> {
    let (server, dir) = setup_test_server().await?;

    let response = upload(&server, None, "people.csv", SCENARIO_CSV).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();
    assert!(html.contains(r#"<strong id="original-count">5</strong>"#));
    assert!(html.contains(r#"<strong id="duplicate-count">4</strong>"#));
    assert!(html.contains("/download_duplicates"));

    let files = export_files(&dir);
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("duplicates_") && files[0].ends_with(".csv"));
    assert_eq!(files[0].len(), "duplicates_".len() + 16 + ".csv".len());

    let cookie = session_cookie(&response);
    let response = server
        .get("/download_duplicates")
        .add_header(header::COOKIE, cookie)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE),
        Some(&HeaderValue::from_static("text/csv"))
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION),
        Some(&HeaderValue::from_static(
            "attachment; filename=\"duplicates.csv\""
        ))
    );
    assert_eq!(response.text(), "k,v\nA,1\nB,2\nA,1\nB,2\n");

    Ok(())
}

#[tokio::test]
async fn test_download_before_any_upload() -> Result<()> {
    let (server, _dir) = setup_test_server().await?;

    let response = server.get("/download_duplicates").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.text(),
        "No duplicate data available for download. Please upload a CSV file first."
    );

    Ok(())
}

#[tokio::test]
async fn test_upload_without_duplicates() -> Result<()> {
    let (server, dir) = setup_test_server().await?;

    let response = upload(&server, None, "unique.csv", "k,v\nA,1\nB,2\n").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("No duplicate rows found."));
    assert!(export_files(&dir).is_empty());

    let cookie = session_cookie(&response);
    let response = server
        .get("/download_duplicates")
        .add_header(header::COOKIE, cookie)
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_cleanup_removes_export() -> Result<()> {
    let (server, dir) = setup_test_server().await?;

    let response = upload(&server, None, "people.csv", SCENARIO_CSV).await;
    let cookie = session_cookie(&response);
    assert_eq!(export_files(&dir).len(), 1);

    let response = server
        .post("/cleanup")
        .add_header(header::COOKIE, cookie.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "Cleanup successful");
    assert!(export_files(&dir).is_empty());

    let response = server
        .get("/download_duplicates")
        .add_header(header::COOKIE, cookie.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .post("/cleanup")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "Cleanup successful");

    Ok(())
}

#[tokio::test]
async fn test_cleanup_without_session() -> Result<()> {
    let (server, _dir) = setup_test_server().await?;

    let response = server.post("/cleanup").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "Cleanup successful");

    Ok(())
}

#[tokio::test]
async fn test_malformed_csv_is_reported() -> Result<()> {
    let (server, dir) = setup_test_server().await?;

    let response = upload(&server, None, "broken.csv", "a,b\n1,2\n1,2,3\n").await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().starts_with("Error processing file: "));
    assert!(export_files(&dir).is_empty());

    Ok(())
}

#[tokio::test]
async fn test_second_upload_replaces_download() -> Result<()> {
    let (server, dir) = setup_test_server().await?;

    let first = upload(&server, None, "first.csv", "x\n1\n1\n").await;
    let cookie = session_cookie(&first);

    let second = upload(&server, Some(&cookie), "second.csv", "x\n2\n2\n3\n").await;
    assert_eq!(second.status_code(), StatusCode::OK);
    assert!(second.headers().get(header::SET_COOKIE).is_none());

    // The first export is orphaned, not deleted
    assert_eq!(export_files(&dir).len(), 2);

    let response = server
        .get("/download_duplicates")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(response.text(), "x\n2\n2\n");

    Ok(())
}

#[tokio::test]
async fn test_sessions_are_isolated() -> Result<()> {
    let (server, _dir) = setup_test_server().await?;

    let alice = session_cookie(&upload(&server, None, "a.csv", "x\na\na\n").await);
    let bob = session_cookie(&upload(&server, None, "b.csv", "x\nb\nb\n").await);
    assert_ne!(alice, bob);

    server
        .post("/cleanup")
        .add_header(header::COOKIE, alice.clone())
        .await;

    let response = server
        .get("/download_duplicates")
        .add_header(header::COOKIE, alice)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .get("/download_duplicates")
        .add_header(header::COOKIE, bob)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "x\nb\nb\n");

    Ok(())
}

#[tokio::test]
async fn test_unknown_session_cookie_is_ignored() -> Result<()> {
    let (server, _dir) = setup_test_server().await?;

    let response = server
        .get("/download_duplicates")
        .add_header(
            HeaderName::from_static("cookie"),
            HeaderValue::from_static("dupcheck_session=not-a-token"),
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    Ok(())
}
