use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use axum::{Form, Json, Router};
use fontpush_remote::{DriveClient, RemoteError, RemoteStorage, ServiceAccountKey};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

const PRIVATE_KEY: &str = include_str!("data/service_account_key.pem");

#[derive(Clone, Default)]
struct MockDrive {
    addr: Arc<Mutex<Option<SocketAddr>>>,
    token_requests: Arc<Mutex<usize>>,
    metadata: Arc<Mutex<Vec<Value>>>,
    bodies: Arc<Mutex<Vec<Vec<u8>>>>,
}

async fn token(
    State(mock): State<MockDrive>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    assert_eq!(
        form.get("grant_type").map(String::as_str),
        Some("urn:ietf:params:oauth:grant-type:jwt-bearer")
    );
    assert_eq!(form.get("assertion").unwrap().split('.').count(), 3);
    *mock.token_requests.lock().unwrap() += 1;
    Json(json!({ "access_token": "test-token", "expires_in": 3600, "token_type": "Bearer" }))
        .into_response()
}

async fn start_session(
    State(mock): State<MockDrive>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(metadata): Json<Value>,
) -> Response {
    assert_eq!(query.get("uploadType").map(String::as_str), Some("resumable"));
    assert_eq!(query.get("fields").map(String::as_str), Some("id"));
    assert_eq!(
        headers.get(header::AUTHORIZATION).unwrap(),
        "Bearer test-token"
    );
    assert!(headers.contains_key("x-upload-content-length"));

    if metadata["name"] == "reject.zip" {
        return (StatusCode::FORBIDDEN, "storage quota exceeded").into_response();
    }

    let mut all = mock.metadata.lock().unwrap();
    all.push(metadata);
    let addr = mock.addr.lock().unwrap().unwrap();
    let location = format!("http://{}/session/{}", addr, all.len());
    (StatusCode::OK, [(header::LOCATION, location)]).into_response()
}

async fn finish_session(
    State(mock): State<MockDrive>,
    UrlPath(session): UrlPath<usize>,
    body: axum::body::Bytes,
) -> Response {
    mock.bodies.lock().unwrap().push(body.to_vec());
    Json(json!({ "id": format!("file-{}", session) })).into_response()
}

async fn mock_drive() -> (MockDrive, SocketAddr) {
    let mock = MockDrive::default();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    *mock.addr.lock().unwrap() = Some(addr);

    let app = Router::new()
        .route("/token", post(token))
        .route("/upload/files", post(start_session))
        .route("/session/:id", put(finish_session))
        .with_state(mock.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (mock, addr)
}

fn client(addr: SocketAddr) -> DriveClient {
    let key = ServiceAccountKey::from_json(
        &json!({
            "type": "service_account",
            "client_email": "uploader@demo.iam.gserviceaccount.com",
            "private_key": PRIVATE_KEY,
            "private_key_id": "test-key",
            "token_uri": format!("http://{}/token", addr),
        })
        .to_string(),
    )
    .unwrap();
    DriveClient::new(key)
        .unwrap()
        .with_upload_url(format!("http://{}/upload", addr))
}

#[tokio::test]
async fn uploads_file_with_parent_folder() {
    let (mock, addr) = mock_drive().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deck.pptx");
    std::fs::write(&path, b"deck bytes").unwrap();

    let id = client(addr).upload(&path, Some("folder-9")).await.unwrap();
    assert_eq!(id, "file-1");

    let metadata = mock.metadata.lock().unwrap();
    assert_eq!(
        metadata[0],
        json!({ "name": "deck.pptx", "parents": ["folder-9"] })
    );
    assert_eq!(mock.bodies.lock().unwrap()[0], b"deck bytes");
}

#[tokio::test]
async fn token_is_reused_across_uploads() {
    let (mock, addr) = mock_drive().await;
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("Arial.zip");
    let second = dir.path().join("Georgia.zip");
    std::fs::write(&first, b"a").unwrap();
    std::fs::write(&second, b"g").unwrap();

    let drive = client(addr);
    assert_eq!(drive.upload(&first, None).await.unwrap(), "file-1");
    assert_eq!(drive.upload(&second, None).await.unwrap(), "file-2");

    assert_eq!(*mock.token_requests.lock().unwrap(), 1);
    let metadata = mock.metadata.lock().unwrap();
    assert_eq!(metadata[1], json!({ "name": "Georgia.zip" }));
}

#[tokio::test]
async fn rejected_upload_is_an_error() {
    let (_mock, addr) = mock_drive().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reject.zip");
    std::fs::write(&path, b"x").unwrap();

    let err = client(addr).upload(&path, None).await.unwrap_err();
    match err {
        RemoteError::Upload { name, status, body } => {
            assert_eq!(name, "reject.zip");
            assert_eq!(status, 403);
            assert!(body.contains("quota"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let (_mock, addr) = mock_drive().await;
    let err = client(addr)
        .upload(std::path::Path::new("/nonexistent/deck.pptx"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Io(_)));
}
