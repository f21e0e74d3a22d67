use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use fontpush_core::FontArchive;
use fontpush_pptx::fixtures::{DeckBuilder, SlideContent};
use fontpush_remote::{FontSource, RemoteError, RemoteStorage};
use fontpush_server::{build_router, AppState, UploadDir};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

const BOUNDARY: &str = "X-BOUNDARY";

/// Catalog that only knows a fixed list of families.
struct FakeCatalog {
    available: Vec<&'static str>,
    requested: Mutex<Vec<String>>,
}

#[async_trait]
impl FontSource for FakeCatalog {
    async fn fetch(&self, family: &str) -> Option<FontArchive> {
        self.requested.lock().unwrap().push(family.to_string());
        self.available
            .contains(&family)
            .then(|| FontArchive::new(family, format!("zip of {family}").into_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Uploaded {
    name: String,
    folder_id: Option<String>,
    bytes: Vec<u8>,
}

/// Storage that records uploads and can refuse one file name.
#[derive(Default)]
struct RecordingStorage {
    uploads: Mutex<Vec<Uploaded>>,
    reject: Option<&'static str>,
}

#[async_trait]
impl RemoteStorage for RecordingStorage {
    async fn upload(&self, path: &Path, folder_id: Option<&str>) -> fontpush_remote::Result<String> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if self.reject == Some(name.as_str()) {
            return Err(RemoteError::Upload {
                name,
                status: 403,
                body: "forbidden".into(),
            });
        }
        let bytes = std::fs::read(path)?;
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(Uploaded {
            name,
            folder_id: folder_id.map(str::to_string),
            bytes,
        });
        Ok(format!("id-{}", uploads.len()))
    }
}

struct Harness {
    app: Router,
    catalog: Arc<FakeCatalog>,
    storage: Arc<RecordingStorage>,
    dir: tempfile::TempDir,
}

fn harness(available: Vec<&'static str>, reject: Option<&'static str>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(FakeCatalog {
        available,
        requested: Mutex::new(Vec::new()),
    });
    let storage = Arc::new(RecordingStorage {
        uploads: Mutex::new(Vec::new()),
        reject,
    });
    let state = AppState::new(
        UploadDir::new(dir.path().join("uploads")),
        catalog.clone(),
        storage.clone(),
    );
    Harness {
        app: build_router(state),
        catalog,
        storage,
        dir,
    }
}

fn two_font_deck() -> Vec<u8> {
    DeckBuilder::new()
        .slide(
            SlideContent::new()
                .text_run("Title", "Open Sans")
                .plain_run("inherits the theme font"),
        )
        .slide(SlideContent::new().table_cell_run("cell", "Arial"))
        .build()
}

/// Multipart body with an optional file part and an optional folder field.
fn form(file: Option<(&str, &[u8])>, folder_id: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"document\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(folder_id) = folder_id {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"folder_id\"\r\n\r\n{folder_id}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn upload_lists_fonts_and_pushes_available_packages() {
    let h = harness(vec!["Open Sans"], None);
    let deck = two_font_deck();

    let response = h
        .app
        .clone()
        .oneshot(upload_request(form(Some(("Team Deck.pptx", &deck)), Some("folder-7"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let payload: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(payload["message"], "File successfully uploaded");
    assert_eq!(payload["fonts"], serde_json::json!(["Arial", "Open Sans"]));

    assert_eq!(
        *h.catalog.requested.lock().unwrap(),
        vec!["Arial".to_string(), "Open Sans".to_string()]
    );

    let uploads = h.storage.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].name, "Team_Deck.pptx");
    assert_eq!(uploads[0].bytes, deck);
    assert_eq!(uploads[0].folder_id.as_deref(), Some("folder-7"));
    assert_eq!(uploads[1].name, "Open Sans.zip");
    assert_eq!(uploads[1].bytes, b"zip of Open Sans");
    assert_eq!(uploads[1].folder_id.as_deref(), Some("folder-7"));

    let saved = h.dir.path().join("uploads");
    assert!(saved.join("Team_Deck.pptx").exists());
    assert!(saved.join("Open Sans.zip").exists());
    assert!(!saved.join("Arial.zip").exists());
}

#[tokio::test]
async fn empty_folder_id_uploads_without_parent() {
    let h = harness(vec![], None);
    let deck = two_font_deck();

    let response = h
        .app
        .clone()
        .oneshot(upload_request(form(Some(("deck.pptx", &deck)), Some(""))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let uploads = h.storage.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].folder_id, None);
}

#[tokio::test]
async fn missing_file_part_redirects_with_notice() {
    let h = harness(vec![], None);

    let response = h
        .app
        .clone()
        .oneshot(upload_request(form(None, Some("folder-7"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/");
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("flash=No%20file%20part"));
    assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    assert!(h.storage.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_filename_redirects_to_referer() {
    let h = harness(vec![], None);

    let mut request = upload_request(form(Some(("", b"")), None));
    request
        .headers_mut()
        .insert(header::REFERER, "http://localhost:5000/".parse().unwrap());
    let response = h.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "http://localhost:5000/");
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("flash=No%20selected%20file"));
}

#[tokio::test]
async fn disallowed_extension_redirects_with_notice() {
    let h = harness(vec![], None);

    let response = h
        .app
        .clone()
        .oneshot(upload_request(form(Some(("notes.txt", b"hello")), None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("flash=File%20type%20not%20allowed"));
    assert!(!h.dir.path().join("uploads").join("notes.txt").exists());
}

#[tokio::test]
async fn unreadable_document_is_a_server_error() {
    let h = harness(vec!["Arial"], None);

    let response = h
        .app
        .clone()
        .oneshot(upload_request(form(Some(("broken.pptx", b"not a zip")), None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.starts_with("unreadable document"));
    assert!(h.catalog.requested.lock().unwrap().is_empty());
    assert!(h.storage.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_upload_aborts_remaining_uploads() {
    let h = harness(vec!["Arial", "Open Sans"], Some("Arial.zip"));
    let deck = two_font_deck();

    let response = h
        .app
        .clone()
        .oneshot(upload_request(form(Some(("deck.pptx", &deck)), None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("Arial.zip"));

    let uploads = h.storage.uploads.lock().unwrap();
    let names: Vec<_> = uploads.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["deck.pptx"]);
}

#[tokio::test]
async fn non_multipart_body_is_a_bad_request() {
    let h = harness(vec![], None);

    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("hello"))
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn index_shows_notice_once() {
    let h = harness(vec![], None);

    let request = Request::builder()
        .uri("/")
        .header(header::COOKIE, "flash=No%20selected%20file")
        .body(Body::empty())
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("flash=;"));
    let page = body_text(response).await;
    assert!(page.contains(r#"<p class="notice">No selected file</p>"#));
    assert!(page.contains(r#"name="document""#));

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let page = body_text(response).await;
    assert!(!page.contains("class=\"notice\""));
    assert!(!page.contains("{{notice}}"));
}
