use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::flash::{self, redirect_with_notice};
use crate::storage::is_allowed;
use crate::{pipeline, AppError, AppState};

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

pub const NO_FILE_PART: &str = "No file part";
pub const NO_SELECTED_FILE: &str = "No selected file";
pub const FILE_TYPE_NOT_ALLOWED: &str = "File type not allowed";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub fonts: Vec<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .with_state(state)
}

async fn index(headers: HeaderMap) -> Response {
    let notice = flash::take_notice(&headers);
    let rendered = match &notice {
        Some(text) => format!(r#"<p class="notice">{}</p>"#, flash::escape_html(text)),
        None => String::new(),
    };
    let page = Html(INDEX_TEMPLATE.replace("{{notice}}", &rendered));

    if notice.is_some() {
        ([(header::SET_COOKIE, flash::clear_cookie())], page).into_response()
    } else {
        page.into_response()
    }
}

/// A file part as received from the form.
struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut document: Option<UploadedFile> = None;
    let mut folder_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("document") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?.to_vec();
                document = Some(UploadedFile { filename, bytes });
            }
            Some("folder_id") => {
                folder_id = Some(field.text().await?.trim().to_string());
            }
            _ => {}
        }
    }

    let Some(document) = document else {
        return Ok(redirect_with_notice(&headers, NO_FILE_PART));
    };
    if document.filename.is_empty() {
        return Ok(redirect_with_notice(&headers, NO_SELECTED_FILE));
    }
    if !is_allowed(&document.filename) {
        return Ok(redirect_with_notice(&headers, FILE_TYPE_NOT_ALLOWED));
    }

    let path = state
        .uploads
        .save_document(&document.filename, &document.bytes)
        .await?;
    let summary = pipeline::run(&state, &path, folder_id.as_deref()).await?;

    Ok(Json(UploadResponse {
        message: "File successfully uploaded".into(),
        fonts: summary.fonts_found.to_vec(),
    })
    .into_response())
}
