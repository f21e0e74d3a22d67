//! The work done for one accepted upload: scan the saved deck, fetch the
//! fonts it uses, and push the deck and the packages to remote storage.

use fontpush_core::FontSet;
use std::path::{Path, PathBuf};

use crate::{AppError, AppState};

/// Outcome of a completed pipeline run.
#[derive(Debug, Clone)]
pub struct UploadSummary {
    pub document_id: String,
    pub fonts_found: FontSet,
    pub fonts_uploaded: Vec<String>,
}

/// Scan the fonts of the document at `path`.
///
/// Parsing is blocking work, so it runs on the blocking pool.
pub async fn scan_document(path: &Path) -> Result<FontSet, AppError> {
    let owned = path.to_path_buf();
    let fonts = tokio::task::spawn_blocking(move || fontpush_pptx::scan_file(&owned))
        .await
        .map_err(AppError::internal_server_error)??;
    Ok(fonts)
}

/// Run the pipeline for a saved document.
///
/// Every step completes before the next starts. Fonts the catalog cannot
/// supply are skipped; the first failed upload aborts the run.
pub async fn run(
    state: &AppState,
    document: &Path,
    folder_id: Option<&str>,
) -> Result<UploadSummary, AppError> {
    let folder_id = folder_id.filter(|id| !id.is_empty());

    let fonts_found = scan_document(document).await?;
    log::info!(
        "Found {} font(s) in {}: {:?}",
        fonts_found.len(),
        document.display(),
        fonts_found.to_vec()
    );

    let mut archives: Vec<(String, PathBuf)> = Vec::new();
    for family in fonts_found.iter() {
        let Some(archive) = state.fonts.fetch(family).await else {
            continue;
        };
        let path = state.uploads.save_archive(&archive).await?;
        archives.push((family.to_string(), path));
    }

    let document_id = state.storage.upload(document, folder_id).await?;

    let mut fonts_uploaded = Vec::with_capacity(archives.len());
    for (family, path) in archives {
        state.storage.upload(&path, folder_id).await?;
        fonts_uploaded.push(family);
    }

    log::info!(
        "Uploaded {} with {} font package(s)",
        document.display(),
        fonts_uploaded.len()
    );

    Ok(UploadSummary {
        document_id,
        fonts_found,
        fonts_uploaded,
    })
}
