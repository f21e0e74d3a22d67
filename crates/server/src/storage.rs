//! The local upload directory.
//!
//! Holds uploaded documents and the font packages fetched for them. Nothing
//! is removed after a request finishes.

use fontpush_core::FontArchive;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use unicode_normalization::UnicodeNormalization;

/// Characters kept in stored file names.
static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid regex"));

/// Extensions accepted for uploaded documents.
const ALLOWED_EXTENSIONS: &[&str] = &["pptx"];

/// Reduce a client-supplied file name to a safe, flat name.
///
/// Accented letters are decomposed (NFKD) so their base letter survives.
/// Path separators and whitespace become `_`, other characters outside
/// `[A-Za-z0-9_.-]` are dropped, and leading/trailing dots and underscores
/// are trimmed.
pub fn secure_filename(name: &str) -> String {
    let decomposed: String = name.nfkd().collect();
    let flat = decomposed.replace(['/', '\\'], " ");
    let joined = flat.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(&joined, "");
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Whether an uploaded file name has an accepted extension.
pub fn is_allowed(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| ALLOWED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Directory where documents and font packages are written.
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save an uploaded document under a sanitized name.
    ///
    /// An existing file is never overwritten; `deck.pptx` becomes
    /// `deck_1.pptx`, `deck_2.pptx`, and so on.
    pub async fn save_document(&self, filename: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.root).await?;

        let safe = secure_filename(filename);
        let safe = if safe.is_empty() { "upload".to_string() } else { safe };
        let (stem, ext) = match safe.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{}", ext)),
            _ => (safe.clone(), String::new()),
        };

        let mut suffix = 0usize;
        loop {
            let candidate = if suffix == 0 {
                self.root.join(&safe)
            } else {
                self.root.join(format!("{}_{}{}", stem, suffix, ext))
            };

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(mut file) => {
                    file.write_all(bytes).await?;
                    file.flush().await?;
                    log::info!("Saved upload to {}", candidate.display());
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(e),
            }
        }
    }

    /// Write a font package, replacing any earlier copy.
    pub async fn save_archive(&self, archive: &FontArchive) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.root).await?;
        let path = self.root.join(archive.file_name());
        fs::write(&path, &archive.bytes).await?;
        log::debug!("Saved font package to {}", path.display());
        Ok(path)
    }
}
