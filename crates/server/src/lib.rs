//! HTTP front end for collecting a deck's fonts and pushing the deck and
//! font packages to remote storage.

pub mod config;
pub mod error;
pub mod flash;
pub mod pipeline;
pub mod routes;
pub mod storage;

use fontpush_remote::{FontSource, RemoteStorage};
use std::sync::Arc;

pub use config::ServerConfig;
pub use error::AppError;
pub use pipeline::UploadSummary;
pub use routes::build_router;
pub use storage::UploadDir;

/// Default request body limit for uploads.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Services shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub uploads: UploadDir,
    pub fonts: Arc<dyn FontSource>,
    pub storage: Arc<dyn RemoteStorage>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        uploads: UploadDir,
        fonts: Arc<dyn FontSource>,
        storage: Arc<dyn RemoteStorage>,
    ) -> Self {
        Self {
            uploads,
            fonts,
            storage,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = limit;
        self
    }
}
