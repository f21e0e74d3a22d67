//! Outbound services: the font catalog and the Drive storage API.

pub mod credentials;
pub mod drive;
pub mod error;
pub mod fetcher;

pub use credentials::ServiceAccountKey;
pub use drive::{DriveClient, FileMetadata, RemoteStorage};
pub use error::{RemoteError, Result};
pub use fetcher::{FontFetcher, FontSource, DEFAULT_CATALOG_URL};
