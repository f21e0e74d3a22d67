//! Google Drive v3 uploads authenticated with a service account.
//!
//! Files are sent with the resumable upload protocol: a metadata request
//! opens an upload session, then the file body is PUT to the session URI.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

use crate::{RemoteError, Result, ServiceAccountKey};

/// OAuth scope limited to files created by this client.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Base URL of the Drive upload API.
pub const DEFAULT_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Remote storage for uploaded documents and font packages.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Upload the file at `path`, optionally into `folder_id`, and return
    /// the identifier assigned by the service.
    async fn upload(&self, path: &Path, folder_id: Option<&str>) -> Result<String>;
}

/// Metadata sent when creating a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

impl FileMetadata {
    /// Metadata for a local file: its base name, and the parent folder when
    /// one is given.
    pub fn for_path(path: &Path, folder_id: Option<&str>) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parents = folder_id
            .filter(|id| !id.is_empty())
            .map(|id| vec![id.to_string()])
            .unwrap_or_default();
        Self { name, parents }
    }
}

/// MIME type announced for an uploaded file.
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pptx") => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct CreatedFile {
    id: String,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Drive client holding the process-wide service account identity.
pub struct DriveClient {
    http: reqwest::Client,
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    upload_url: String,
    token: Mutex<Option<AccessToken>>,
}

impl DriveClient {
    /// Create a client. Fails if the private key is not a valid RSA PEM.
    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| RemoteError::Credentials(format!("Bad private key: {}", e)))?;
        Ok(Self {
            http: reqwest::Client::new(),
            key,
            signing_key,
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            token: Mutex::new(None),
        })
    }

    /// Point uploads at another API base URL.
    pub fn with_upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = url.into();
        self
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// A bearer token, reused until shortly before it expires.
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.request_token().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    fn assertion(&self) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| RemoteError::Credentials(format!("System clock error: {}", e)))?
            .as_secs();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: DRIVE_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|e| RemoteError::Credentials(format!("Signing assertion failed: {}", e)))
    }

    async fn request_token(&self) -> Result<AccessToken> {
        let assertion = self.assertion()?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Token(format!("{}: {}", status, body)));
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS));
        log::debug!("Obtained access token for {}", self.key.client_email);
        Ok(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}

#[async_trait]
impl RemoteStorage for DriveClient {
    async fn upload(&self, path: &Path, folder_id: Option<&str>) -> Result<String> {
        let metadata = FileMetadata::for_path(path, folder_id);
        let mime_type = mime_type_for(path);
        let body = tokio::fs::read(path).await?;
        let token = self.access_token().await?;

        let session = self
            .http
            .post(format!("{}/files", self.upload_url))
            .query(&[("uploadType", "resumable"), ("fields", "id")])
            .bearer_auth(&token)
            .header("X-Upload-Content-Type", mime_type)
            .header("X-Upload-Content-Length", body.len().to_string())
            .json(&metadata)
            .send()
            .await?;
        let session = ensure_success(session, &metadata.name).await?;

        let session_uri = session
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| RemoteError::Upload {
                name: metadata.name.clone(),
                status: session.status().as_u16(),
                body: "missing upload session location".into(),
            })?;

        let response = self
            .http
            .put(&session_uri)
            .bearer_auth(&token)
            .header(CONTENT_TYPE, mime_type)
            .body(body)
            .send()
            .await?;
        let response = ensure_success(response, &metadata.name).await?;

        let created: CreatedFile = response.json().await?;
        log::info!("Uploaded '{}' as {}", metadata.name, created.id);
        Ok(created.id)
    }
}

async fn ensure_success(response: reqwest::Response, name: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Upload {
        name: name.to_string(),
        status: status.as_u16(),
        body,
    })
}
