/// Remote image hosting
///
/// `ImageHost` is the narrow contract the screen depends on: hand over a
/// converted JPEG, get back the hosted URL or an error. `cloudinary.rs`
/// implements it against Cloudinary's unsigned upload API.

pub mod cloudinary;

use futures::future::BoxFuture;
use std::path::PathBuf;
use thiserror::Error;

use crate::state::data::ConvertedAsset;

pub use cloudinary::CloudinaryHost;

/// Filename reported for the file part
pub const UPLOAD_FILE_NAME: &str = "upload.jpg";
/// Content type reported for the file part
pub const UPLOAD_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upload response is not JSON (HTTP {status}): {source}")]
    Json {
        status: u16,
        source: serde_json::Error,
    },
    #[error("upload response has no secure_url (HTTP {status}){}", remote_suffix(.message))]
    MissingSecureUrl {
        status: u16,
        /// `error.message` from the service, if it sent one
        message: Option<String>,
    },
}

fn remote_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

/// What the host reports about a stored image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub secure_url: String,
    pub public_id: Option<String>,
    pub format: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bytes: Option<u64>,
}

pub trait ImageHost: Send + Sync {
    fn upload(&self, asset: ConvertedAsset) -> BoxFuture<'static, Result<UploadReceipt, UploadError>>;
}
