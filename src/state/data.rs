/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the adapters (picker, converter, uploader) and the UI layer.

use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque reference to a locally stored image file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    path: PathBuf,
}

impl AssetRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Filename only (e.g., "IMG_0001.HEIC"), for status messages
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// JPEG re-encoding of a selected asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedAsset {
    /// Where the JPEG was written
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Size of the encoded file on disk
    pub bytes: u64,
}

/// Identifies one pick-then-convert attempt.
///
/// Tokens increase monotonically within a session; only the most recent
/// one is allowed to publish a conversion result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Blocking, modal message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub body: Option<String>,
    pub level: AlertLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
}

impl Alert {
    pub fn permission_required() -> Self {
        Self {
            title: "Permission required".into(),
            body: Some("Please allow photo access.".into()),
            level: AlertLevel::Warning,
        }
    }

    /// The hosted URL is shown verbatim
    pub fn upload_succeeded(secure_url: &str) -> Self {
        Self {
            title: "✅ Upload successful".into(),
            body: Some(secure_url.to_string()),
            level: AlertLevel::Info,
        }
    }

    pub fn upload_failed() -> Self {
        Self {
            title: "❌ Upload failed".into(),
            body: None,
            level: AlertLevel::Error,
        }
    }
}

/// One-line status shown under the buttons (non-blocking)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusLine {
    #[default]
    Empty,
    Info(String),
    Error(String),
}

impl StatusLine {
    pub fn text(&self) -> &str {
        match self {
            StatusLine::Empty => "",
            StatusLine::Info(text) | StatusLine::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, StatusLine::Error(_))
    }
}
