/// Media-library access and the native photo picker
///
/// `request_and_pick` is the single entry point: it asks for permission
/// first and only opens the picker once access is granted.

use futures::future::{BoxFuture, FutureExt};
use rfd::AsyncFileDialog;
use std::path::PathBuf;

use crate::state::data::AssetRef;

/// Image extensions the picker offers (everything the `image` crate decodes)
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff", "ico", "tga", "pnm", "qoi",
];

/// Outcome of a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Images,
}

/// What the picker is asked to show
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickerRequest {
    pub media: MediaKind,
    /// 1.0 = hand back the original file, no client-side compression
    pub quality: f32,
    pub allow_multiple: bool,
}

impl Default for PickerRequest {
    fn default() -> Self {
        Self {
            media: MediaKind::Images,
            quality: 1.0,
            allow_multiple: false,
        }
    }
}

/// Result of `request_and_pick`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Picked(AssetRef),
    Cancelled,
    PermissionDenied,
}

/// Platform media library: permission gate plus picker dialog
pub trait MediaLibrary: Send + Sync {
    fn request_permission(&self) -> BoxFuture<'static, Permission>;

    /// `None` when the user dismisses the picker without choosing
    fn open_picker(&self, request: PickerRequest) -> BoxFuture<'static, Option<AssetRef>>;
}

/// Ask for access, then let the user choose one image
pub async fn request_and_pick(library: &dyn MediaLibrary) -> PickOutcome {
    if library.request_permission().await == Permission::Denied {
        tracing::warn!("🔒 Media library permission denied");
        return PickOutcome::PermissionDenied;
    }

    match library.open_picker(PickerRequest::default()).await {
        Some(asset) => {
            tracing::info!("🖼️  Picked {}", asset.path().display());
            PickOutcome::Picked(asset)
        }
        None => {
            tracing::debug!("Picker dismissed without a selection");
            PickOutcome::Cancelled
        }
    }
}

/// Desktop media library backed by the user's pictures directory and
/// the native file dialog
#[derive(Debug, Clone)]
pub struct DesktopLibrary {
    root: Option<PathBuf>,
}

impl DesktopLibrary {
    pub fn new() -> Self {
        Self {
            root: dirs::picture_dir().or_else(dirs::home_dir),
        }
    }
}

impl Default for DesktopLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaLibrary for DesktopLibrary {
    fn request_permission(&self) -> BoxFuture<'static, Permission> {
        let root = self.root.clone();
        async move {
            let Some(root) = root else {
                // Nothing to check; the dialog can still browse anywhere
                return Permission::Granted;
            };
            check_access(root).await
        }
        .boxed()
    }

    fn open_picker(&self, request: PickerRequest) -> BoxFuture<'static, Option<AssetRef>> {
        let root = self.root.clone();
        async move {
            debug_assert!(!request.allow_multiple, "multi-select is not supported");
            tracing::debug!(quality = request.quality, "Opening image picker");
            let mut dialog = AsyncFileDialog::new().set_title("Select Image");
            if request.media == MediaKind::Images {
                dialog = dialog.add_filter("Images", IMAGE_EXTENSIONS);
            }
            if let Some(root) = root {
                dialog = dialog.set_directory(root);
            }

            let handle = dialog.pick_file().await?;
            Some(AssetRef::new(handle.path().to_path_buf()))
        }
        .boxed()
    }
}

/// Reading the library root is the desktop equivalent of the media
/// permission: only an explicit access error counts as a denial.
async fn check_access(root: PathBuf) -> Permission {
    match tokio::fs::read_dir(&root).await {
        Ok(_) => Permission::Granted,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            tracing::warn!("No read access to {}: {}", root.display(), e);
            Permission::Denied
        }
        Err(e) => {
            tracing::debug!("Could not read {}: {}", root.display(), e);
            Permission::Granted
        }
    }
}
