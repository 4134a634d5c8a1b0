/// Screen session state machine
///
/// `Session` owns the three pieces of screen state (selected asset,
/// converted asset, upload-in-flight flag) and decides what happens next
/// when an adapter completes. It does no I/O itself; the screen turns the
/// returned reactions into tasks and dialogs.
///
/// Phases are derived from the fields:
/// Idle → Selected (picked, converting) → Ready (converted) → Uploading → Ready

use std::fmt::Display;

use super::data::{Alert, AssetRef, ConvertedAsset, RequestToken, StatusLine};
use crate::media::picker::PickOutcome;
use crate::upload::UploadReceipt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Selected,
    Ready,
    Uploading,
}

/// What the screen should do after a pick completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickReaction {
    /// Start converting `asset`; the result must come back with `token`
    Convert(RequestToken, AssetRef),
    Alert(Alert),
    Nothing,
}

/// How a conversion result was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionReaction {
    Applied,
    Failed,
    /// A newer pick superseded this attempt; the result was dropped
    Stale,
}

#[derive(Debug, Default)]
pub struct Session {
    selected: Option<AssetRef>,
    converted: Option<ConvertedAsset>,
    upload_in_flight: bool,
    /// Last token handed out
    last_token: u64,
    /// Conversion whose result is still wanted
    pending_conversion: Option<RequestToken>,
    status: StatusLine,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.upload_in_flight {
            Phase::Uploading
        } else if self.converted.is_some() {
            Phase::Ready
        } else if self.selected.is_some() {
            Phase::Selected
        } else {
            Phase::Idle
        }
    }

    pub fn selected(&self) -> Option<&AssetRef> {
        self.selected.as_ref()
    }

    pub fn converted(&self) -> Option<&ConvertedAsset> {
        self.converted.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.upload_in_flight
    }

    pub fn is_converting(&self) -> bool {
        self.pending_conversion.is_some()
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    /// The one real guard: nothing to send, or already sending
    pub fn upload_enabled(&self) -> bool {
        self.converted.is_some() && !self.upload_in_flight
    }

    /// Handle the outcome of a permission request + picker session
    pub fn accept_pick(&mut self, outcome: PickOutcome) -> PickReaction {
        match outcome {
            PickOutcome::PermissionDenied => PickReaction::Alert(Alert::permission_required()),
            PickOutcome::Cancelled => PickReaction::Nothing,
            PickOutcome::Picked(asset) => {
                self.last_token += 1;
                let token = RequestToken(self.last_token);

                self.selected = Some(asset.clone());
                // The old JPEG no longer matches the selection
                self.converted = None;
                self.pending_conversion = Some(token);
                self.status = StatusLine::Info(format!("Converting {}...", asset.display_name()));

                PickReaction::Convert(token, asset)
            }
        }
    }

    /// Handle a finished conversion
    pub fn accept_conversion(
        &mut self,
        token: RequestToken,
        result: Result<ConvertedAsset, impl Display>,
    ) -> ConversionReaction {
        if self.pending_conversion != Some(token) {
            tracing::debug!("Dropping conversion {} (superseded)", token);
            return ConversionReaction::Stale;
        }
        self.pending_conversion = None;

        match result {
            Ok(converted) => {
                self.status = StatusLine::Info(format!(
                    "Ready to upload ({}x{}, {}KB)",
                    converted.width,
                    converted.height,
                    converted.bytes / 1024
                ));
                self.converted = Some(converted);
                ConversionReaction::Applied
            }
            Err(e) => {
                tracing::error!("Image conversion failed: {}", e);
                let name = self
                    .selected
                    .as_ref()
                    .map(AssetRef::display_name)
                    .unwrap_or_default();
                self.status = StatusLine::Error(format!("Could not convert {}", name));
                ConversionReaction::Failed
            }
        }
    }

    /// Mark an upload as started. Returns the asset to send, or `None` when
    /// the upload control is disabled.
    pub fn begin_upload(&mut self) -> Option<ConvertedAsset> {
        if !self.upload_enabled() {
            return None;
        }
        self.upload_in_flight = true;
        self.status = StatusLine::Info("Uploading...".into());
        self.converted.clone()
    }

    /// Finish an upload, whatever its outcome, and pick the alert to show
    pub fn finish_upload(&mut self, result: Result<UploadReceipt, impl Display>) -> Alert {
        self.upload_in_flight = false;

        match result {
            Ok(receipt) => {
                tracing::info!(
                    public_id = receipt.public_id.as_deref().unwrap_or("-"),
                    format = receipt.format.as_deref().unwrap_or("-"),
                    width = receipt.width,
                    height = receipt.height,
                    bytes = receipt.bytes,
                    "✅ Upload success: {}",
                    receipt.secure_url
                );
                self.status = StatusLine::Info(format!("Uploaded to {}", receipt.secure_url));
                Alert::upload_succeeded(&receipt.secure_url)
            }
            Err(e) => {
                tracing::error!("Upload failed: {}", e);
                self.status = StatusLine::Error("Upload failed".into());
                Alert::upload_failed()
            }
        }
    }
}
