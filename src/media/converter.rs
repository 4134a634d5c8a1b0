/// JPEG re-encoding of picked images
///
/// The picked file is decoded whatever its format (sniffed from content,
/// not the extension) and written back out as a JPEG in a transient
/// directory. Intermediate files are never cleaned up explicitly.

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::DEFAULT_JPEG_QUALITY;
use crate::state::data::{AssetRef, ConvertedAsset, RequestToken};

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("conversion task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("cannot encode JPEG: {0}")]
    Encode(#[from] image::ImageError),
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Image re-encoding engine
pub trait JpegConverter: Send + Sync {
    fn convert_to_jpeg(
        &self,
        token: RequestToken,
        asset: AssetRef,
    ) -> BoxFuture<'static, Result<ConvertedAsset, ConversionError>>;
}

/// Converter built on the `image` crate
#[derive(Debug, Clone)]
pub struct ImageJpegConverter {
    output_dir: PathBuf,
    quality: u8,
}

impl ImageJpegConverter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }
}

impl JpegConverter for ImageJpegConverter {
    fn convert_to_jpeg(
        &self,
        token: RequestToken,
        asset: AssetRef,
    ) -> BoxFuture<'static, Result<ConvertedAsset, ConversionError>> {
        let output_dir = self.output_dir.clone();
        let quality = self.quality;
        async move {
            // Decoding and encoding are CPU-bound
            tokio::task::spawn_blocking(move || {
                convert_blocking(asset.path(), &output_dir, token, quality)
            })
            .await?
        }
        .boxed()
    }
}

/// Transient directory for converted images
/// Returns ~/.cache/photo-uploader/converted on Linux, or the system temp
/// directory when no cache directory is known
pub fn default_output_dir() -> PathBuf {
    let mut path = dirs_next::cache_dir().unwrap_or_else(std::env::temp_dir);
    path.push("photo-uploader");
    path.push("converted");
    path
}

/// Blocking implementation of the conversion
fn convert_blocking(
    source: &Path,
    output_dir: &Path,
    token: RequestToken,
    quality: u8,
) -> Result<ConvertedAsset, ConversionError> {
    let reader = ImageReader::open(source)
        .map_err(|e| ConversionError::Open {
            path: source.to_path_buf(),
            source: e,
        })?
        .with_guessed_format()
        .map_err(|e| ConversionError::Open {
            path: source.to_path_buf(),
            source: e,
        })?;

    let decode_error = |e| ConversionError::Decode {
        path: source.to_path_buf(),
        source: e,
    };
    let mut decoder = reader.into_decoder().map_err(decode_error)?;
    let orientation = decoder.orientation().unwrap_or_else(|e| {
        tracing::debug!("No usable orientation in {}: {}", source.display(), e);
        Orientation::NoTransforms
    });
    let mut img = DynamicImage::from_decoder(decoder).map_err(decode_error)?;
    // The output carries no EXIF, so the rotation is baked into the pixels
    img.apply_orientation(orientation);

    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    fs::create_dir_all(output_dir).map_err(|e| ConversionError::Io {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let target = output_dir.join(format!("{}-{}.jpg", Utc::now().timestamp_millis(), token.0));
    let file = File::create(&target).map_err(|e| ConversionError::Io {
        path: target.clone(),
        source: e,
    })?;

    let mut writer = BufWriter::new(file);
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, quality))?;
    writer.into_inner().map_err(|e| ConversionError::Io {
        path: target.clone(),
        source: e.into_error(),
    })?;

    let bytes = fs::metadata(&target)
        .map_err(|e| ConversionError::Io {
            path: target.clone(),
            source: e,
        })?
        .len();

    tracing::info!(
        "📸 Converted {} → {} ({}x{}, {}KB)",
        source.display(),
        target.display(),
        width,
        height,
        bytes / 1024
    );

    Ok(ConvertedAsset {
        path: target,
        width,
        height,
        bytes,
    })
}
