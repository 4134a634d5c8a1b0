/// Upload configuration
///
/// Every value has a built-in default, so the app runs without any file on
/// disk. An optional `config.toml` in the user's config directory overrides
/// individual fields:
/// - Linux: ~/.config/photo-uploader/config.toml
/// - macOS: ~/Library/Application Support/photo-uploader/config.toml
/// - Windows: %APPDATA%\photo-uploader\config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Cloudinary account the uploads go to
pub const DEFAULT_CLOUD_NAME: &str = "dyxrfm7fh";
/// Unsigned upload preset configured on that account
pub const DEFAULT_UPLOAD_PRESET: &str = "expo-image-upload";
/// Cloudinary REST API root
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";
/// JPEG quality for the converted image (compress 1.0)
pub const DEFAULT_JPEG_QUALITY: u8 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    pub cloud_name: String,
    pub upload_preset: String,
    pub api_base: String,
    pub jpeg_quality: u8,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            cloud_name: DEFAULT_CLOUD_NAME.to_string(),
            upload_preset: DEFAULT_UPLOAD_PRESET.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl UploadConfig {
    /// Load from the default location, falling back to built-in values
    /// when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from an explicit path. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        tracing::info!("⚙️  Loaded config from {}", path.display());
        Ok(config)
    }

    /// Path of the optional config file
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("photo-uploader");
        path.push("config.toml");
        Some(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cloud_name.trim().is_empty() {
            return Err(ConfigError::Invalid("cloud_name must not be empty".into()));
        }
        if self.upload_preset.trim().is_empty() {
            return Err(ConfigError::Invalid("upload_preset must not be empty".into()));
        }
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api_base must be an http(s) URL, got {:?}",
                self.api_base
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    /// `POST` target for image uploads
    pub fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.api_base.trim_end_matches('/'),
            self.cloud_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_hosted_account() {
        let config = UploadConfig::default();
        assert_eq!(config.cloud_name, "dyxrfm7fh");
        assert_eq!(config.upload_preset, "expo-image-upload");
        assert_eq!(config.jpeg_quality, 100);
        assert_eq!(
            config.upload_url(),
            "https://api.cloudinary.com/v1_1/dyxrfm7fh/image/upload"
        );
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = UploadConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, UploadConfig::default());
    }

    #[test]
    fn test_file_overrides_individual_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "cloud_name = \"demo\"\njpeg_quality = 90\n").unwrap();

        let config = UploadConfig::load_from(&path).unwrap();
        assert_eq!(config.cloud_name, "demo");
        assert_eq!(config.jpeg_quality, 90);
        assert_eq!(config.upload_preset, DEFAULT_UPLOAD_PRESET);
        assert_eq!(
            config.upload_url(),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }

    #[test]
    fn test_rejects_out_of_range_quality() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "jpeg_quality = 0\n").unwrap();

        let err = UploadConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_key = \"secret\"\n").unwrap();

        let err = UploadConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_trailing_slash_in_api_base() {
        let config = UploadConfig {
            api_base: "http://127.0.0.1:9000/".into(),
            ..UploadConfig::default()
        };
        assert_eq!(
            config.upload_url(),
            "http://127.0.0.1:9000/v1_1/dyxrfm7fh/image/upload"
        );
    }
}
