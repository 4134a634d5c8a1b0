use iced::{Size, Task};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod alert;
mod config;
mod media;
mod screen;
mod state;
mod upload;

use alert::DialogPresenter;
use config::UploadConfig;
use media::converter::{self, ImageJpegConverter};
use media::picker::DesktopLibrary;
use screen::{Screen, Services};
use upload::CloudinaryHost;

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // A broken config file should not keep the screen from opening
    let config = UploadConfig::load().unwrap_or_else(|e| {
        tracing::error!("⚠️  {}; using built-in upload settings", e);
        UploadConfig::default()
    });

    let output_dir = converter::default_output_dir();
    tracing::info!(
        "🎨 Image Uploader starting (cloud: {}, preset: {}, converted files in {})",
        config.cloud_name,
        config.upload_preset,
        output_dir.display()
    );

    let services = Services {
        library: Arc::new(DesktopLibrary::new()),
        converter: Arc::new(ImageJpegConverter::new(output_dir).with_quality(config.jpeg_quality)),
        host: Arc::new(CloudinaryHost::new(config)),
        alerts: Arc::new(DialogPresenter),
    };

    iced::application("Image Uploader", Screen::update, Screen::view)
        .theme(Screen::theme)
        .window_size(Size::new(480.0, 640.0))
        .centered()
        .run_with(move || (Screen::new(services), Task::none()))
}
