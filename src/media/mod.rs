/// Device-side adapters
///
/// This module handles:
/// - Media-library permission and the native picker (picker.rs)
/// - Re-encoding picked images to JPEG (converter.rs)

pub mod converter;
pub mod picker;
