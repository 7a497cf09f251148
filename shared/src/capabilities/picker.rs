use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_IMAGE_SIZE_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MediaType {
    #[default]
    Images,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Heic,
    WebP,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Heic => "image/heic",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Sniffs the container from the first 12 bytes of a file.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(ImageFormat::Png);
        }

        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        if &data[4..8] == b"ftyp" {
            let brand = &data[8..12];
            if brand == b"heic" || brand == b"heix" || brand == b"mif1" {
                return Some(ImageFormat::Heic);
            }
        }

        None
    }
}

/// What the shell's picker is asked to do.
///
/// `quality` is the 0-1 compression factor handed to the platform picker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickConfig {
    pub media_type: MediaType,
    pub quality: f32,
    pub allow_editing: bool,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            media_type: MediaType::Images,
            quality: crate::DEFAULT_PICKER_QUALITY,
            allow_editing: false,
        }
    }
}

impl PickConfig {
    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self.validated()
    }

    pub fn validated(mut self) -> Self {
        if !self.quality.is_finite() {
            self.quality = crate::DEFAULT_PICKER_QUALITY;
        }
        self.quality = self.quality.clamp(0.0, 1.0);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PickerOperation {
    PickImage { config: PickConfig },
}

impl Operation for PickerOperation {
    type Output = PickerResult;
}

/// A picked image: the local URI the shell shows and the file's bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickedAsset {
    pub uri: String,
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
    pub mime_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub file_size: Option<u64>,
}

impl std::fmt::Debug for PickedAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickedAsset")
            .field("uri", &self.uri)
            .field("data_len", &self.data.len())
            .field("mime_type", &self.mime_type)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("file_size", &self.file_size)
            .finish()
    }
}

impl PickedAsset {
    pub fn new(uri: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            uri: uri.into(),
            data,
            mime_type: None,
            width: None,
            height: None,
            file_size: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_file_size(mut self, size: u64) -> Self {
        self.file_size = Some(size);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickerOutput {
    Picked(PickedAsset),
    Cancelled,
}

impl PickerOutput {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PickerOutput::Cancelled)
    }

    pub fn into_asset(self) -> Option<PickedAsset> {
        match self {
            PickerOutput::Picked(asset) => Some(asset),
            PickerOutput::Cancelled => None,
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum PickerError {
    #[error("media library permission denied")]
    PermissionDenied,

    #[error("picker unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("image too large: {size} bytes exceeds maximum of {max} bytes")]
    ImageTooLarge { size: u64, max: u64 },

    #[error("invalid image: {reason}")]
    InvalidImage { reason: String },

    #[error("operation cancelled - another picker is already open")]
    Busy,

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl PickerError {
    pub fn is_permission_error(&self) -> bool {
        matches!(self, PickerError::PermissionDenied)
    }
}

pub type PickerResult = Result<PickerOutput, PickerError>;

/// The platform media-library picker.
pub struct ImagePicker<Ev> {
    context: CapabilityContext<PickerOperation, Ev>,
}

impl<Ev> Capability<Ev> for ImagePicker<Ev> {
    type Operation = PickerOperation;
    type MappedSelf<MappedEv> = ImagePicker<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        ImagePicker::new(self.context.map_event(f))
    }
}

impl<Ev> ImagePicker<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<PickerOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn pick_image<F>(&self, config: PickConfig, callback: F)
    where
        F: FnOnce(PickerResult) -> Ev + Send + 'static,
    {
        let operation = PickerOperation::PickImage {
            config: config.validated(),
        };
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(callback(result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_format_detection() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01];
        assert_eq!(ImageFormat::from_magic_bytes(&jpeg), Some(ImageFormat::Jpeg));

        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D];
        assert_eq!(ImageFormat::from_magic_bytes(&png), Some(ImageFormat::Png));

        let webp = *b"RIFF\0\0\0\0WEBP";
        assert_eq!(ImageFormat::from_magic_bytes(&webp), Some(ImageFormat::WebP));

        let heic = *b"\0\0\0\x18ftypheic";
        assert_eq!(ImageFormat::from_magic_bytes(&heic), Some(ImageFormat::Heic));
    }

    #[test]
    fn test_image_format_detection_rejects_other_files() {
        assert_eq!(ImageFormat::from_magic_bytes(b"hello world!"), None);
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8]), None);
    }

    #[test]
    fn test_pick_config_defaults_to_point_seven() {
        let config = PickConfig::default();
        assert_eq!(config.media_type, MediaType::Images);
        assert!((config.quality - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_pick_config_quality_clamped() {
        assert!((PickConfig::default().with_quality(1.5).quality - 1.0).abs() < f32::EPSILON);
        assert!(PickConfig::default().with_quality(-0.2).quality.abs() < f32::EPSILON);

        let nan = PickConfig::default().with_quality(f32::NAN);
        assert!((nan.quality - crate::DEFAULT_PICKER_QUALITY).abs() < f32::EPSILON);
    }

    #[test]
    fn test_picker_output_helpers() {
        let picked = PickerOutput::Picked(PickedAsset::new("file:///a.jpg", vec![0xFF, 0xD8]));
        assert!(!picked.is_cancelled());
        assert_eq!(picked.into_asset().unwrap().uri, "file:///a.jpg");
        assert!(PickerOutput::Cancelled.into_asset().is_none());
    }

    #[test]
    fn test_picked_asset_debug_omits_bytes() {
        let asset = PickedAsset::new("file:///a.jpg", vec![7; 4096]).with_mime_type("image/jpeg");
        let printed = format!("{asset:?}");
        assert!(printed.contains("data_len: 4096"));
        assert!(printed.len() < 256);
    }

    #[test]
    fn test_picker_error_helpers() {
        assert!(PickerError::PermissionDenied.is_permission_error());
        assert!(!PickerError::Busy.is_permission_error());
    }
}
