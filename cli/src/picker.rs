//! Stands in for the device media picker: the user names a file up front and
//! the next `ImagePicker` effect "picks" it.

use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use shared::capabilities::{
    ImageFormat, PickConfig, PickedAsset, PickerError, PickerOutput, PickerResult,
    MAX_IMAGE_SIZE_BYTES,
};
use tokio::sync::Mutex;
use url::Url;

#[async_trait]
pub trait MediaPicker: Send + Sync {
    async fn pick(&self, config: PickConfig) -> PickerResult;
}

#[derive(Debug, Default)]
pub struct PathPicker {
    next: Mutex<Option<PathBuf>>,
}

impl PathPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The file the next pick returns. Without one, a pick is cancelled.
    pub async fn set_next(&self, path: impl Into<PathBuf>) {
        *self.next.lock().await = Some(path.into());
    }
}

#[async_trait]
impl MediaPicker for PathPicker {
    async fn pick(&self, config: PickConfig) -> PickerResult {
        let Some(path) = self.next.lock().await.take() else {
            tracing::debug!("no image queued, cancelling pick");
            return Ok(PickerOutput::Cancelled);
        };
        // Compression is left to the platform picker; the file is sent as is.
        tracing::debug!(path = %path.display(), quality = config.quality, "picking image");

        let path = tokio::fs::canonicalize(&path).await.map_err(|e| match e.kind() {
            IoErrorKind::PermissionDenied => PickerError::PermissionDenied,
            _ => PickerError::InvalidImage {
                reason: format!("{}: {e}", path.display()),
            },
        })?;

        let size = tokio::fs::metadata(&path)
            .await
            .map_err(|e| PickerError::Internal {
                message: e.to_string(),
            })?
            .len();
        if size > MAX_IMAGE_SIZE_BYTES {
            return Err(PickerError::ImageTooLarge {
                size,
                max: MAX_IMAGE_SIZE_BYTES,
            });
        }

        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| PickerError::Internal {
                message: e.to_string(),
            })?;
        let format = ImageFormat::from_magic_bytes(&data).ok_or_else(|| PickerError::InvalidImage {
            reason: "not a JPEG, PNG, HEIC or WebP file".to_string(),
        })?;

        let uri = Url::from_file_path(&path).map_err(|()| PickerError::Internal {
            message: format!("{} has no file URI", path.display()),
        })?;

        Ok(PickerOutput::Picked(
            PickedAsset::new(uri.to_string(), data)
                .with_mime_type(format.mime_type())
                .with_file_size(size),
        ))
    }
}
