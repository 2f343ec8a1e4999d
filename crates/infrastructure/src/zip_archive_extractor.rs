use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use outpost_application::ArchiveExtractor;
use outpost_core::{AppError, AppResult};
use zip::ZipArchive;

/// Zip implementation of the archive extractor.
///
/// Entries whose names would escape the destination are rejected by the
/// zip reader itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveExtractor;

impl ZipArchiveExtractor {
    /// Creates an extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ArchiveExtractor for ZipArchiveExtractor {
    async fn extract(&self, archive: Vec<u8>, destination: &Path) -> AppResult<()> {
        let destination = destination.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let mut archive = ZipArchive::new(Cursor::new(archive))
                .map_err(|error| AppError::Validation(format!("invalid job archive: {error}")))?;
            archive.extract(&destination).map_err(|error| {
                AppError::Io(format!(
                    "failed to unpack job archive into '{}': {error}",
                    destination.display()
                ))
            })
        })
        .await
        .map_err(|error| AppError::Internal(format!("archive extraction task failed: {error}")))?
    }
}
