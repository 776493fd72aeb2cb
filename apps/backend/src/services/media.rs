//! Local storage for downloaded audio and images.

use std::path::PathBuf;

use chrono::Utc;
use forge_core::{CollaboratorError, MediaKind, MediaRef};

#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Delete files this store wrote. Paths outside the media dir are left alone.
    ///
    /// Returns how many files were removed; failures are only logged.
    pub async fn discard<'a>(&self, media: impl IntoIterator<Item = &'a MediaRef>) -> usize {
        let mut removed = 0;
        for media in media {
            if !media.path.starts_with(&self.dir) {
                continue;
            }
            match tokio::fs::remove_file(&media.path).await {
                Ok(()) => removed += 1,
                Err(err) => {
                    tracing::warn!(error = %err, path = %media.path.display(), "could not delete media file")
                }
            }
        }
        removed
    }

    /// Write `bytes` as `<word>_<timestamp>.<extension>` and reference it.
    pub async fn save(
        &self,
        kind: MediaKind,
        word: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<MediaRef, CollaboratorError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CollaboratorError::Transport(format!("media dir: {}", e)))?;

        let file_name = format!(
            "{}_{}.{}",
            file_stem(word),
            Utc::now().format("%Y%m%d%H%M%S%3f"),
            extension
        );
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| CollaboratorError::Transport(format!("write {}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "media saved");
        Ok(MediaRef::new(kind, path))
    }
}

/// File-name-safe form of a word; umlauts are kept.
pub fn file_stem(word: &str) -> String {
    let stem: String = word
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "card".to_string()
    } else {
        stem
    }
}
