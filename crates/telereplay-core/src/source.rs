//! Where raw log text comes from.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::SourceError;

/// Supplies a full log payload as text.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn read_text(&self) -> Result<String, SourceError>;

    /// Short label for logs.
    fn describe(&self) -> String;
}

/// Reads a log file from disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LogSource for FileSource {
    async fn read_text(&self) -> Result<String, SourceError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        // Strip a UTF-8 byte order mark so the first line's prefix still parses.
        let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
        String::from_utf8(body.to_vec()).map_err(|_| SourceError::NotUtf8 {
            path: self.path.clone(),
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// An in-memory log.
#[derive(Debug, Clone, Default)]
pub struct TextSource {
    text: String,
}

impl TextSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl LogSource for TextSource {
    async fn read_text(&self) -> Result<String, SourceError> {
        Ok(self.text.clone())
    }

    fn describe(&self) -> String {
        format!("<memory, {} bytes>", self.text.len())
    }
}
