use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Key of the last YouTube recommendations.
pub const YOUTUBE_RECOMMENDATIONS_KEY: &str = "careernav_youtube_recommendations";
/// Key of the last generated timeline.
pub const TIMELINE_KEY: &str = "careernav_timeline";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid cache key '{0}': use ASCII letters, digits, '_' or '-'")]
    InvalidKey(String),
}

/// File-backed store for recommendations that should survive a restart.
///
/// One JSON file per key. Entries that no longer decode are deleted on read.
#[derive(Debug, Clone)]
pub struct RecommendationCache {
    dir: PathBuf,
}

impl RecommendationCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let path = self.path(key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Dropping corrupted cache entry '{key}': {e}");
                self.clear(key).await?;
                Ok(None)
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path(key)?, bytes).await?;
        Ok(())
    }

    pub async fn clear(&self, key: &str) -> Result<(), CacheError> {
        match tokio::fs::remove_file(self.path(key)?).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Keys map to file names one to one, so anything that would need
    /// escaping is refused rather than rewritten.
    fn path(&self, key: &str) -> Result<PathBuf, CacheError> {
        let safe = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !safe {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}
