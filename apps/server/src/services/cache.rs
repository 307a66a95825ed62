// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Disk-based upload store using cacache.
//!
//! Uploaded files are stored under the SHA-256 of their content; a small
//! JSON record next to each holds the original filename.

use crate::error::ApiError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Metadata stored alongside an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub filename: String,
    pub size: usize,
}

/// Content-addressable disk cache.
#[derive(Debug, Clone)]
pub struct DiskCache {
    cache_dir: PathBuf,
}

impl DiskCache {
    /// Create a new cache in the specified directory.
    pub async fn new(cache_dir: &str) -> Self {
        let path = PathBuf::from(cache_dir);

        if let Err(e) = tokio::fs::create_dir_all(&path).await {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "Failed to create cache directory"
            );
        }

        Self { cache_dir: path }
    }

    /// Generate a cache key from file content (SHA256 hash).
    pub fn generate_key(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// File keys are lowercase hex SHA-256 digests.
    pub fn is_valid_key(key: &str) -> bool {
        key.len() == 64 && key.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    fn metadata_key(key: &str) -> String {
        format!("{}.meta", key)
    }

    /// Get a cached value by key.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ApiError> {
        match self.get_bytes(key).await? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// Set a cached value.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ApiError> {
        let data = serde_json::to_vec(value)?;
        self.set_bytes(key, &data).await
    }

    /// Check if a key exists in the cache.
    pub async fn has(&self, key: &str) -> bool {
        matches!(cacache::metadata(&self.cache_dir, key).await, Ok(Some(_)))
    }

    /// Get raw bytes from cache.
    pub async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, ApiError> {
        match cacache::read(&self.cache_dir, key).await {
            Ok(data) => Ok(Some(data)),
            Err(cacache::Error::EntryNotFound(_, _)) => Ok(None),
            Err(e) => Err(ApiError::Cache(e.to_string())),
        }
    }

    /// Set raw bytes in cache.
    pub async fn set_bytes(&self, key: &str, data: &[u8]) -> Result<(), ApiError> {
        cacache::write(&self.cache_dir, key, data).await?;
        tracing::debug!(key = %key, size = data.len(), "Cached raw bytes");
        Ok(())
    }

    /// Store an uploaded file and its metadata; returns the file key.
    pub async fn store_file(&self, filename: &str, data: &[u8]) -> Result<String, ApiError> {
        let key = Self::generate_key(data);
        if self.has(&key).await {
            tracing::info!(file_key = %key, "Upload already cached");
        } else {
            self.set_bytes(&key, data).await?;
        }
        let record = StoredFile {
            filename: filename.to_string(),
            size: data.len(),
        };
        self.set(&Self::metadata_key(&key), &record).await?;
        Ok(key)
    }

    /// Content of an uploaded file, or NotFound.
    pub async fn load_file(&self, key: &str) -> Result<Vec<u8>, ApiError> {
        if !Self::is_valid_key(key) {
            return Err(ApiError::NotFound(format!("File not found: {}", key)));
        }
        self.get_bytes(key)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("File not found: {}", key)))
    }

    /// Metadata of an uploaded file, if recorded.
    pub async fn file_metadata(&self, key: &str) -> Result<Option<StoredFile>, ApiError> {
        self.get(&Self::metadata_key(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_sha256_hex() {
        let key = DiskCache::generate_key(b"ISO-10303-21;");
        assert_eq!(key.len(), 64);
        assert!(DiskCache::is_valid_key(&key));
        assert_eq!(key, DiskCache::generate_key(b"ISO-10303-21;"));
        assert_ne!(key, DiskCache::generate_key(b"ISO-10303-21; "));
        assert_eq!(
            DiskCache::generate_key(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(!DiskCache::is_valid_key("../etc/passwd"));
        assert!(!DiskCache::is_valid_key(&"A".repeat(64)));
        assert!(!DiskCache::is_valid_key("abc"));
    }

    #[tokio::test]
    async fn stores_and_loads_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path().to_str().unwrap()).await;

        let key = cache.store_file("road.ifc", b"ISO-10303-21;").await.unwrap();
        assert!(cache.has(&key).await);
        assert_eq!(cache.load_file(&key).await.unwrap(), b"ISO-10303-21;");
        assert_eq!(
            cache.file_metadata(&key).await.unwrap(),
            Some(StoredFile {
                filename: "road.ifc".into(),
                size: 13,
            })
        );

        let missing = DiskCache::generate_key(b"other");
        assert!(matches!(
            cache.load_file(&missing).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
