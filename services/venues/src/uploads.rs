//! Local storage for venue images

use anyhow::{Context, Result};
use chrono::Utc;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

/// URL prefix under which stored images are served
pub const PUBLIC_PREFIX: &str = "/uploads/";

/// Image files kept in a local directory and served under `/uploads`
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if missing
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create upload directory {:?}", self.dir))
    }

    /// Store an image under a unique name and return its public path
    pub async fn save(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<String> {
        self.ensure_dir().await?;

        let file_name = match original_name.and_then(extension) {
            Some(ext) => format!("{}-{}.{}", Utc::now().timestamp_millis(), Uuid::new_v4(), ext),
            None => format!("{}-{}", Utc::now().timestamp_millis(), Uuid::new_v4()),
        };

        let path = self.dir.join(&file_name);
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write image {:?}", path))?;

        info!("Stored image {} ({} bytes)", file_name, bytes.len());
        Ok(format!("{PUBLIC_PREFIX}{file_name}"))
    }

    /// Remove a stored image by its public path; missing files are ignored
    pub async fn remove(&self, public_path: &str) -> Result<()> {
        let Some(file_name) = stored_file_name(public_path) else {
            return Ok(());
        };

        match fs::remove_file(self.dir.join(file_name)).await {
            Ok(()) => {
                info!("Removed image {}", file_name);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Image {} already gone", file_name);
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to remove image {}", file_name)),
        }
    }
}

/// Sanitized extension of a client file name
fn extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// File name of a stored image, rejecting anything outside the upload directory
fn stored_file_name(public_path: &str) -> Option<&str> {
    let name = public_path.strip_prefix(PUBLIC_PREFIX)?;
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        return None;
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> ImageStore {
        ImageStore::new(std::env::temp_dir().join(format!("venue-uploads-{}", Uuid::new_v4())))
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let store = temp_store();

        let path = store.save(Some("hall.JPG"), b"jpeg-bytes").await.unwrap();
        assert!(path.starts_with(PUBLIC_PREFIX));
        assert!(path.ends_with(".jpg"));

        let on_disk = store.dir().join(path.trim_start_matches(PUBLIC_PREFIX));
        assert_eq!(fs::read(&on_disk).await.unwrap(), b"jpeg-bytes");

        store.remove(&path).await.unwrap();
        assert!(!on_disk.exists());

        // Second removal is a no-op
        store.remove(&path).await.unwrap();

        let _ = fs::remove_dir_all(store.dir()).await;
    }

    #[tokio::test]
    async fn test_unique_names() {
        let store = temp_store();

        let a = store.save(Some("a.png"), b"1").await.unwrap();
        let b = store.save(Some("a.png"), b"2").await.unwrap();
        assert_ne!(a, b);

        let _ = fs::remove_dir_all(store.dir()).await;
    }

    #[test]
    fn test_stored_file_name_rejects_traversal() {
        assert_eq!(stored_file_name("/uploads/a.jpg"), Some("a.jpg"));
        assert_eq!(stored_file_name("/uploads/../secret"), None);
        assert_eq!(stored_file_name("/uploads/sub/a.jpg"), None);
        assert_eq!(stored_file_name("https://cdn.example.com/a.jpg"), None);
        assert_eq!(stored_file_name(""), None);
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("photo.jpeg"), Some("jpeg".to_string()));
        assert_eq!(extension("noext"), None);
        assert_eq!(extension("evil.p/hp"), None);
    }
}
