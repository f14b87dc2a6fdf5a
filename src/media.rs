use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Image extensions we accept for upload, compared case-insensitively.
/// The stored filename keeps the caller's original casing.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Filename has no extension: {0}")]
    MissingExtension(String),

    #[error("Unsupported image type: .{0}")]
    UnsupportedExtension(String),

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

/// On-disk store for uploaded recipe images.
///
/// Uploads are renamed to a timestamp (sortable, collision-resistant down to
/// the microsecond) plus the original file's extension, so the user-supplied
/// filename never reaches the filesystem.
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, MediaError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(MediaStore { root })
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Writes `data` under a timestamp-derived name and returns that name.
    pub fn save(&self, original_name: &str, data: &[u8]) -> Result<String, MediaError> {
        let name = timestamp_name(Utc::now(), original_name)?;
        std::fs::write(self.path(&name), data)?;
        Ok(name)
    }

    /// Removes a stored image. A file that is already gone is not an error.
    pub fn remove(&self, name: &str) -> Result<(), MediaError> {
        let path = self.path(name);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// `20240101120000000000.JPG` for an upload of `photo.JPG` at
/// 2024-01-01T12:00:00Z.
pub fn timestamp_name(now: DateTime<Utc>, original_name: &str) -> Result<String, MediaError> {
    let ext = extension(original_name)
        .ok_or_else(|| MediaError::MissingExtension(original_name.to_string()))?;

    if !ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
        return Err(MediaError::UnsupportedExtension(ext.to_string()));
    }

    Ok(format!("{}.{}", now.format("%Y%m%d%H%M%S%6f"), ext))
}

fn extension(name: &str) -> Option<&str> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_timestamp_name_keeps_extension_case() {
        let name = timestamp_name(noon(), "photo.JPG").unwrap();
        assert_eq!(name, "20240101120000000000.JPG");
    }

    #[test]
    fn test_timestamp_name_microsecond_precision() {
        let at = noon() + chrono::Duration::microseconds(123456);
        let name = timestamp_name(at, "soup.png").unwrap();
        assert_eq!(name, "20240101120000123456.png");
    }

    #[test]
    fn test_timestamp_name_sorts_chronologically() {
        let earlier = timestamp_name(noon(), "a.jpg").unwrap();
        let later = timestamp_name(noon() + chrono::Duration::microseconds(1), "b.jpg").unwrap();
        assert!(earlier < later);
    }

    #[test]
    fn test_rejects_missing_extension() {
        assert!(matches!(
            timestamp_name(noon(), "photo"),
            Err(MediaError::MissingExtension(_))
        ));
        assert!(matches!(
            timestamp_name(noon(), "photo."),
            Err(MediaError::MissingExtension(_))
        ));
    }

    #[test]
    fn test_rejects_unsupported_extension() {
        assert!(matches!(
            timestamp_name(noon(), "malware.exe"),
            Err(MediaError::UnsupportedExtension(_))
        ));
    }

    #[test]
    fn test_only_last_extension_counts() {
        let name = timestamp_name(noon(), "dinner.tar.png").unwrap();
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path()).unwrap();

        let name = store.save("photo.jpg", b"image bytes").unwrap();
        assert_eq!(std::fs::read(store.path(&name)).unwrap(), b"image bytes");

        store.remove(&name).unwrap();
        assert!(!store.path(&name).exists());
    }

    #[test]
    fn test_remove_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path()).unwrap();
        store.remove("20240101120000000000.jpg").unwrap();
    }

    #[test]
    fn test_new_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("media");
        MediaStore::new(&root).unwrap();
        assert!(root.is_dir());
    }
}
