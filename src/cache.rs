//! Local cache standing in for the browser's per-origin storage.
//!
//! Each book gets a directory under the cache root named by a hash of its
//! book key. The location index is stored verbatim since it is an opaque
//! string owned by the rendering engine; the theme selection is a tiny TOML
//! file shared across books. Write errors are ignored to keep the reading
//! session responsive; reads fall back to "nothing cached".

use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_CACHE_ROOT: &str = ".cache";

#[derive(Debug, Clone)]
pub struct BookCache {
    root: PathBuf,
}

impl BookCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        BookCache { root: root.into() }
    }

    pub fn open_default() -> Self {
        Self::new(DEFAULT_CACHE_ROOT)
    }

    /// Cached location index for a book, if one was generated before.
    pub fn load_location_index(&self, book_key: &str) -> Option<String> {
        let data = fs::read_to_string(self.locations_path(book_key)).ok()?;
        Some(data).filter(|index| !index.trim().is_empty())
    }

    pub fn save_location_index(&self, book_key: &str, index: &str) {
        let path = self.locations_path(book_key);
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = fs::write(path, index);
    }

    /// Name of the last-selected theme, if any.
    pub fn load_theme(&self) -> Option<String> {
        let data = fs::read_to_string(self.theme_path()).ok()?;
        let entry: ThemeEntry = toml::from_str(&data).ok()?;
        Some(entry.theme).filter(|name| !name.is_empty())
    }

    pub fn save_theme(&self, name: &str) {
        let entry = ThemeEntry {
            theme: name.to_string(),
        };
        let _ = fs::create_dir_all(&self.root);
        if let Ok(contents) = toml::to_string(&entry) {
            let _ = fs::write(self.theme_path(), contents);
        }
    }

    fn hash_dir(&self, book_key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(book_key.as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        self.root.join(hash)
    }

    fn locations_path(&self, book_key: &str) -> PathBuf {
        self.hash_dir(book_key).join("locations.idx")
    }

    fn theme_path(&self) -> PathBuf {
        self.root.join("theme.toml")
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct ThemeEntry {
    theme: String,
}
