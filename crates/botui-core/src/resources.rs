//! Resource loader trait (spec §6).
//!
//! The on-disk layout of resource packs is an external collaborator's
//! concern (spec §1); this module specifies the path-resolution grammar
//! (`@/…` from base, `./`/`../` from the requesting page's directory) and
//! the lookup surface pages use to pull in images, text snippets and
//! localisation packs.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::PageError;

pub trait ResourceLoader: Send + Sync {
    fn base_path(&self) -> Option<&Path>;

    /// Resolve `name` against `page_dir` using the `@/`, `./`, `../` grammar.
    fn resolve_path(&self, name: &str, page_dir: &Path) -> PathBuf {
        if let Some(rest) = name.strip_prefix("@/") {
            return self.base_path().map(|b| b.join(rest)).unwrap_or_else(|| PathBuf::from(rest));
        }
        if name.starts_with("./") || name.starts_with("../") {
            return page_dir.join(name);
        }
        page_dir.join(name)
    }

    fn exists(&self, name: &str, page_dir: &Path) -> bool {
        self.resolve_path(name, page_dir).exists()
    }

    fn get_text(&self, name: &str, page_dir: &Path) -> Result<String, PageError>;
    fn get_bytes(&self, name: &str, page_dir: &Path) -> Result<Vec<u8>, PageError>;

    /// Drop any cached reads. A no-op for loaders that don't cache.
    fn clear_cache(&self) {}
}

/// Filesystem-backed loader with an in-memory text cache, the concrete
/// implementation apps plug in when they're not running fully in-memory
/// (as the test fakes do).
pub struct FsResourceLoader {
    base_path: Option<PathBuf>,
    text_cache: Mutex<HashMap<PathBuf, String>>,
}

impl FsResourceLoader {
    pub fn new(base_path: Option<PathBuf>) -> Self {
        Self { base_path, text_cache: Mutex::new(HashMap::new()) }
    }

    fn resolved_or_error(&self, name: &str, page_dir: &Path) -> Result<PathBuf, PageError> {
        let resolved = self.resolve_path(name, page_dir);
        if resolved.exists() {
            Ok(resolved)
        } else {
            Err(PageError::ResourceNotFound {
                name: name.to_string(),
                tried: vec![resolved.display().to_string()],
            })
        }
    }
}

impl ResourceLoader for FsResourceLoader {
    fn base_path(&self) -> Option<&Path> {
        self.base_path.as_deref()
    }

    fn get_text(&self, name: &str, page_dir: &Path) -> Result<String, PageError> {
        let resolved = self.resolved_or_error(name, page_dir)?;
        if let Some(cached) = self.text_cache.lock().unwrap().get(&resolved) {
            return Ok(cached.clone());
        }
        let text = fs::read_to_string(&resolved).map_err(|_| PageError::ResourceNotFound {
            name: name.to_string(),
            tried: vec![resolved.display().to_string()],
        })?;
        self.text_cache.lock().unwrap().insert(resolved, text.clone());
        Ok(text)
    }

    fn get_bytes(&self, name: &str, page_dir: &Path) -> Result<Vec<u8>, PageError> {
        let resolved = self.resolved_or_error(name, page_dir)?;
        fs::read(&resolved).map_err(|_| PageError::ResourceNotFound {
            name: name.to_string(),
            tried: vec![resolved.display().to_string()],
        })
    }

    fn clear_cache(&self) {
        self.text_cache.lock().unwrap().clear();
    }
}

/// In-memory loader used by tests: no filesystem access at all.
#[derive(Default)]
pub struct MapResourceLoader {
    entries: HashMap<String, Vec<u8>>,
}

impl MapResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(name.into(), bytes.into());
    }
}

impl ResourceLoader for MapResourceLoader {
    fn base_path(&self) -> Option<&Path> {
        None
    }

    fn resolve_path(&self, name: &str, _page_dir: &Path) -> PathBuf {
        PathBuf::from(name)
    }

    fn exists(&self, name: &str, _page_dir: &Path) -> bool {
        self.entries.contains_key(name)
    }

    fn get_text(&self, name: &str, page_dir: &Path) -> Result<String, PageError> {
        self.get_bytes(name, page_dir)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    fn get_bytes(&self, name: &str, _page_dir: &Path) -> Result<Vec<u8>, PageError> {
        self.entries.get(name).cloned().ok_or_else(|| PageError::ResourceNotFound {
            name: name.to_string(),
            tried: vec![name.to_string()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_relative_path_resolves_under_base() {
        let loader = FsResourceLoader::new(Some(PathBuf::from("/base")));
        let resolved = loader.resolve_path("@/img.png", Path::new("/base/pages/home"));
        assert_eq!(resolved, PathBuf::from("/base/img.png"));
    }

    #[test]
    fn relative_path_resolves_under_page_dir() {
        let loader = FsResourceLoader::new(Some(PathBuf::from("/base")));
        let resolved = loader.resolve_path("./img.png", Path::new("/base/pages/home"));
        assert_eq!(resolved, PathBuf::from("/base/pages/home/img.png"));
    }

    #[test]
    fn missing_resource_lists_tried_path() {
        let loader = MapResourceLoader::new();
        let err = loader.get_text("nope", Path::new("/x")).unwrap_err();
        match err {
            PageError::ResourceNotFound { name, tried } => {
                assert_eq!(name, "nope");
                assert_eq!(tried, vec!["nope".to_string()]);
            }
            other => panic!("wrong error variant: {other:?}"),
        }
    }

    #[test]
    fn map_loader_round_trips_text() {
        let mut loader = MapResourceLoader::new();
        loader.insert("hello.txt", b"hi".to_vec());
        assert_eq!(loader.get_text("hello.txt", Path::new("/x")).unwrap(), "hi");
    }
}
