//! The ordered, de-duplicated set of monitored URLs and its flat-file backing.
//!
//! The list file holds one URL per line. Blank lines are skipped on read and never
//! written. Every successful mutation rewrites the file through a temporary sibling
//! that is renamed over the original, so a crash leaves either the old or the new list.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexSet;
use thiserror::Error;

const HTTP_SCHEME: &str = "http://";
const HTTPS_SCHEME: &str = "https://";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read URL list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write URL list {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Normalizes user input into an endpoint URL.
///
/// Returns `None` for blank input. A missing `http://`/`https://` prefix is replaced
/// by `https://`.
pub fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with(HTTP_SCHEME) || trimmed.starts_with(HTTPS_SCHEME) {
        Some(trimmed.to_string())
    } else {
        Some(format!("{HTTPS_SCHEME}{trimmed}"))
    }
}

/// The same URL with `http` and `https` swapped.
fn with_other_scheme(url: &str) -> Option<String> {
    if let Some(rest) = url.strip_prefix(HTTPS_SCHEME) {
        Some(format!("{HTTP_SCHEME}{rest}"))
    } else {
        url.strip_prefix(HTTP_SCHEME)
            .map(|rest| format!("{HTTPS_SCHEME}{rest}"))
    }
}

/// Endpoint registry shared between the foreground and the check cycles.
///
/// Cycles work on a snapshot taken with [`EndpointRegistry::list`], so adds and removes
/// never block on a running cycle.
#[derive(Debug)]
pub struct EndpointRegistry {
    path: PathBuf,
    urls: RwLock<IndexSet<String>>,
}

impl EndpointRegistry {
    /// Creates an empty registry backed by `path` without touching the file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            urls: RwLock::new(IndexSet::new()),
        }
    }

    /// Creates a registry and loads whatever the backing file already holds.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let registry = Self::new(path);
        registry.load()?;
        Ok(registry)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the in-memory list with the contents of the backing file.
    /// A missing file leaves the registry empty. Returns the number of URLs loaded.
    pub fn load(&self) -> Result<usize, RegistryError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No {} file found, starting with an empty list", self.path.display());
                String::new()
            }
            Err(source) => {
                return Err(RegistryError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let loaded: IndexSet<String> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        let count = loaded.len();
        *self.write_guard() = loaded;
        log::info!("Loaded {count} URL(s) from {}", self.path.display());
        Ok(count)
    }

    /// Adds a URL after normalizing it.
    ///
    /// `Ok(false)` means the input was blank or the normalized URL is already registered;
    /// nothing changed in either case.
    pub fn add(&self, raw: &str) -> Result<bool, RegistryError> {
        let Some(url) = normalize(raw) else {
            return Ok(false);
        };

        let mut urls = self.write_guard();
        if urls.contains(&url) {
            log::debug!("URL already exists: {url}");
            return Ok(false);
        }

        let previous = urls.clone();
        urls.insert(url.clone());
        if let Err(e) = write_urls(&self.path, &urls) {
            *urls = previous;
            return Err(e);
        }

        log::debug!("Added URL: {url}");
        Ok(true)
    }

    /// Removes an exact match. `Ok(false)` if the URL is not registered.
    pub fn remove(&self, url: &str) -> Result<bool, RegistryError> {
        let mut urls = self.write_guard();
        self.remove_locked(&mut urls, url)
    }

    /// Removes the entry the user most likely meant.
    ///
    /// The input is normalized the way [`EndpointRegistry::add`] does it. An exact match
    /// wins; otherwise an entry that only differs by `http`/`https` is removed.
    /// Returns the URL that was removed.
    pub fn remove_matching(&self, raw: &str) -> Result<Option<String>, RegistryError> {
        let Some(url) = normalize(raw) else {
            return Ok(None);
        };

        let mut urls = self.write_guard();
        let candidates = [Some(url.clone()), with_other_scheme(&url)];
        for candidate in candidates.into_iter().flatten() {
            if self.remove_locked(&mut urls, &candidate)? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    fn remove_locked(
        &self,
        urls: &mut IndexSet<String>,
        url: &str,
    ) -> Result<bool, RegistryError> {
        if !urls.contains(url) {
            return Ok(false);
        }

        let previous = urls.clone();
        urls.shift_remove(url);
        if let Err(e) = write_urls(&self.path, urls) {
            *urls = previous;
            return Err(e);
        }

        log::debug!("Removed URL: {url}");
        Ok(true)
    }

    /// Snapshot of the registered URLs in insertion order.
    pub fn list(&self) -> Vec<String> {
        self.read_guard().iter().cloned().collect()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.read_guard().contains(url)
    }

    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_guard().is_empty()
    }

    /// Rewrites the backing file from the in-memory list.
    pub fn save(&self) -> Result<(), RegistryError> {
        let urls = self.write_guard();
        write_urls(&self.path, &urls)
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, IndexSet<String>> {
        self.urls.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, IndexSet<String>> {
        self.urls.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn write_urls(path: &Path, urls: &IndexSet<String>) -> Result<(), RegistryError> {
    let mut contents = String::new();
    for url in urls {
        contents.push_str(url);
        contents.push('\n');
    }

    let mut tmp_name = OsString::from(path.as_os_str());
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let to_error = |source| RegistryError::Write {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&tmp_path, contents).map_err(to_error)?;
    fs::rename(&tmp_path, path).map_err(to_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_in(dir: &tempfile::TempDir) -> EndpointRegistry {
        EndpointRegistry::open(dir.path().join("urls.txt")).expect("open registry")
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  example.com "), Some("https://example.com".to_string()));
        assert_eq!(normalize("http://example.com"), Some("http://example.com".to_string()));
        assert_eq!(normalize("https://example.com/a"), Some("https://example.com/a".to_string()));
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize(""), None);
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(&dir);
        assert!(registry.is_empty());
        assert!(!registry.path().exists());
    }

    #[test]
    fn test_add_normalizes_and_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(&dir);

        assert!(registry.add("example.com").unwrap());
        assert!(!registry.add("https://example.com").unwrap());
        assert!(!registry.add("  example.com  ").unwrap());
        assert_eq!(registry.list(), vec!["https://example.com"]);
    }

    #[test]
    fn test_add_is_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(&dir);

        assert!(registry.add("example.com/Status").unwrap());
        assert!(registry.add("example.com/status").unwrap());
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("https://example.com/Status"));
        assert!(!registry.contains("https://example.com/STATUS"));
    }

    #[test]
    fn test_blank_add_has_no_side_effect() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(&dir);

        assert!(!registry.add("   ").unwrap());
        assert!(registry.is_empty());
        assert!(!registry.path().exists());
    }

    #[test]
    fn test_add_then_reload_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(&dir);
        registry.add("b.example.com").unwrap();
        registry.add("http://a.example.com").unwrap();
        registry.add("c.example.com").unwrap();

        let reloaded = registry_in(&dir);
        assert_eq!(
            reloaded.list(),
            vec![
                "https://b.example.com",
                "http://a.example.com",
                "https://c.example.com"
            ]
        );
    }

    #[test]
    fn test_remove_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(&dir);
        registry.add("a.example.com").unwrap();
        registry.add("b.example.com").unwrap();

        assert!(registry.remove("https://a.example.com").unwrap());
        assert!(!registry.remove("https://a.example.com").unwrap());

        let reloaded = registry_in(&dir);
        assert_eq!(reloaded.list(), vec!["https://b.example.com"]);
    }

    #[test]
    fn test_remove_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(&dir);
        registry.add("http://a.example.com").unwrap();

        assert!(!registry.remove("a.example.com").unwrap());
        assert!(!registry.remove("https://a.example.com").unwrap());
        assert!(registry.contains("http://a.example.com"));
    }

    #[test]
    fn test_remove_matching_falls_back_to_other_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(&dir);
        registry.add("http://a.example.com").unwrap();
        registry.add("b.example.com").unwrap();

        assert_eq!(
            registry.remove_matching("a.example.com").unwrap(),
            Some("http://a.example.com".to_string())
        );
        assert_eq!(
            registry.remove_matching("b.example.com").unwrap(),
            Some("https://b.example.com".to_string())
        );
        assert_eq!(registry.remove_matching("c.example.com").unwrap(), None);
        assert_eq!(registry.remove_matching("  ").unwrap(), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_skips_blank_lines_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        fs::write(
            &path,
            "https://a.example.com\n\n   \n  https://b.example.com  \nhttps://a.example.com\n",
        )
        .unwrap();

        let registry = EndpointRegistry::open(&path).unwrap();
        assert_eq!(
            registry.list(),
            vec!["https://a.example.com", "https://b.example.com"]
        );
    }

    #[test]
    fn test_save_writes_one_url_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(&dir);
        registry.add("a.example.com").unwrap();
        registry.add("b.example.com").unwrap();
        registry.save().unwrap();

        let contents = fs::read_to_string(registry.path()).unwrap();
        assert_eq!(contents, "https://a.example.com\nhttps://b.example.com\n");
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let registry = EndpointRegistry::new(dir.path().join("missing").join("urls.txt"));

        assert!(matches!(
            registry.add("a.example.com"),
            Err(RegistryError::Write { .. })
        ));
        assert!(registry.is_empty());
    }
}
