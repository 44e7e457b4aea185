//! Cached Source Files
//!
//! Reads and parses files under a root directory once, then serves the parsed
//! form from cache until it goes stale. The parse step is supplied by the
//! caller, e.g. a template engine's compile function.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cache::{Cache, CacheStats, LoadError, LoadResult, Loaded};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Source Cache ==
pub struct SourceCache<T> {
    root: PathBuf,
    cache: Cache<Arc<T>>,
}

impl<T: Send + Sync + 'static> SourceCache<T> {
    // == Constructor ==
    /// Creates a cache over files in `root`.
    ///
    /// # Arguments
    /// * `root` - Directory names are resolved against
    /// * `capacity` - Maximum number of parsed files kept
    /// * `ttl` - Age after which a file is re-read and re-parsed, zero = never
    /// * `parse` - Turns `(name, contents)` into the cached form
    pub fn new<F>(root: impl Into<PathBuf>, capacity: usize, ttl: Duration, parse: F) -> Self
    where
        F: Fn(&str, &str) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let root = root.into();
        info!(root = %root.display(), capacity, "source cache initialized");

        let base = root.clone();
        let loader = move |name: &str| -> LoadResult<Arc<T>> {
            let path = base.join(name);
            let contents = fs::read_to_string(&path).map_err(|err| {
                LoadError::new(anyhow::Error::new(err).context(format!(
                    "reading {}",
                    path.display()
                )))
            })?;
            let parsed = parse(name, &contents)
                .map_err(|err| LoadError::new(err.context(format!("parsing {name}"))))?;
            Ok(Loaded::new(Arc::new(parsed)))
        };

        Self {
            root,
            cache: Cache::new(capacity, ttl, loader),
        }
    }

    pub fn from_config<F>(root: impl Into<PathBuf>, config: &CacheConfig, parse: F) -> Self
    where
        F: Fn(&str, &str) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self::new(root, config.capacity, config.global_ttl(), parse)
    }

    // == Get ==
    /// Parsed form of the file `name`, relative to the root.
    ///
    /// Names that are absolute or climb out of the root are rejected before
    /// touching the cache.
    pub fn get(&self, name: &str) -> Result<Arc<T>> {
        let name = checked_name(name)?;
        Ok(self.cache.get(&name)?)
    }

    /// Resolves several files in order, stopping at the first failure.
    pub fn get_all<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<(String, Arc<T>)>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name).map(|parsed| (name.to_string(), parsed))
            })
            .collect()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Normalizes `name` into a `/`-separated relative path inside the root.
fn checked_name(name: &str) -> Result<String> {
    let mut parts = Vec::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(part) => parts.push(part),
                None => {
                    return Err(CacheError::InvalidKey(format!("'{name}' is not valid UTF-8")))
                }
            },
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(CacheError::InvalidKey(format!(
                    "'{name}' must be a relative path inside the root"
                )))
            }
        }
    }
    if parts.is_empty() {
        return Err(CacheError::InvalidKey("source name is empty".to_string()));
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Stand-in for a template: the non-empty lines of the file.
    #[derive(Debug, PartialEq)]
    struct Lines(Vec<String>);

    fn parse_lines(_name: &str, contents: &str) -> anyhow::Result<Lines> {
        if contents.contains("{{") && !contents.contains("}}") {
            anyhow::bail!("unclosed action");
        }
        Ok(Lines(
            contents
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string)
                .collect(),
        ))
    }

    fn fixture() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1.tmpl"), "Hello, {{ name }}!\n").unwrap();
        fs::create_dir(dir.path().join("partials")).unwrap();
        fs::write(dir.path().join("partials/2.tmpl"), "\nfooter\n").unwrap();
        fs::write(dir.path().join("broken.tmpl"), "{{ oops").unwrap();
        dir
    }

    #[test]
    fn test_get_parses_once() {
        let dir = fixture();
        let parses = Arc::new(AtomicUsize::new(0));
        let counted = parses.clone();
        let cache = SourceCache::new(dir.path(), 10, Duration::ZERO, move |name, contents| {
            counted.fetch_add(1, Ordering::SeqCst);
            parse_lines(name, contents)
        });

        let first = cache.get("1.tmpl").unwrap();
        let second = cache.get("./1.tmpl").unwrap();

        assert_eq!(*first, Lines(vec!["Hello, {{ name }}!".to_string()]));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(parses.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_get_all_in_order() {
        let dir = fixture();
        let cache = SourceCache::new(dir.path(), 10, Duration::ZERO, parse_lines);

        let all = cache.get_all(&["1.tmpl", "partials/2.tmpl"]).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].0, "1.tmpl");
        assert_eq!(*all[1].1, Lines(vec!["footer".to_string()]));
    }

    #[test]
    fn test_get_all_stops_at_first_error() {
        let dir = fixture();
        let cache = SourceCache::new(dir.path(), 10, Duration::ZERO, parse_lines);

        let err = cache
            .get_all(&["1.tmpl", "broken.tmpl", "partials/2.tmpl"])
            .unwrap_err();
        assert!(matches!(err, CacheError::Load(_)));
        assert!(!cache.cache.contains("partials/2.tmpl"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = fixture();
        let cache = SourceCache::new(dir.path(), 10, Duration::ZERO, parse_lines);

        let err = cache.get("nope.tmpl").unwrap_err();
        assert!(err.to_string().contains("nope.tmpl"));
    }

    #[test]
    fn test_reload_after_ttl() {
        let dir = fixture();
        let cache = SourceCache::new(dir.path(), 10, Duration::from_millis(500), parse_lines);

        assert_eq!(cache.get("1.tmpl").unwrap().0.len(), 1);
        fs::write(dir.path().join("1.tmpl"), "a\nb\n").unwrap();
        assert_eq!(cache.get("1.tmpl").unwrap().0.len(), 1);

        std::thread::sleep(Duration::from_millis(700));
        assert_eq!(cache.get("1.tmpl").unwrap().0.len(), 2);
    }

    #[test]
    fn test_names_outside_root_rejected() {
        let dir = fixture();
        let cache = SourceCache::new(dir.path(), 10, Duration::ZERO, parse_lines);

        for name in ["../etc/passwd", "/etc/passwd", "partials/../../x", "", "./."] {
            assert!(
                matches!(cache.get(name), Err(CacheError::InvalidKey(_))),
                "{name:?} should be rejected"
            );
        }
        assert_eq!(cache.stats().misses, 0);
    }

    #[test]
    fn test_checked_name_normalizes() {
        assert_eq!(checked_name("./partials//2.tmpl").unwrap(), "partials/2.tmpl");
        assert_eq!(checked_name(" a /b .tmpl").unwrap(), " a /b .tmpl");
    }

    #[test]
    fn test_whitespace_in_names_is_significant() {
        let dir = fixture();
        fs::write(dir.path().join(" spaced.tmpl "), "padded\n").unwrap();
        let cache = SourceCache::new(dir.path(), 10, Duration::ZERO, parse_lines);

        assert_eq!(
            *cache.get(" spaced.tmpl ").unwrap(),
            Lines(vec!["padded".to_string()])
        );
        // No trimming: these name different files
        assert!(matches!(cache.get("spaced.tmpl"), Err(CacheError::Load(_))));
        assert!(matches!(cache.get(" 1.tmpl"), Err(CacheError::Load(_))));
        assert_eq!(cache.get("1.tmpl").unwrap().0.len(), 1);
    }
}
