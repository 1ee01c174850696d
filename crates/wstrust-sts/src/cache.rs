#![forbid(unsafe_code)]

//! Token cache collaborator and the two bundled stores.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use wstrust_core::Error;

/// Seconds a token is still accepted after its `Expires` instant.
pub const SAFETY_MARGIN_SECS: i64 = 30;

/// Validity window of an issued token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifetime {
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl Lifetime {
    /// Usable at `now` when `expires >= now - margin`.
    pub fn is_valid_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires >= now - margin
    }
}

/// What a cache stores per id: the lifetime and the raw token payload
/// (the STS response XML, or the access token JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub lifetime: Lifetime,
    pub payload: String,
}

/// Storage for issued tokens keyed by cache id (`""` is the default token).
pub trait TokenCache: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<CacheRecord>, Error>;
    fn set(&self, id: &str, record: &CacheRecord) -> Result<(), Error>;
}

/// Process-local cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    records: Mutex<HashMap<String, CacheRecord>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl TokenCache for MemoryCache {
    fn get(&self, id: &str) -> Result<Option<CacheRecord>, Error> {
        Ok(self.records.lock().get(id).cloned())
    }

    fn set(&self, id: &str, record: &CacheRecord) -> Result<(), Error> {
        self.records.lock().insert(id.to_owned(), record.clone());
        Ok(())
    }
}

/// One JSON file per cache id: `cache.json` or `cache_<id>.json`.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// The directory is created on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &str) -> Result<PathBuf, Error> {
        if id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(Error::Cache(format!("invalid cache id {id:?}")));
        }
        let name = if id.is_empty() {
            "cache.json".to_owned()
        } else {
            format!("cache_{id}.json")
        };
        Ok(self.dir.join(name))
    }
}

impl TokenCache for FileCache {
    fn get(&self, id: &str) -> Result<Option<CacheRecord>, Error> {
        let path = self.path_for(id)?;
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| Error::Cache(format!("{}: {e}", path.display())))
    }

    fn set(&self, id: &str, record: &CacheRecord) -> Result<(), Error> {
        let path = self.path_for(id)?;
        fs::create_dir_all(&self.dir)?;
        let data = serde_json::to_vec(record)
            .map_err(|e| Error::Cache(format!("{}: {e}", path.display())))?;
        fs::write(&path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(expires: DateTime<Utc>) -> CacheRecord {
        CacheRecord {
            lifetime: Lifetime {
                created: expires - Duration::hours(1),
                expires,
            },
            payload: "<trust:RequestSecurityTokenResponseCollection/>".into(),
        }
    }

    #[test]
    fn safety_margin_boundaries() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let margin = Duration::seconds(SAFETY_MARGIN_SECS);
        let at = |secs: i64| record(now + Duration::seconds(secs)).lifetime;

        assert!(!at(-31).is_valid_at(now, margin));
        assert!(at(-30).is_valid_at(now, margin));
        assert!(at(-10).is_valid_at(now, margin));
        assert!(at(600).is_valid_at(now, margin));
    }

    #[test]
    fn memory_cache_roundtrip() {
        let cache = MemoryCache::new();
        assert!(cache.get("gipod").unwrap().is_none());
        let rec = record(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        cache.set("gipod", &rec).unwrap();
        assert_eq!(cache.get("gipod").unwrap(), Some(rec));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn file_cache_names_and_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("tokens"));
        assert_eq!(cache.path_for("").unwrap(), dir.path().join("tokens/cache.json"));
        assert_eq!(cache.path_for("gipod").unwrap(), dir.path().join("tokens/cache_gipod.json"));
        assert!(cache.get("gipod").unwrap().is_none());

        let rec = record(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        cache.set("gipod", &rec).unwrap();
        assert_eq!(FileCache::new(cache.dir()).get("gipod").unwrap(), Some(rec));
        assert!(cache.get("").unwrap().is_none());
    }

    #[test]
    fn file_cache_rejects_path_ids() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        assert!(matches!(cache.path_for("../x"), Err(Error::Cache(_))));
    }

    #[test]
    fn corrupt_file_is_a_cache_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        fs::write(dir.path().join("cache.json"), b"not json").unwrap();
        assert!(matches!(cache.get(""), Err(Error::Cache(_))));
    }
}
