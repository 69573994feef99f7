use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

/// Extension of the JSON metadata file for an entry
const META_EXT: &str = "json";

/// Extension of the raw body file for an entry
const BODY_EXT: &str = "body";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

/// An HTTP response as stored in a cache.
/// The body lives in its own file next to the JSON metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Root of all named caches. Each cache is one directory.
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create cache root: {}", root.display()))?;
        Ok(Self { root })
    }

    fn cache_dir(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if !valid {
            anyhow::bail!("Invalid cache name: {:?}", name);
        }
        Ok(self.root.join(name))
    }

    /// Open a cache, creating it if absent
    pub fn open(&self, name: &str) -> Result<Cache> {
        let dir = self.cache_dir(name)?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache: {}", name))?;
        Ok(Cache {
            name: name.to_string(),
            dir,
        })
    }

    /// Open a cache only if it already exists
    pub fn existing(&self, name: &str) -> Result<Option<Cache>> {
        let dir = self.cache_dir(name)?;
        if !dir.is_dir() {
            return Ok(None);
        }
        Ok(Some(Cache {
            name: name.to_string(),
            dir,
        }))
    }

    /// Names of all caches, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root).context("Failed to list caches")? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete a cache and everything in it. Returns false if it did not exist.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let dir = self.cache_dir(name)?;
        if !dir.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&dir)
            .with_context(|| format!("Failed to delete cache: {}", name))?;
        debug!(cache = name, "Deleted cache");
        Ok(true)
    }
}

/// Raw files of one entry, taken before it is overwritten
struct EntrySnapshot {
    url: String,
    meta: Option<Vec<u8>>,
    body: Option<Vec<u8>>,
}

/// A single named cache of URL → response entries.
pub struct Cache {
    name: String,
    dir: PathBuf,
}

impl Cache {
    /// File stem for a URL. FNV-1a keeps names short and stable across builds;
    /// the stored URL is compared on lookup so collisions read as misses.
    fn entry_key(url: &str) -> String {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in url.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        format!("{:016x}", hash)
    }

    fn entry_path(&self, url: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", Self::entry_key(url), ext))
    }

    fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<CachedData<T>>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cache file: {}", path.display()))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", path.display()))?;

        Ok(Some(cached))
    }

    /// Store a response, replacing any previous entry for its URL
    pub fn put(&self, response: &CachedResponse) -> Result<()> {
        let cached = CachedData::new(response);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(self.entry_path(&response.url, BODY_EXT), &response.body)
            .with_context(|| format!("Failed to write cached body for {}", response.url))?;
        std::fs::write(self.entry_path(&response.url, META_EXT), contents)
            .with_context(|| format!("Failed to write cache entry for {}", response.url))?;
        Ok(())
    }

    /// Store every response or none of them.
    /// On failure, entries that existed before the call are restored.
    pub fn put_all(&self, responses: &[CachedResponse]) -> Result<()> {
        let snapshots = responses
            .iter()
            .map(|response| self.snapshot(&response.url))
            .collect::<Result<Vec<_>>>()?;

        for (i, response) in responses.iter().enumerate() {
            if let Err(e) = self.put(response) {
                // Reverse order so the oldest copy wins when a URL repeats
                for snapshot in snapshots[..=i].iter().rev() {
                    if let Err(cleanup) = self.restore(snapshot) {
                        warn!(url = %snapshot.url, error = %cleanup, "Failed to roll back cache entry");
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    fn snapshot(&self, url: &str) -> Result<EntrySnapshot> {
        let read_if_file = |path: PathBuf| -> Result<Option<Vec<u8>>> {
            if path.is_file() {
                Ok(Some(std::fs::read(&path).with_context(|| {
                    format!("Failed to read cache file: {}", path.display())
                })?))
            } else {
                Ok(None)
            }
        };
        Ok(EntrySnapshot {
            url: url.to_string(),
            meta: read_if_file(self.entry_path(url, META_EXT))?,
            body: read_if_file(self.entry_path(url, BODY_EXT))?,
        })
    }

    fn restore(&self, snapshot: &EntrySnapshot) -> Result<()> {
        for (ext, contents) in [(META_EXT, &snapshot.meta), (BODY_EXT, &snapshot.body)] {
            let path = self.entry_path(&snapshot.url, ext);
            match contents {
                Some(bytes) => std::fs::write(&path, bytes)?,
                None if path.is_file() => std::fs::remove_file(&path)?,
                None => {}
            }
        }
        Ok(())
    }

    /// Look up the response stored for `url`
    pub fn match_url(&self, url: &str) -> Result<Option<CachedData<CachedResponse>>> {
        let Some(mut cached) = self.load::<CachedResponse>(&self.entry_path(url, META_EXT))? else {
            return Ok(None);
        };
        if cached.data.url != url {
            return Ok(None);
        }
        cached.data.body = std::fs::read(self.entry_path(url, BODY_EXT))
            .with_context(|| format!("Failed to read cached body for {}", url))?;
        Ok(Some(cached))
    }

    /// URLs stored in this cache with their age, sorted by URL
    pub fn entries(&self) -> Result<Vec<(String, String)>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list cache: {}", self.name))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(META_EXT) {
                continue;
            }
            match self.load::<CachedResponse>(&path) {
                Ok(Some(cached)) => entries.push((cached.data.url.clone(), cached.age_display())),
                Ok(None) => {}
                Err(e) => debug!(path = %path.display(), error = %e, "Skipping unreadable cache entry"),
            }
        }
        entries.sort();
        Ok(entries)
    }
}
