//!
//! src/cache.rs
//!
//! Response caches owned by the fetcher, keyed by request URL plus
//! parameters. The creation flow uses a bounded in-memory TTL map;
//! the page flow uses zstd-compressed files with the freshness window
//! checked against file mtime. Writes are idempotent and
//! last-write-wins: content for a given key is stable within the TTL,
//! so concurrent writers need no coordination.
//!

use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime};
use std::{fs, io, path::{Path, PathBuf}};

use serde_json::Value;
use tokio::sync::Mutex;

pub struct MemoryTtlCache {
    ttl: Duration,
    max_entries: usize,
    entries: Mutex<HashMap<String, (Instant, Value)>>,
}

impl MemoryTtlCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((stored, _)) if stored.elapsed() > self.ttl => {
                entries.remove(key);
                None
            }
            Some((_, value)) => Some(value.clone()),
            None => None,
        }
    }

    pub async fn insert(&self, key: String, value: Value) {
        let ttl = self.ttl;
        let mut entries = self.entries.lock().await;
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            entries.retain(|_, entry| entry.0.elapsed() <= ttl);
            if entries.len() >= self.max_entries {
                // still full of live entries; drop an arbitrary one
                if let Some(evict) = entries.keys().next().cloned() {
                    entries.remove(&evict);
                }
            }
        }
        entries.insert(key, (Instant::now(), value));
    }
}

pub struct DiskCache {
    root: PathBuf,
    ttl: Duration,
    level: i32,
}

impl DiskCache {
    pub fn new(root: impl AsRef<Path>, ttl: Duration, level: i32) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ttl,
            level: level.clamp(0, 21),
        }
    }

    /// Cache miss on any read problem: a stale, absent, or undecodable
    /// file just means the payload gets refetched.
    pub fn get(&self, key: &str) -> Option<Value> {
        let path = self.path_for(key);
        let modified = fs::metadata(&path).ok()?.modified().ok()?;
        let age = SystemTime::now().duration_since(modified).ok()?;
        if age > self.ttl {
            return None;
        }
        let file = fs::File::open(&path).ok()?;
        let reader = zstd::stream::read::Decoder::new(file).ok()?;
        serde_json::from_reader(reader).ok()
    }

    pub fn put(&self, key: &str, value: &Value) -> io::Result<PathBuf> {
        let path = self.path_for(key);
        let parent = path
            .parent()
            .ok_or_else(|| io::Error::other("cache path has no parent"))?;
        fs::create_dir_all(parent)?;

        let temp = tempfile::NamedTempFile::new_in(parent)?;
        {
            let mut enc = zstd::stream::write::Encoder::new(temp.as_file(), self.level)?;
            serde_json::to_writer(&mut enc, value)?;
            enc.finish()?;
        }
        temp.persist(&path).map_err(|e| e.error)?;
        Ok(path)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json.zst", Self::sanitize_key(key)))
    }

    fn sanitize_key(key: &str) -> String {
        key.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}
