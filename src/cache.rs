//! Memoization of source loads, keyed by the input file's identity.
//!
//! A cache never changes results: a hit returns exactly what a fresh load of
//! the same unchanged input would produce.

use crate::dataset::Dataset;
use crate::models::SourceType;
use crate::stats::LoadStats;
use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: SourceType,
    pub path: PathBuf,
    pub chunk_size: Option<usize>,
    /// Nanoseconds since the epoch. Seconds miss same-size rewrites.
    pub input_mtime: u128,
    pub input_size: u64,
}

impl CacheKey {
    /// Builds a key from the file's current mtime and size. Fails when the
    /// file cannot be stat-ed.
    pub fn for_input(source: SourceType, path: &Path, chunk_size: Option<usize>) -> Result<Self> {
        let (input_mtime, input_size) = get_input_metadata(path)?;
        Ok(Self {
            source,
            path: path.to_path_buf(),
            chunk_size,
            input_mtime,
            input_size,
        })
    }
}

fn get_input_metadata(path: &Path) -> Result<(u128, u64)> {
    let metadata =
        fs::metadata(path).with_context(|| format!("Failed to get metadata for: {:?}", path))?;
    let mtime = metadata
        .modified()
        .context("Failed to get modification time")?
        .duration_since(SystemTime::UNIX_EPOCH)
        .context("Invalid modification time")?
        .as_nanos();
    Ok((mtime, metadata.len()))
}

/// A successful source load as stored in a cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedLoad {
    pub dataset: Dataset,
    pub rejected: Dataset,
    pub stats: LoadStats,
}

pub trait DatasetCache {
    fn get(&mut self, key: &CacheKey) -> Option<CachedLoad>;
    fn put(&mut self, key: CacheKey, load: CachedLoad);
}

/// Caches nothing; every lookup misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl DatasetCache for NoCache {
    fn get(&mut self, _key: &CacheKey) -> Option<CachedLoad> {
        None
    }

    fn put(&mut self, _key: CacheKey, _load: CachedLoad) {}
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: FxHashMap<CacheKey, CachedLoad>,
    hits: u64,
    misses: u64,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry of `source`, whatever path it was loaded from.
    pub fn invalidate(&mut self, source: SourceType) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.source != source);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        info!(dropped, "Cleared dataset cache");
    }
}

impl DatasetCache for MemoryCache {
    fn get(&mut self, key: &CacheKey) -> Option<CachedLoad> {
        match self.entries.get(key) {
            Some(load) => {
                self.hits += 1;
                debug!(source = %key.source, path = ?key.path, "Dataset cache hit");
                Some(load.clone())
            }
            None => {
                self.misses += 1;
                debug!(source = %key.source, path = ?key.path, "Dataset cache miss");
                None
            }
        }
    }

    fn put(&mut self, key: CacheKey, load: CachedLoad) {
        // Entries for an older version of the same input are stale.
        let before = self.entries.len();
        self.entries.retain(|k, _| {
            !(k.source == key.source && k.path == key.path && k.chunk_size == key.chunk_size)
        });
        if self.entries.len() < before {
            info!(
                source = %key.source,
                current_mtime = ?key.input_mtime,
                current_size = key.input_size,
                "Input file has changed since it was cached"
            );
        }
        self.entries.insert(key, load);
    }
}
