//! Build store for incremental generation
//!
//! Every output route is recorded with a fingerprint of all the inputs that
//! produced it. On the next build an output whose fingerprint is unchanged
//! and which still exists on disk is left alone.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;

use crate::error::{Error, Result};

/// Store file name inside the store directory
const CACHE_FILE: &str = "db.json";

/// Fingerprints of every output written by the last build
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CacheDb {
    /// Version of the store format
    pub version: u32,
    /// Output route -> input fingerprint
    pub outputs: BTreeMap<String, u64>,
}

impl CacheDb {
    /// Current store format version
    const VERSION: u32 = 1;

    /// Create an empty store with version set
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            ..Default::default()
        }
    }

    /// Load the store, or start empty if it is missing or unreadable
    pub fn load(store_dir: &Path) -> Self {
        let path = store_dir.join(CACHE_FILE);
        if let Ok(content) = fs::read_to_string(&path) {
            match serde_json::from_str::<CacheDb>(&content) {
                Ok(cache) if cache.version == Self::VERSION => return cache,
                Ok(_) => tracing::info!("Build store version mismatch, rebuilding everything"),
                Err(e) => tracing::warn!("Ignoring unreadable build store {:?}: {}", path, e),
            }
        }
        Self::new()
    }

    /// Save the store to disk
    pub fn save(&self, store_dir: &Path) -> Result<()> {
        fs::create_dir_all(store_dir).map_err(|e| Error::io(store_dir, e))?;
        let path = store_dir.join(CACHE_FILE);
        let content = serde_json::to_vec_pretty(self).map_err(|e| Error::io(&path, e.into()))?;
        fs::write(&path, content).map_err(|e| Error::io(&path, e))
    }

    /// Whether `route` was last produced from inputs with this fingerprint
    pub fn is_fresh(&self, route: &str, fingerprint: u64) -> bool {
        self.outputs.get(route) == Some(&fingerprint)
    }

    /// Record the fingerprint an output was produced from
    pub fn record(&mut self, route: &str, fingerprint: u64) {
        self.outputs.insert(route.to_string(), fingerprint);
    }
}

/// Accumulates the inputs of one output into a fingerprint
#[derive(Clone)]
pub struct Fingerprint {
    hasher: DefaultHasher,
}

impl Fingerprint {
    /// Start a fingerprint; the crate version is always mixed in
    pub fn new(kind: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        env!("CARGO_PKG_VERSION").hash(&mut hasher);
        kind.hash(&mut hasher);
        Self { hasher }
    }

    /// Mix in a named input
    pub fn add(mut self, name: &str, bytes: &[u8]) -> Self {
        name.hash(&mut self.hasher);
        bytes.hash(&mut self.hasher);
        self
    }

    /// Mix in another fingerprint's value
    pub fn add_hash(mut self, value: u64) -> Self {
        value.hash(&mut self.hasher);
        self
    }

    pub fn finish(&self) -> u64 {
        self.hasher.finish()
    }
}
