// provider-store/src/sled_store.rs

use crate::store::{Direction, KvPair, OrderedStore};
use crate::StorageResult;
use serde::{Deserialize, Serialize};
use std::ops::Bound;

const TREE_NAME: &str = "provider_staking";

/// Sled database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SledConfig {
    pub path: String,
    pub cache_capacity: u64,
    pub flush_every_ms: Option<u64>,
}

impl Default for SledConfig {
    fn default() -> Self {
        Self {
            path: "./data/providers".to_string(),
            cache_capacity: 64 * 1024 * 1024, // 64 MB
            flush_every_ms: Some(500),
        }
    }
}

/// Persistent ordered store on top of a single sled tree
pub struct SledStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl SledStore {
    /// Open or create the database
    pub fn open(config: &SledConfig) -> StorageResult<Self> {
        let db = sled::Config::default()
            .path(&config.path)
            .cache_capacity(config.cache_capacity)
            .flush_every_ms(config.flush_every_ms)
            .open()?;
        let tree = db.open_tree(TREE_NAME)?;

        tracing::info!("Provider store opened at {}", config.path);
        Ok(Self { db, tree })
    }

    /// Flush dirty pages to disk, returning the number of bytes written
    pub fn flush(&self) -> StorageResult<usize> {
        Ok(self.db.flush()?)
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

impl OrderedStore for SledStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.tree.get(key)?.map(|v| v.to_vec()))
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.tree.insert(key, value)?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StorageResult<()> {
        self.tree.remove(key)?;
        Ok(())
    }

    fn scan_range(&self, start: &[u8], end: Option<&[u8]>, direction: Direction) -> StorageResult<Vec<KvPair>> {
        if matches!(end, Some(end) if end <= start) {
            return Ok(Vec::new());
        }
        let upper = match end {
            Some(end) => Bound::Excluded(end.to_vec()),
            None => Bound::Unbounded,
        };
        let iter = self.tree.range::<Vec<u8>, _>((Bound::Included(start.to_vec()), upper));

        let mut pairs = Vec::new();
        match direction {
            Direction::Forward => {
                for item in iter {
                    let (k, v) = item?;
                    pairs.push((k.to_vec(), v.to_vec()));
                }
            }
            Direction::Reverse => {
                for item in iter.rev() {
                    let (k, v) = item?;
                    pairs.push((k.to_vec(), v.to_vec()));
                }
            }
        }
        Ok(pairs)
    }

    fn count_prefix(&self, prefix: &[u8]) -> StorageResult<u64> {
        let mut count = 0;
        for item in self.tree.scan_prefix(prefix).keys() {
            item?;
            count += 1;
        }
        Ok(count)
    }
}
