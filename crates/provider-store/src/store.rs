// provider-store/src/store.rs

use crate::StorageResult;
use std::collections::BTreeMap;
use std::ops::Bound;

/// A key/value pair returned by a scan
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Scan order over the key space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Byte-key ordered map the keeper persists into.
///
/// Scans return a snapshot so callers may mutate the store while walking the
/// results.
pub trait OrderedStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    fn set(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    fn delete(&mut self, key: &[u8]) -> StorageResult<()>;

    /// Entries with `start <= key < end`; `end = None` is unbounded
    fn scan_range(&self, start: &[u8], end: Option<&[u8]>, direction: Direction) -> StorageResult<Vec<KvPair>>;

    fn scan_prefix(&self, prefix: &[u8], direction: Direction) -> StorageResult<Vec<KvPair>> {
        let end = prefix_end(prefix);
        self.scan_range(prefix, end.as_deref(), direction)
    }

    fn has(&self, key: &[u8]) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Number of keys starting with `prefix`
    fn count_prefix(&self, prefix: &[u8]) -> StorageResult<u64> {
        Ok(self.scan_prefix(prefix, Direction::Forward)?.len() as u64)
    }
}

/// Smallest key strictly greater than every key starting with `prefix`.
/// `None` when the prefix is all `0xff` (scan to the end of the key space).
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// BTreeMap-backed store used by tests and ephemeral nodes
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    map: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl OrderedStore for MemoryStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.map.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.map.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StorageResult<()> {
        self.map.remove(key);
        Ok(())
    }

    fn scan_range(&self, start: &[u8], end: Option<&[u8]>, direction: Direction) -> StorageResult<Vec<KvPair>> {
        if matches!(end, Some(end) if end <= start) {
            return Ok(Vec::new());
        }
        let upper = match end {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        let range = self.map.range::<[u8], _>((Bound::Included(start), upper));
        let pairs = match direction {
            Direction::Forward => range.map(|(k, v)| (k.clone(), v.clone())).collect(),
            Direction::Reverse => range.rev().map(|(k, v)| (k.clone(), v.clone())).collect(),
        };
        Ok(pairs)
    }

    fn count_prefix(&self, prefix: &[u8]) -> StorageResult<u64> {
        let upper = match prefix_end(prefix) {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        let count = self
            .map
            .range::<Vec<u8>, _>((Bound::Included(prefix.to_vec()), upper))
            .count();
        Ok(count as u64)
    }
}
