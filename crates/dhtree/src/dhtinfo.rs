//! Key-space path segments.
//!
//! Entries are created, refreshed and expired by the DHT maintenance layer;
//! the tree actor only reads them when answering key-space lookups.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::crypto::PublicKey;
use crate::types::DhtInfoSource;

/// One hop of a key-space path from `source` to `dest`, as seen by the node
/// sitting between `prev` and `next`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DhtInfo {
    pub source: PublicKey,
    pub prev: PublicKey,
    pub next: PublicKey,
    pub dest: PublicKey,
}

/// Shared table of path segments keyed by source.
#[derive(Default)]
pub struct DhtInfoTable {
    infos: RwLock<HashMap<PublicKey, DhtInfo>>,
}

impl DhtInfoTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `info.source`.
    pub fn insert(&self, info: DhtInfo) -> Option<DhtInfo> {
        let mut infos = self.infos.write().unwrap_or_else(|e| e.into_inner());
        infos.insert(info.source, info)
    }

    pub fn remove(&self, source: &PublicKey) -> Option<DhtInfo> {
        let mut infos = self.infos.write().unwrap_or_else(|e| e.into_inner());
        infos.remove(source)
    }

    pub fn len(&self) -> usize {
        self.infos.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DhtInfoSource for DhtInfoTable {
    fn dht_infos(&self) -> Vec<DhtInfo> {
        let infos = self.infos.read().unwrap_or_else(|e| e.into_inner());
        infos.values().copied().collect()
    }
}
