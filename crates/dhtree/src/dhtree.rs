//! Spanning tree state and greedy lookups.
//!
//! Key algorithms:
//! - Root election: lexicographically greatest ed25519 key wins
//! - Parent selection: shortest signed path to the root, ties broken by the
//!   greater sender key
//! - Tree routing: forward to the neighbour closest in tree-space to the
//!   destination's claim
//! - Key-space routing: forward to whatever known key sits closest to the
//!   destination on the key ring
//!
//! `DhTree` is plain state; it is owned and driven by the actor task in
//! `core.rs`, which serializes every mutation and lookup.

use std::collections::HashMap;
use std::iter;
use std::sync::Arc;

use crate::config::Config;
use crate::crypto::{dht_ordered, key_less, PublicKey};
use crate::tree::TreeInfo;
use crate::types::{DhtInfoSource, Error, Result, TreeBroadcaster};

pub(crate) struct DhTree {
    pub public_key: PublicKey,
    /// Latest claim received from each directly connected peer, keyed by the
    /// claim's sender.
    pub tinfos: HashMap<PublicKey, TreeInfo>,
    /// Our selected position in the tree.
    pub self_info: TreeInfo,
    dinfos: Arc<dyn DhtInfoSource>,
    broadcaster: Arc<dyn TreeBroadcaster>,
}

impl DhTree {
    pub fn new(
        public_key: PublicKey,
        broadcaster: Arc<dyn TreeBroadcaster>,
        dinfos: Arc<dyn DhtInfoSource>,
    ) -> Self {
        Self {
            public_key,
            tinfos: HashMap::new(),
            self_info: TreeInfo::new(public_key),
            dinfos,
            broadcaster,
        }
    }

    /// Store a peer's claim and re-run root selection. The claim must already
    /// have passed [`check_claim`].
    pub fn update(&mut self, info: TreeInfo) {
        let key = info.from_key();
        let reselect = key == self.self_info.from_key();
        tracing::debug!(
            "Tree: claim from {:?}, root={:?} hops={}",
            hex::encode(&key[..8]),
            hex::encode(&info.root[..8]),
            info.hops.len()
        );
        self.tinfos.insert(key, info);
        self.fix(reselect);
    }

    /// Forget a peer's claim. Only a loss of our parent triggers reselection.
    pub fn remove_peer(&mut self, key: &PublicKey) {
        if self.tinfos.remove(key).is_none() {
            return;
        }
        tracing::debug!("Tree: removed peer {:?}", hex::encode(&key[..8]));
        if *key == self.self_info.from_key() {
            self.fix(true);
        }
    }

    /// Publish the current claim without re-running selection.
    pub fn announce(&self) {
        self.broadcaster.send_tree(&self.self_info);
    }

    /// Root election. With `reselect` the current choice is discarded and
    /// rebuilt from the degenerate self-rooted claim.
    pub fn fix(&mut self, reselect: bool) {
        let own_key = self.public_key;
        let fallback = TreeInfo::new(own_key);
        let mut best = if reselect || key_less(&self.self_info.root, &own_key) {
            &fallback
        } else {
            &self.self_info
        };
        for info in self.tinfos.values() {
            // A looped claim came back through us, e.g. from a child.
            if info.check_loops() && Self::is_better(info, best) {
                best = info;
            }
        }
        // Reselection always republishes, even an unchanged claim.
        if !reselect && *best == self.self_info {
            return;
        }
        let best = best.clone();
        tracing::debug!(
            "Tree: adopted parent {:?}, root {:?}, depth {}",
            hex::encode(&best.from_key()[..8]),
            hex::encode(&best.root[..8]),
            best.hops.len()
        );
        self.self_info = best;
        self.broadcaster.send_tree(&self.self_info);
    }

    fn is_better(info: &TreeInfo, best: &TreeInfo) -> bool {
        if info.root != best.root {
            return key_less(&best.root, &info.root);
        }
        if info.hops.len() != best.hops.len() {
            return info.hops.len() < best.hops.len();
        }
        key_less(&best.from_key(), &info.from_key())
    }

    /// Next hop towards the node holding `dest`, by tree distance: the sender
    /// of the closest claim, which is our parent when our own position is
    /// closest. Returns our own key when the destination lives under a
    /// different root.
    pub fn tree_lookup(&self, dest: &TreeInfo) -> PublicKey {
        let mut best_root = self.self_info.root;
        let mut best_peer = self.self_info.from_key();
        let mut best_dist = self.self_info.dist(dest);
        for info in self.tinfos.values() {
            if info.hops.is_empty() {
                continue;
            }
            let dist = info.sender_dist(dest);
            let peer = info.from_key();
            if dist < best_dist || (dist == best_dist && key_less(&best_peer, &peer)) {
                best_root = info.root;
                best_peer = peer;
                best_dist = dist;
            }
        }
        if best_root != dest.root {
            // Dead end, so stay here
            return self.public_key;
        }
        best_peer
    }

    /// Next hop towards `dest` on the key ring.
    pub fn dht_lookup(&self, dest: &PublicKey) -> PublicKey {
        let own_key = self.public_key;
        let mut best = own_key;
        let mut best_peer = own_key;

        // Root and ancestors are reached through our parent.
        let parent = self.self_info.from_key();
        let ancestry = iter::once(self.self_info.root)
            .chain(self.self_info.hops.iter().map(|hop| hop.next))
            .filter(|key| *key != own_key);
        for key in ancestry {
            if dht_ordered(dest, &key, &best) {
                best = key;
                best_peer = parent;
            }
        }

        for peer in self.tinfos.keys() {
            if dht_ordered(dest, peer, &best) {
                best = *peer;
                best_peer = *peer;
            }
        }

        // Known key-space paths lead back towards their source.
        for info in self.dinfos.dht_infos() {
            if dht_ordered(dest, &info.source, &best) {
                best = info.source;
                best_peer = info.prev;
            }
        }
        best_peer
    }
}

/// Validate a claim delivered by `peer` before it may reach [`DhTree::update`].
pub(crate) fn check_claim(
    own_key: &PublicKey,
    peer: &PublicKey,
    info: &TreeInfo,
    config: &Config,
) -> Result<()> {
    if info.hops.len() > config.max_tree_hops {
        return Err(Error::OversizedMessage);
    }
    if info.hops.is_empty() || info.holder() != *own_key || info.from_key() != *peer {
        return Err(Error::BadMessage);
    }
    if !info.check_sigs() {
        return Err(Error::BadSignature);
    }
    Ok(())
}
