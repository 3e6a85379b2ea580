//! Peer link registry and tree broadcast.
//!
//! Each directly connected peer is represented by an outbound channel of
//! encoded tree claims. Whatever drains the channel (a connection writer, an
//! in-memory test link) owns delivery; this side never blocks.

use std::collections::HashMap;
use std::sync::Mutex;

use ed25519_dalek::SigningKey;
use tokio::sync::mpsc;

use crate::crypto::{Crypto, PublicKey};
use crate::tree::TreeInfo;
use crate::types::{Error, Result, TreeBroadcaster};

/// Outbound side of a peer link: encoded tree claims.
pub type TreeSender = mpsc::UnboundedSender<Vec<u8>>;

/// Broadcaster that signs a dedicated one-hop extension of our claim for
/// every connected peer.
pub struct PeerLinks {
    crypto: Crypto,
    links: Mutex<HashMap<PublicKey, TreeSender>>,
}

impl PeerLinks {
    pub fn new(signing_key: SigningKey) -> Self {
        Self {
            crypto: Crypto::new(signing_key),
            links: Mutex::new(HashMap::new()),
        }
    }

    /// Register a link. Replaces any previous link to the same key and
    /// returns false in that case.
    pub fn add_peer(&self, key: PublicKey, tx: TreeSender) -> Result<bool> {
        // Don't link to ourselves
        if key == self.crypto.public_key {
            return Err(Error::BadKey);
        }
        let mut links = self.links.lock().unwrap_or_else(|e| e.into_inner());
        Ok(links.insert(key, tx).is_none())
    }

    pub fn remove_peer(&self, key: &PublicKey) -> bool {
        let mut links = self.links.lock().unwrap_or_else(|e| e.into_inner());
        links.remove(key).is_some()
    }

    pub fn peer_keys(&self) -> Vec<PublicKey> {
        let links = self.links.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<PublicKey> = links.keys().copied().collect();
        keys.sort();
        keys
    }
}

impl TreeBroadcaster for PeerLinks {
    fn send_tree(&self, info: &TreeInfo) {
        let mut links = self.links.lock().unwrap_or_else(|e| e.into_inner());
        links.retain(|key, tx| {
            let claim = info.add(&self.crypto.signing_key, *key);
            if tx.send(claim.to_bytes()).is_err() {
                tracing::debug!("Dropping closed link to {:?}", hex::encode(&key[..8]));
                return false;
            }
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    fn pk(key: &SigningKey) -> PublicKey {
        key.verifying_key().to_bytes()
    }

    #[test]
    fn sends_signed_extension_per_peer() {
        let me = SigningKey::generate(&mut OsRng);
        let peers: Vec<SigningKey> = (0..3).map(|_| SigningKey::generate(&mut OsRng)).collect();
        let links = PeerLinks::new(me.clone());

        let mut rxs = Vec::new();
        for peer in &peers {
            let (tx, rx) = mpsc::unbounded_channel();
            assert!(links.add_peer(pk(peer), tx).unwrap());
            rxs.push(rx);
        }
        assert_eq!(links.peer_keys().len(), 3);

        links.send_tree(&TreeInfo::new(pk(&me)));

        for (peer, rx) in peers.iter().zip(rxs.iter_mut()) {
            let bytes = rx.try_recv().unwrap();
            let claim = TreeInfo::decode(&bytes).unwrap();
            assert!(claim.check_sigs());
            assert_eq!(claim.root, pk(&me));
            assert_eq!(claim.from_key(), pk(&me));
            assert_eq!(claim.holder(), pk(peer));
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn closed_links_are_pruned() {
        let me = SigningKey::generate(&mut OsRng);
        let links = PeerLinks::new(me.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        links.add_peer([1; 32], tx).unwrap();
        drop(rx);
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(links.add_peer([2; 32], tx.clone()).unwrap());
        assert!(!links.add_peer([2; 32], tx.clone()).unwrap());
        assert_eq!(links.add_peer(pk(&me), tx), Err(Error::BadKey));

        links.send_tree(&TreeInfo::new(pk(&me)));
        assert_eq!(links.peer_keys(), vec![[2; 32]]);

        assert!(links.remove_peer(&[2; 32]));
        assert!(!links.remove_peer(&[2; 32]));
        assert!(links.peer_keys().is_empty());
    }
}
