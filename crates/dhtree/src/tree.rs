//! Signed path records ("tree claims").
//!
//! A `TreeInfo` states that its holder is reachable from `root` through an
//! exact sequence of hops. Each hop is signed by the key that held the path
//! before it, over `root` and every `next` key up to and including that hop,
//! so a claim can be extended but never rewritten by the nodes it passes
//! through.

use std::collections::HashSet;

use ed25519_dalek::SigningKey;

use crate::crypto::{Crypto, PublicKey, Sig, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
use crate::types::Error;
use crate::wire::WireReader;

/// Encoded size of a single hop.
pub(crate) const HOP_SIZE: usize = PUBLIC_KEY_SIZE + SIGNATURE_SIZE;

/// Distance between claims that do not share a root.
pub const INFINITE_DIST: u64 = u64::MAX;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeHop {
    pub next: PublicKey,
    pub sig: Sig,
}

/// A signed claim of a path from `root` to the key in the last hop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeInfo {
    pub root: PublicKey,
    pub hops: Vec<TreeHop>,
}

impl TreeInfo {
    /// The degenerate claim of a node that considers itself the root.
    pub fn new(root: PublicKey) -> Self {
        Self {
            root,
            hops: Vec::new(),
        }
    }

    /// Key of the node that advertised this claim to its holder.
    pub fn from_key(&self) -> PublicKey {
        // Last hop points at the holder, the one before it at the sender.
        match self.hops.len() {
            0 | 1 => self.root,
            n => self.hops[n - 2].next,
        }
    }

    /// Key of the node this claim ends at.
    pub fn holder(&self) -> PublicKey {
        self.hops.last().map_or(self.root, |hop| hop.next)
    }

    /// Verify the whole signature chain. A claim without hops is never valid
    /// coming from a peer.
    pub fn check_sigs(&self) -> bool {
        if self.hops.is_empty() {
            return false;
        }
        let mut bs = Vec::with_capacity(PUBLIC_KEY_SIZE * (self.hops.len() + 1));
        bs.extend_from_slice(&self.root);
        let mut key = self.root;
        for hop in &self.hops {
            bs.extend_from_slice(&hop.next);
            if !Crypto::verify(&key, &bs, &hop.sig) {
                return false;
            }
            key = hop.next;
        }
        true
    }

    /// False if any key appears twice along the path.
    pub fn check_loops(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.hops.len() + 1);
        seen.insert(self.root);
        self.hops.iter().all(|hop| seen.insert(hop.next))
    }

    /// Extend the claim by one hop towards `next`, signed by `key`.
    pub fn add(&self, key: &SigningKey, next: PublicKey) -> TreeInfo {
        let mut bs = Vec::with_capacity(PUBLIC_KEY_SIZE * (self.hops.len() + 2));
        bs.extend_from_slice(&self.root);
        for hop in &self.hops {
            bs.extend_from_slice(&hop.next);
        }
        bs.extend_from_slice(&next);
        let sig = Crypto::sign_with_key(key, &bs);

        let mut hops = Vec::with_capacity(self.hops.len() + 1);
        hops.extend_from_slice(&self.hops);
        hops.push(TreeHop { next, sig });
        TreeInfo {
            root: self.root,
            hops,
        }
    }

    /// Tree distance to `other`, or [`INFINITE_DIST`] if the roots differ.
    pub fn dist(&self, other: &TreeInfo) -> u64 {
        if self.root != other.root {
            return INFINITE_DIST;
        }
        hops_dist(&self.hops, &other.hops)
    }

    /// Tree distance from the sender of this claim to `other`, i.e. with the
    /// hop that points at the holder stripped off.
    pub(crate) fn sender_dist(&self, other: &TreeInfo) -> u64 {
        if self.root != other.root {
            return INFINITE_DIST;
        }
        let hops = self.hops.split_last().map_or(&[][..], |(_, rest)| rest);
        hops_dist(hops, &other.hops)
    }

    pub fn size(&self) -> usize {
        PUBLIC_KEY_SIZE + self.hops.len() * HOP_SIZE
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.reserve(self.size());
        out.extend_from_slice(&self.root);
        for hop in &self.hops {
            out.extend_from_slice(&hop.next);
            out.extend_from_slice(&hop.sig);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        self.encode(&mut out);
        out
    }

    /// Decode a claim. Fails unless everything after the root is a whole
    /// number of hops.
    pub fn decode(data: &[u8]) -> Result<Self, Error> {
        let mut r = WireReader::new(data);
        let root = r.read_public_key()?;
        if r.remaining() % HOP_SIZE != 0 {
            return Err(Error::Decode);
        }
        let mut hops = Vec::with_capacity(r.remaining() / HOP_SIZE);
        while !r.is_empty() {
            let next = r.read_public_key()?;
            let sig = r.read_signature()?;
            hops.push(TreeHop { next, sig });
        }
        Ok(Self { root, hops })
    }
}

fn hops_dist(a: &[TreeHop], b: &[TreeHop]) -> u64 {
    let common = a
        .iter()
        .zip(b)
        .take_while(|(x, y)| x.next == y.next)
        .count();
    (a.len() + b.len() - 2 * common) as u64
}
