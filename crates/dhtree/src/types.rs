use crate::dhtinfo::DhtInfo;
use crate::tree::TreeInfo;

/// Errors returned by dhtree operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("decode error")]
    Decode,
    #[error("bad signature")]
    BadSignature,
    #[error("bad message")]
    BadMessage,
    #[error("oversized message")]
    OversizedMessage,
    #[error("bad key")]
    BadKey,
    #[error("tree actor closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Publishes this node's tree claim to its connected peers.
///
/// Called from inside the tree actor whenever the selected claim changes, so
/// implementations must not block.
pub trait TreeBroadcaster: Send + Sync + 'static {
    fn send_tree(&self, info: &TreeInfo);
}

// Plain closures work as broadcasters.
impl<F> TreeBroadcaster for F
where
    F: Fn(&TreeInfo) + Send + Sync + 'static,
{
    fn send_tree(&self, info: &TreeInfo) {
        self(info)
    }
}

/// Read-only view of the key-space path table maintained outside the core.
pub trait DhtInfoSource: Send + Sync + 'static {
    /// Current entries, at most one per source key.
    fn dht_infos(&self) -> Vec<DhtInfo>;
}
