//! Actor wrapper around the tree state.
//!
//! - `DhTreeHandle` is the cloneable public entry point.
//! - The tree state lives in a single `tokio` task fed by an unbounded
//!   command queue, so updates and lookups never interleave.
//! - `update()` / `remove()` are fire-and-forget; lookups wait on a oneshot
//!   reply computed inside the task.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::crypto::PublicKey;
use crate::dhtree::{check_claim, DhTree};
use crate::tree::TreeInfo;
use crate::types::{DhtInfoSource, Error, Result, TreeBroadcaster};

enum Command {
    Update(TreeInfo),
    Remove(PublicKey),
    Announce,
    LookupTree(TreeInfo, oneshot::Sender<PublicKey>),
    LookupKeySpace(PublicKey, oneshot::Sender<PublicKey>),
    SelfInfo(oneshot::Sender<TreeInfo>),
    Snapshot(oneshot::Sender<DebugSnapshot>),
}

/// Diagnostic snapshot of the tree state.
#[derive(Clone, Debug)]
pub struct DebugSnapshot {
    /// Our public key.
    pub key: PublicKey,
    /// Public key of the current tree root.
    pub root: PublicKey,
    /// Our parent, or our own key if we are the root.
    pub parent: PublicKey,
    /// Number of hops between the root and us.
    pub depth: usize,
    /// One entry per peer claim, sorted by key.
    pub peers: Vec<TreeEntry>,
}

/// A peer's claim as seen by the tree actor.
#[derive(Clone, Debug)]
pub struct TreeEntry {
    pub key: PublicKey,
    pub root: PublicKey,
    pub hops: usize,
    /// The claim passes back through us and is never selected.
    pub looped: bool,
}

/// Handle to a running tree actor.
#[derive(Clone)]
pub struct DhTreeHandle {
    public_key: PublicKey,
    config: Arc<Config>,
    tx: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
}

impl DhTreeHandle {
    /// Spawn the tree actor. Must be called from within a tokio runtime.
    pub fn new(
        public_key: PublicKey,
        config: Config,
        broadcaster: Arc<dyn TreeBroadcaster>,
        dinfos: Arc<dyn DhtInfoSource>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let tree = DhTree::new(public_key, broadcaster, dinfos);
        tokio::spawn(run_actor(tree, rx, cancel.clone()));

        Self {
            public_key,
            config: Arc::new(config),
            tx,
            cancel,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Ingest a claim that has already been validated.
    pub fn update(&self, info: TreeInfo) -> Result<()> {
        self.send(Command::Update(info))
    }

    /// Drop the claim of the peer that sent `info`.
    pub fn remove(&self, info: &TreeInfo) -> Result<()> {
        self.remove_peer(info.from_key())
    }

    /// Drop the claim of the peer with the given key.
    pub fn remove_peer(&self, key: PublicKey) -> Result<()> {
        self.send(Command::Remove(key))
    }

    /// Decode and validate a claim received from `peer`, then ingest it.
    pub fn handle_tree(&self, peer: &PublicKey, data: &[u8]) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        if data.len() as u64 > self.config.max_message_size {
            return Err(Error::OversizedMessage);
        }
        let info = TreeInfo::decode(data)?;
        if let Err(err) = check_claim(&self.public_key, peer, &info, &self.config) {
            tracing::warn!(
                "Rejected tree claim from {:?}: {}",
                hex::encode(&peer[..8]),
                err
            );
            return Err(err);
        }
        self.update(info)
    }

    /// Re-send our current claim to every peer, e.g. after a new link comes up.
    pub fn announce(&self) -> Result<()> {
        self.send(Command::Announce)
    }

    /// Next hop towards the node holding `dest` by tree distance. Our own key
    /// means `dest` lives under a different root, or we are the root and
    /// closest ourselves.
    pub async fn lookup_tree_hop(&self, dest: TreeInfo) -> Result<PublicKey> {
        self.request(|reply| Command::LookupTree(dest, reply)).await
    }

    /// Next hop towards `dest` on the key ring. Our own key means there is
    /// nowhere better to go.
    pub async fn lookup_key_space_hop(&self, dest: PublicKey) -> Result<PublicKey> {
        self.request(|reply| Command::LookupKeySpace(dest, reply)).await
    }

    /// Our currently selected claim.
    pub async fn self_info(&self) -> Result<TreeInfo> {
        self.request(Command::SelfInfo).await
    }

    pub async fn debug_snapshot(&self) -> Result<DebugSnapshot> {
        self.request(Command::Snapshot).await
    }

    /// Stop the actor. Fails if it was already stopped.
    pub fn close(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Closed);
        }
        self.cancel.cancel();
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }

    fn send(&self, cmd: Command) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Closed);
        }
        self.tx.send(cmd).map_err(|_| Error::Closed)
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply))?;
        rx.await.map_err(|_| Error::Closed)
    }
}

async fn run_actor(
    mut tree: DhTree,
    mut rx: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,
) {
    loop {
        let cmd = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            cmd = rx.recv() => match cmd {
                Some(cmd) => cmd,
                None => break,
            },
        };
        match cmd {
            Command::Update(info) => tree.update(info),
            Command::Remove(key) => tree.remove_peer(&key),
            Command::Announce => tree.announce(),
            Command::LookupTree(dest, reply) => {
                let _ = reply.send(tree.tree_lookup(&dest));
            }
            Command::LookupKeySpace(dest, reply) => {
                let _ = reply.send(tree.dht_lookup(&dest));
            }
            Command::SelfInfo(reply) => {
                let _ = reply.send(tree.self_info.clone());
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(snapshot(&tree));
            }
        }
    }
    tracing::debug!(
        "Tree actor for {:?} stopped",
        hex::encode(&tree.public_key[..8])
    );
}

fn snapshot(tree: &DhTree) -> DebugSnapshot {
    let mut peers: Vec<TreeEntry> = tree
        .tinfos
        .iter()
        .map(|(key, info)| TreeEntry {
            key: *key,
            root: info.root,
            hops: info.hops.len(),
            looped: !info.check_loops(),
        })
        .collect();
    peers.sort_by(|a, b| a.key.cmp(&b.key));

    DebugSnapshot {
        key: tree.public_key,
        root: tree.self_info.root,
        parent: tree.self_info.from_key(),
        depth: tree.self_info.hops.len(),
        peers,
    }
}

/// Spawn a tree actor. This is the primary public constructor.
pub fn new_dhtree(
    public_key: PublicKey,
    config: Config,
    broadcaster: Arc<dyn TreeBroadcaster>,
    dinfos: Arc<dyn DhtInfoSource>,
) -> DhTreeHandle {
    DhTreeHandle::new(public_key, config, broadcaster, dinfos)
}
