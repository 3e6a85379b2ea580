pub mod types;
pub mod config;
pub mod core;
pub mod tree;
pub mod dhtinfo;
pub mod peers;

pub(crate) mod crypto;
pub(crate) mod wire;
pub(crate) mod dhtree;

// Re-export primary public API
pub use crate::core::{new_dhtree, DebugSnapshot, DhTreeHandle, TreeEntry};
pub use crate::crypto::{dht_ordered, key_less, PublicKey, Sig, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
pub use crate::dhtinfo::{DhtInfo, DhtInfoTable};
pub use crate::peers::{PeerLinks, TreeSender};
pub use crate::tree::{TreeHop, TreeInfo, INFINITE_DIST};
pub use crate::types::{DhtInfoSource, Error, Result, TreeBroadcaster};
pub use crate::config::Config;
