/// Configuration for a tree actor.
#[derive(Clone, Debug)]
pub struct Config {
    /// Largest encoded tree claim accepted from a peer. Default: 1 MB.
    pub max_message_size: u64,
    /// Largest hop count accepted in a peer's tree claim. Default: 256.
    pub max_tree_hops: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_message_size: 1024 * 1024,
            max_tree_hops: 256,
        }
    }
}

impl Config {
    pub fn with_max_message_size(mut self, size: u64) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn with_max_tree_hops(mut self, hops: usize) -> Self {
        self.max_tree_hops = hops;
        self
    }
}
