use serde::{Deserialize, Serialize};

/// The height of a block in the chain, counted from the genesis block.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Height(pub u64);

impl Height {
    /// The expected number of blocks mined per UTC day, at the ten-minute
    /// target spacing.
    pub const PER_DAY: u64 = 144;
}

impl std::fmt::Display for Height {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
