// Clock - Externally supplied block height and timestamp
//
// The engine never reads the wall clock. Every height or time it acts on
// comes from a `ChainClock`, which keeps runs deterministic and replayable.

use crate::types::{BlockNumber, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Seconds per block when mining advances time
pub const DEFAULT_BLOCK_TIME: Timestamp = 12;

pub trait ChainClock {
    fn current_height(&self) -> BlockNumber;
    fn current_time(&self) -> Timestamp;
}

/// Manually advanced chain, used by the driver and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedChain {
    height: BlockNumber,
    time: Timestamp,
    block_time: Timestamp,
}

impl SimulatedChain {
    pub fn new(height: BlockNumber, time: Timestamp) -> Self {
        Self {
            height,
            time,
            block_time: DEFAULT_BLOCK_TIME,
        }
    }

    pub fn with_block_time(mut self, block_time: Timestamp) -> Self {
        self.block_time = block_time;
        self
    }

    /// Mine `blocks` blocks, each moving time forward by the block time
    pub fn advance_blocks(&mut self, blocks: BlockNumber) {
        self.height = self.height.saturating_add(blocks);
        self.time = self.time.saturating_add(blocks.saturating_mul(self.block_time));
        debug!("⛏️  Mined {} blocks -> #{} @ {}", blocks, self.height, self.time);
    }

    /// Move time forward without mining
    pub fn advance_time(&mut self, seconds: Timestamp) {
        self.time = self.time.saturating_add(seconds);
        debug!("⏩ Time advanced {}s -> {}", seconds, self.time);
    }
}

impl Default for SimulatedChain {
    fn default() -> Self {
        Self::new(1, 1_700_000_000)
    }
}

impl ChainClock for SimulatedChain {
    fn current_height(&self) -> BlockNumber {
        self.height
    }

    fn current_time(&self) -> Timestamp {
        self.time
    }
}
