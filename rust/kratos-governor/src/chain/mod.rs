// Chain - Height and time oracle consumed by the governor

pub mod clock;

pub use clock::{ChainClock, SimulatedChain, DEFAULT_BLOCK_TIME};
