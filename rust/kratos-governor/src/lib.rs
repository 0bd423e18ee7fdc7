// KratOs Governor - Token-weighted governance behind a timelock
// Principle: Power is slow, and what was approved is exactly what runs

pub mod chain;
pub mod cli;
pub mod contracts;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use chain::{ChainClock, SimulatedChain};
pub use contracts::{
    CallExecutor, CheckpointedVotes, GovernanceError, Governor, GovernorEvent, Phase, Tally,
    VoteChoice, VoteWeightSource,
};
pub use service::GovernorService;
