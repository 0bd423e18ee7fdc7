// Governance contracts
// Principle: Every privileged action passes vote, quorum and timelock

pub mod error;
pub mod weights;
pub mod registry;
pub mod ledger;
pub mod quorum;
pub mod lifecycle;
pub mod timelock;
pub mod execution;
pub mod treasury;
pub mod governor;

pub use error::GovernanceError;
pub use execution::{CallExecutor, ExecutionGuard, ExecutionResult};
pub use governor::{Governor, GovernorEvent};
pub use ledger::{Tally, VoteChoice, VoteLedger, VoteRecord};
pub use lifecycle::{derive_phase, Phase};
pub use quorum::{QuorumConfig, QuorumCounting, QuorumPolicy};
pub use registry::{Proposal, ProposalRegistry, VotingSettings};
pub use timelock::{OperationStatus, TimelockConfig, TimelockOperation, TimelockScheduler};
pub use treasury::Treasury;
pub use weights::{CheckpointedVotes, VoteWeightSource};
