// Errors shared by every governance component
//
// Every rejected operation leaves state exactly as it was before the call.

use crate::contracts::lifecycle::Phase;
use crate::types::{Balance, BatchError, Hash, Timestamp};

/// Errors that can occur during governance operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GovernanceError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] BatchError),

    #[error("Proposer weight {weight} below threshold {threshold}")]
    InsufficientProposerWeight { weight: Balance, threshold: Balance },

    #[error("Proposal {0} already exists")]
    DuplicateProposal(Hash),

    #[error("Unknown proposal {0}")]
    UnknownProposal(Hash),

    #[error("Proposal is not active (phase {0:?})")]
    ProposalNotActive(Phase),

    #[error("Already voted on this proposal")]
    AlreadyVoted,

    #[error("Proposal has not succeeded (phase {0:?})")]
    NotSucceeded(Phase),

    #[error("Operation {0} already scheduled")]
    AlreadyScheduled(Hash),

    #[error("Unknown operation {0}")]
    UnknownOperation(Hash),

    #[error("Operation not ready (matures at {maturity}, now {now})")]
    NotReady { maturity: Timestamp, now: Timestamp },

    #[error("Operation already executed")]
    AlreadyExecuted,

    #[error("Predecessor {0} not executed")]
    PredecessorPending(Hash),

    #[error("Operation expired at {expired_at}")]
    OperationExpired { expired_at: Timestamp },

    #[error("Call {index} failed: {reason}")]
    SubcallFailed { index: usize, reason: String },

    #[error("Not the proposer")]
    NotProposer,

    #[error("Caller is not authorized")]
    Unauthorized,

    #[error("Proposal cannot be canceled in phase {0:?}")]
    NotCancelable(Phase),

    #[error("Delay {requested} below floor {floor}")]
    InvalidDelay { requested: u64, floor: u64 },
}
