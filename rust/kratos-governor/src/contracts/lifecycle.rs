// Lifecycle - Proposal phase derivation
//
// The phase is never stored. It is recomputed on every query from proposal
// timing, cancellation, the vote outcome and the timelock operation, so it
// cannot drift from its inputs.

use crate::contracts::timelock::{OperationStatus, TimelockOperation};
use crate::types::{BlockNumber, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived lifecycle stage. Discriminants follow the usual governor encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Pending = 0,
    Active = 1,
    Canceled = 2,
    Defeated = 3,
    Succeeded = 4,
    Queued = 5,
    Expired = 6,
    Executed = 7,
}

impl Phase {
    /// No further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Canceled | Phase::Defeated | Phase::Expired | Phase::Executed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Phase::Pending => "Pending",
            Phase::Active => "Active",
            Phase::Canceled => "Canceled",
            Phase::Defeated => "Defeated",
            Phase::Succeeded => "Succeeded",
            Phase::Queued => "Queued",
            Phase::Expired => "Expired",
            Phase::Executed => "Executed",
        };
        write!(f, "{}", name)
    }
}

/// Timelock facts relevant to a proposal's phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationView {
    pub status: OperationStatus,
    /// First instant at which execution is no longer allowed
    pub expires_at: Option<Timestamp>,
}

impl OperationView {
    pub fn observe(op: &TimelockOperation, expires_at: Option<Timestamp>, now: Timestamp) -> Self {
        Self {
            status: op.status_at(now),
            expires_at,
        }
    }
}

/// Everything the phase depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseInputs {
    pub vote_start: BlockNumber,
    pub deadline: BlockNumber,
    pub canceled: bool,
    pub quorum_met: bool,
    pub majority_for: bool,
    pub operation: Option<OperationView>,
}

/// Pure phase function
pub fn derive_phase(inputs: &PhaseInputs, height: BlockNumber, now: Timestamp) -> Phase {
    if let Some(op) = inputs.operation {
        match op.status {
            OperationStatus::Done => return Phase::Executed,
            OperationStatus::Canceled => return Phase::Canceled,
            _ => {}
        }
    }

    if inputs.canceled {
        return Phase::Canceled;
    }

    if height < inputs.vote_start {
        return Phase::Pending;
    }

    if height <= inputs.deadline {
        return Phase::Active;
    }

    if !(inputs.quorum_met && inputs.majority_for) {
        return Phase::Defeated;
    }

    match inputs.operation {
        None | Some(OperationView { status: OperationStatus::Unscheduled, .. }) => Phase::Succeeded,
        Some(op) => match op.expires_at {
            Some(expiry) if now >= expiry => Phase::Expired,
            _ => Phase::Queued,
        },
    }
}
