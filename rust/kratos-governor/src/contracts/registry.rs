// Proposal Registry - Append-only store of proposals
//
// Proposal ids are a pure function of the call batch and description hash.
// Two submissions with the same batch and description map to the same id;
// the second one is rejected with `DuplicateProposal(id)` so the caller can
// still look the existing proposal up.

use crate::contracts::error::GovernanceError;
use crate::contracts::weights::VoteWeightSource;
use crate::types::{description_hash, AccountId, Balance, BlockNumber, CallBatch, Hash};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Timing and admission parameters for new proposals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingSettings {
    /// Blocks between creation and the weight snapshot
    pub voting_delay: BlockNumber,

    /// Blocks from the snapshot to the deadline (inclusive)
    pub voting_period: BlockNumber,

    /// Minimum weight the proposer must hold at the previous block
    pub proposal_threshold: Balance,
}

/// A governance proposal. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Derived from `calls` and `description_hash`
    pub id: Hash,

    /// Who created this proposal
    pub proposer: AccountId,

    /// The privileged calls to run once approved
    pub calls: CallBatch,

    /// Human-readable description
    pub description: String,

    /// Blake3 of `description`
    pub description_hash: Hash,

    /// Block when the proposal was created
    pub created_at: BlockNumber,

    /// Height at which voting weights are read
    pub snapshot: BlockNumber,

    /// First block accepting votes
    pub vote_start: BlockNumber,

    /// Last block accepting votes
    pub deadline: BlockNumber,
}

/// Owns every proposal for its full lifetime
#[derive(Debug, Clone)]
pub struct ProposalRegistry {
    settings: VotingSettings,
    proposals: HashMap<Hash, Proposal>,
    /// Creation order, for listing
    order: Vec<Hash>,
    canceled: HashSet<Hash>,
}

impl ProposalRegistry {
    pub fn new(settings: VotingSettings) -> Self {
        Self {
            settings,
            proposals: HashMap::new(),
            order: Vec::new(),
            canceled: HashSet::new(),
        }
    }

    pub fn settings(&self) -> &VotingSettings {
        &self.settings
    }

    /// Create a new proposal
    pub fn create<W: VoteWeightSource>(
        &mut self,
        calls: CallBatch,
        description: &str,
        proposer: AccountId,
        current_height: BlockNumber,
        weights: &W,
    ) -> Result<Hash, GovernanceError> {
        let weight = weights.weight_at(&proposer, current_height.saturating_sub(1));
        if weight < self.settings.proposal_threshold {
            return Err(GovernanceError::InsufficientProposerWeight {
                weight,
                threshold: self.settings.proposal_threshold,
            });
        }

        let desc_hash = description_hash(description);
        let id = calls.proposal_id(&desc_hash);
        if self.proposals.contains_key(&id) {
            return Err(GovernanceError::DuplicateProposal(id));
        }

        let snapshot = current_height.saturating_add(self.settings.voting_delay);
        let proposal = Proposal {
            id,
            proposer,
            calls,
            description: description.to_string(),
            description_hash: desc_hash,
            created_at: current_height,
            snapshot,
            vote_start: snapshot.saturating_add(1),
            deadline: snapshot.saturating_add(self.settings.voting_period),
        };

        info!(
            "📜 Proposal {} created by {} (snapshot #{}, deadline #{})",
            id, proposer, proposal.snapshot, proposal.deadline
        );

        self.proposals.insert(id, proposal);
        self.order.push(id);
        Ok(id)
    }

    pub fn get(&self, id: &Hash) -> Option<&Proposal> {
        self.proposals.get(id)
    }

    /// Proposals in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.order.iter().filter_map(|id| self.proposals.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn mark_canceled(&mut self, id: Hash) {
        self.canceled.insert(id);
    }

    pub fn is_canceled(&self, id: &Hash) -> bool {
        self.canceled.contains(id)
    }
}
