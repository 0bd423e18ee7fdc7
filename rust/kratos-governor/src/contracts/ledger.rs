// Vote Ledger - One vote per (proposal, voter), tallied at the snapshot
//
// Weight is always read at the proposal snapshot, never at cast time, so
// power acquired after proposal creation cannot influence the outcome.

use crate::contracts::error::GovernanceError;
use crate::contracts::registry::Proposal;
use crate::contracts::weights::VoteWeightSource;
use crate::types::{AccountId, Balance, BlockNumber, Hash};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Ballot choice. Discriminants follow the usual governor encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteChoice {
    Against = 0,
    For = 1,
    Abstain = 2,
}

impl VoteChoice {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(VoteChoice::Against),
            1 => Some(VoteChoice::For),
            2 => Some(VoteChoice::Abstain),
            _ => None,
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VoteChoice::Against => write!(f, "Against"),
            VoteChoice::For => write!(f, "For"),
            VoteChoice::Abstain => write!(f, "Abstain"),
        }
    }
}

impl FromStr for VoteChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "against" | "no" | "0" => Ok(VoteChoice::Against),
            "for" | "yes" | "1" => Ok(VoteChoice::For),
            "abstain" | "2" => Ok(VoteChoice::Abstain),
            other => Err(format!("unknown vote choice: {}", other)),
        }
    }
}

/// Record of a single vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub proposal: Hash,
    pub voter: AccountId,
    pub choice: VoteChoice,
    /// Weight at the proposal snapshot
    pub weight: Balance,
    /// Block the vote was cast in
    pub cast_at: BlockNumber,
}

/// Per-choice weight sums
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub against: Balance,
    pub for_votes: Balance,
    pub abstain: Balance,
}

impl Tally {
    pub fn total(&self) -> Balance {
        self.against
            .saturating_add(self.for_votes)
            .saturating_add(self.abstain)
    }

    /// Strict majority of For over Against; ties fail
    pub fn majority_for(&self) -> bool {
        self.for_votes > self.against
    }

    fn add(&mut self, choice: VoteChoice, weight: Balance) {
        let slot = match choice {
            VoteChoice::Against => &mut self.against,
            VoteChoice::For => &mut self.for_votes,
            VoteChoice::Abstain => &mut self.abstain,
        };
        *slot = slot.saturating_add(weight);
    }

    /// (against, for, abstain)
    pub fn as_tuple(&self) -> (Balance, Balance, Balance) {
        (self.against, self.for_votes, self.abstain)
    }
}

/// Owns vote records and tallies for every proposal
#[derive(Debug, Clone, Default)]
pub struct VoteLedger {
    votes: HashMap<(Hash, AccountId), VoteRecord>,
    tallies: HashMap<Hash, Tally>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a vote and bump the tally in one step. The caller is
    /// responsible for checking the proposal is Active.
    pub fn cast<W: VoteWeightSource>(
        &mut self,
        proposal: &Proposal,
        voter: AccountId,
        choice: VoteChoice,
        current_height: BlockNumber,
        weights: &W,
    ) -> Result<Balance, GovernanceError> {
        let key = (proposal.id, voter);
        if self.votes.contains_key(&key) {
            return Err(GovernanceError::AlreadyVoted);
        }

        let weight = weights.weight_at(&voter, proposal.snapshot);

        self.votes.insert(
            key,
            VoteRecord {
                proposal: proposal.id,
                voter,
                choice,
                weight,
                cast_at: current_height,
            },
        );
        self.tallies.entry(proposal.id).or_default().add(choice, weight);

        info!(
            "🗳️  Vote {} by {} on {} with weight {} at block #{}",
            choice, voter, proposal.id, weight, current_height
        );

        Ok(weight)
    }

    /// Current sums; zero for proposals without votes
    pub fn tally(&self, id: &Hash) -> Tally {
        self.tallies.get(id).copied().unwrap_or_default()
    }

    pub fn has_voted(&self, id: &Hash, voter: &AccountId) -> bool {
        self.votes.contains_key(&(*id, *voter))
    }

    pub fn vote_of(&self, id: &Hash, voter: &AccountId) -> Option<&VoteRecord> {
        self.votes.get(&(*id, *voter))
    }

    /// Drop every vote and tally. Only used at a full state reset.
    pub fn reset(&mut self) {
        self.votes.clear();
        self.tallies.clear();
    }
}
