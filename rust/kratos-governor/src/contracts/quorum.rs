// Quorum Policy - Minimum participation for a binding outcome
//
// Pluggable: the governor holds a `Box<dyn QuorumPolicy>` built from
// configuration. Default is 4% of total supply at the snapshot, counting
// For + Abstain weight.

use crate::contracts::ledger::Tally;
use crate::types::Balance;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which tally buckets count toward quorum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuorumCounting {
    /// For + Abstain
    ForAbstain,
    /// For + Against
    ForAgainst,
    /// For + Against + Abstain
    AllVotes,
}

impl QuorumCounting {
    pub fn counted(&self, tally: &Tally) -> Balance {
        match self {
            QuorumCounting::ForAbstain => tally.for_votes.saturating_add(tally.abstain),
            QuorumCounting::ForAgainst => tally.for_votes.saturating_add(tally.against),
            QuorumCounting::AllVotes => tally.total(),
        }
    }
}

/// Decides whether participation meets the required minimum
pub trait QuorumPolicy: fmt::Debug + Send + Sync {
    /// Required weight given total supply at the snapshot
    fn quorum(&self, total_supply: Balance) -> Balance;

    /// Weight from the tally that counts toward quorum
    fn counted(&self, tally: &Tally) -> Balance;

    fn is_met(&self, tally: &Tally, total_supply: Balance) -> bool {
        self.counted(tally) >= self.quorum(total_supply)
    }
}

/// Fraction of total supply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplyFraction {
    pub numerator: u128,
    pub denominator: u128,
    pub counting: QuorumCounting,
}

impl QuorumPolicy for SupplyFraction {
    fn quorum(&self, total_supply: Balance) -> Balance {
        if self.denominator == 0 {
            return Balance::MAX;
        }
        // Split to keep supply * numerator from overflowing
        let whole = (total_supply / self.denominator).saturating_mul(self.numerator);
        let rest = (total_supply % self.denominator).saturating_mul(self.numerator) / self.denominator;
        whole.saturating_add(rest)
    }

    fn counted(&self, tally: &Tally) -> Balance {
        self.counting.counted(tally)
    }
}

/// Absolute minimum weight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedQuorum {
    pub amount: Balance,
    pub counting: QuorumCounting,
}

impl QuorumPolicy for FixedQuorum {
    fn quorum(&self, _total_supply: Balance) -> Balance {
        self.amount
    }

    fn counted(&self, tally: &Tally) -> Balance {
        self.counting.counted(tally)
    }
}

/// Serializable quorum selection. Integers are u64 so the config stays
/// representable in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuorumConfig {
    SupplyFraction {
        numerator: u64,
        denominator: u64,
        counting: QuorumCounting,
    },
    Fixed {
        amount: u64,
        counting: QuorumCounting,
    },
}

impl QuorumConfig {
    pub fn build(&self) -> Box<dyn QuorumPolicy> {
        match *self {
            QuorumConfig::SupplyFraction { numerator, denominator, counting } => Box::new(SupplyFraction {
                numerator: numerator.into(),
                denominator: denominator.into(),
                counting,
            }),
            QuorumConfig::Fixed { amount, counting } => Box::new(FixedQuorum {
                amount: amount.into(),
                counting,
            }),
        }
    }
}

impl Default for QuorumConfig {
    fn default() -> Self {
        QuorumConfig::SupplyFraction {
            numerator: 4,
            denominator: 100,
            counting: QuorumCounting::ForAbstain,
        }
    }
}
