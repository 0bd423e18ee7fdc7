// Vote Weights - Snapshot-queryable voting power
//
// The engine only sees `VoteWeightSource`. `CheckpointedVotes` is the
// reference ledger used by the driver and tests: token balances, delegation
// and per-height checkpoints of delegated power. Writes never go below the
// highest height already written, so a recorded checkpoint is never rewritten
// by a later block.

use crate::types::{AccountId, Balance, BlockNumber};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Voting power at a historical height
pub trait VoteWeightSource {
    /// Voting power of `account` as recorded at the end of block `height`
    fn weight_at(&self, account: &AccountId, height: BlockNumber) -> Balance;

    /// Total token supply as recorded at the end of block `height`
    fn total_supply_at(&self, height: BlockNumber) -> Balance;
}

/// A value recorded from `height` onwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub height: BlockNumber,
    pub value: Balance,
}

/// Append-only checkpoint history, one entry per height at most
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct History {
    checkpoints: Vec<Checkpoint>,
}

impl History {
    fn latest(&self) -> Balance {
        self.checkpoints.last().map(|c| c.value).unwrap_or(0)
    }

    /// Value at the last checkpoint with height <= `height`
    fn at(&self, height: BlockNumber) -> Balance {
        let idx = self.checkpoints.partition_point(|c| c.height <= height);
        if idx == 0 {
            0
        } else {
            self.checkpoints[idx - 1].value
        }
    }

    /// Callers guarantee `height` is at or above the last checkpoint
    fn push(&mut self, height: BlockNumber, value: Balance) {
        match self.checkpoints.last_mut() {
            Some(last) if last.height == height => last.value = value,
            _ => self.checkpoints.push(Checkpoint { height, value }),
        }
    }
}

/// Errors from the reference weight ledger
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeightError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Balance, need: Balance },

    #[error("Supply overflow")]
    Overflow,

    #[error("Write at block #{height} is behind the ledger tip #{tip}")]
    StaleHeight { height: BlockNumber, tip: BlockNumber },
}

/// Token ledger with ERC20Votes-style delegation checkpoints
#[derive(Debug, Clone, Default)]
pub struct CheckpointedVotes {
    balances: HashMap<AccountId, Balance>,
    delegates: HashMap<AccountId, AccountId>,
    power: HashMap<AccountId, History>,
    supply: History,
    /// Highest height written so far
    tip: BlockNumber,
}

impl CheckpointedVotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &AccountId) -> Balance {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn delegate_of(&self, account: &AccountId) -> Option<AccountId> {
        self.delegates.get(account).copied()
    }

    /// Current (latest) voting power
    pub fn current_weight(&self, account: &AccountId) -> Balance {
        self.power.get(account).map(History::latest).unwrap_or(0)
    }

    pub fn total_supply(&self) -> Balance {
        self.supply.latest()
    }

    /// Highest height any write has been recorded at
    pub fn tip(&self) -> BlockNumber {
        self.tip
    }

    fn advance_tip(&mut self, height: BlockNumber) -> Result<(), WeightError> {
        if height < self.tip {
            debug!("Stale weight write at #{} (tip #{})", height, self.tip);
            return Err(WeightError::StaleHeight { height, tip: self.tip });
        }
        self.tip = height;
        Ok(())
    }

    /// Create new tokens
    pub fn mint(&mut self, to: AccountId, amount: Balance, height: BlockNumber) -> Result<(), WeightError> {
        let supply = self.supply.latest().checked_add(amount).ok_or(WeightError::Overflow)?;
        self.advance_tip(height)?;
        self.supply.push(height, supply);
        *self.balances.entry(to).or_insert(0) += amount;

        if let Some(delegatee) = self.delegate_of(&to) {
            self.move_power(None, Some(delegatee), amount, height);
        }
        Ok(())
    }

    /// Move tokens; voting power follows the holders' delegates
    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Balance,
        height: BlockNumber,
    ) -> Result<(), WeightError> {
        let have = self.balance_of(&from);
        if have < amount {
            return Err(WeightError::InsufficientBalance { have, need: amount });
        }
        self.advance_tip(height)?;

        self.balances.insert(from, have - amount);
        *self.balances.entry(to).or_insert(0) += amount;

        let src = self.delegate_of(&from);
        let dst = self.delegate_of(&to);
        self.move_power(src, dst, amount, height);
        Ok(())
    }

    /// Assign the whole balance of `delegator` to `delegatee`
    pub fn delegate(
        &mut self,
        delegator: AccountId,
        delegatee: AccountId,
        height: BlockNumber,
    ) -> Result<(), WeightError> {
        self.advance_tip(height)?;
        let previous = self.delegates.insert(delegator, delegatee);
        let amount = self.balance_of(&delegator);
        self.move_power(previous, Some(delegatee), amount, height);
        debug!("Delegation {} -> {} at block #{}", delegator, delegatee, height);
        Ok(())
    }

    fn move_power(
        &mut self,
        src: Option<AccountId>,
        dst: Option<AccountId>,
        amount: Balance,
        height: BlockNumber,
    ) {
        if src == dst || amount == 0 {
            return;
        }
        if let Some(src) = src {
            let history = self.power.entry(src).or_default();
            let value = history.latest().saturating_sub(amount);
            history.push(height, value);
        }
        if let Some(dst) = dst {
            let history = self.power.entry(dst).or_default();
            let value = history.latest().saturating_add(amount);
            history.push(height, value);
        }
    }
}

impl VoteWeightSource for CheckpointedVotes {
    fn weight_at(&self, account: &AccountId, height: BlockNumber) -> Balance {
        self.power.get(account).map(|h| h.at(height)).unwrap_or(0)
    }

    fn total_supply_at(&self, height: BlockNumber) -> Balance {
        self.supply.at(height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(seed: u8) -> AccountId {
        AccountId::from_bytes([seed; 32])
    }

    #[test]
    fn test_undelegated_balance_has_no_weight() {
        let mut votes = CheckpointedVotes::new();
        votes.mint(account(1), 100, 1).unwrap();
        assert_eq!(votes.balance_of(&account(1)), 100);
        assert_eq!(votes.weight_at(&account(1), 1), 0);
        assert_eq!(votes.total_supply_at(1), 100);
    }

    #[test]
    fn test_self_delegation() {
        let mut votes = CheckpointedVotes::new();
        votes.mint(account(1), 100, 1).unwrap();
        votes.delegate(account(1), account(1), 2).unwrap();
        assert_eq!(votes.weight_at(&account(1), 1), 0);
        assert_eq!(votes.weight_at(&account(1), 2), 100);
        assert_eq!(votes.current_weight(&account(1)), 100);
    }

    #[test]
    fn test_redelegation_moves_power() {
        let mut votes = CheckpointedVotes::new();
        votes.mint(account(1), 100, 1).unwrap();
        votes.delegate(account(1), account(2), 2).unwrap();
        votes.delegate(account(1), account(3), 5).unwrap();

        assert_eq!(votes.weight_at(&account(2), 4), 100);
        assert_eq!(votes.weight_at(&account(2), 5), 0);
        assert_eq!(votes.weight_at(&account(3), 5), 100);
    }

    #[test]
    fn test_transfer_moves_power_between_delegates() {
        let mut votes = CheckpointedVotes::new();
        votes.mint(account(1), 100, 1).unwrap();
        votes.delegate(account(1), account(1), 1).unwrap();
        votes.delegate(account(2), account(2), 1).unwrap();

        votes.transfer(account(1), account(2), 40, 3).unwrap();
        assert_eq!(votes.weight_at(&account(1), 2), 100);
        assert_eq!(votes.weight_at(&account(1), 3), 60);
        assert_eq!(votes.weight_at(&account(2), 3), 40);
        assert_eq!(votes.total_supply_at(3), 100);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut votes = CheckpointedVotes::new();
        votes.mint(account(1), 10, 1).unwrap();
        let result = votes.transfer(account(1), account(2), 11, 2);
        assert_eq!(result, Err(WeightError::InsufficientBalance { have: 10, need: 11 }));
        assert_eq!(votes.balance_of(&account(1)), 10);
    }

    #[test]
    fn test_same_height_updates_fold() {
        let mut votes = CheckpointedVotes::new();
        votes.delegate(account(1), account(1), 1).unwrap();
        votes.mint(account(1), 10, 4).unwrap();
        votes.mint(account(1), 5, 4).unwrap();
        assert_eq!(votes.weight_at(&account(1), 3), 0);
        assert_eq!(votes.weight_at(&account(1), 4), 15);
        assert_eq!(votes.power[&account(1)].checkpoints.len(), 1);
    }

    #[test]
    fn test_backdated_writes_rejected() {
        let mut votes = CheckpointedVotes::new();
        votes.delegate(account(1), account(1), 1).unwrap();
        votes.mint(account(1), 10, 1).unwrap();
        votes.mint(account(2), 5, 7).unwrap();
        assert_eq!(votes.tip(), 7);

        assert_eq!(votes.mint(account(1), 1_000, 3), Err(WeightError::StaleHeight { height: 3, tip: 7 }));
        assert_eq!(votes.transfer(account(1), account(2), 5, 6), Err(WeightError::StaleHeight { height: 6, tip: 7 }));
        assert_eq!(votes.delegate(account(2), account(1), 2), Err(WeightError::StaleHeight { height: 2, tip: 7 }));

        assert_eq!(votes.weight_at(&account(1), 3), 10);
        assert_eq!(votes.total_supply_at(3), 10);
        assert_eq!(votes.balance_of(&account(1)), 10);
        assert_eq!(votes.delegate_of(&account(2)), None);
    }

    #[test]
    fn test_mint_overflow() {
        let mut votes = CheckpointedVotes::new();
        votes.mint(account(1), Balance::MAX, 1).unwrap();
        assert_eq!(votes.mint(account(1), 1, 2), Err(WeightError::Overflow));
    }
}
