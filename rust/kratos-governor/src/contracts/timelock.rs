// Timelock Scheduler - Delayed operations with a minimum maturity
//
// Operation ids bind the exact call batch, predecessor and salt. Status only
// moves forward: Pending -> Done or Pending -> Canceled. `Ready` is never
// stored; it is Pending observed at or after maturity.

use crate::contracts::error::GovernanceError;
use crate::types::{AccountId, Address, CallBatch, Hash, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// Default minimum delay: 2 days
pub const DEFAULT_MIN_DELAY: Timestamp = 172_800;

/// Default execution window after maturity: 14 days
pub const DEFAULT_GRACE_PERIOD: Timestamp = 1_209_600;

/// Timelock parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelockConfig {
    /// Address of the timelock itself; calls to it are administrative
    pub address: Address,

    /// Seconds between scheduling and maturity
    pub min_delay: Timestamp,

    /// Lowest value `min_delay` may be changed to
    pub min_delay_floor: Timestamp,

    /// Seconds after maturity during which execution is allowed.
    /// `None` disables expiry.
    pub grace_period: Option<Timestamp>,
}

impl Default for TimelockConfig {
    fn default() -> Self {
        Self {
            address: AccountId::derive("kratos-governor/timelock"),
            min_delay: DEFAULT_MIN_DELAY,
            min_delay_floor: 0,
            grace_period: Some(DEFAULT_GRACE_PERIOD),
        }
    }
}

/// Operation status as observed at a given time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    Unscheduled,
    Pending,
    Ready,
    Done,
    Canceled,
}

/// A scheduled operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelockOperation {
    pub id: Hash,
    pub calls: CallBatch,
    pub predecessor: Option<Hash>,
    pub salt: Hash,
    pub scheduled_at: Timestamp,
    /// Earliest executable time
    pub maturity: Timestamp,
    /// Stored status: Pending, Done or Canceled
    status: OperationStatus,
}

impl TimelockOperation {
    /// Status at `now`
    pub fn status_at(&self, now: Timestamp) -> OperationStatus {
        match self.status {
            OperationStatus::Pending if now >= self.maturity => OperationStatus::Ready,
            other => other,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == OperationStatus::Pending
    }

    pub fn is_done(&self) -> bool {
        self.status == OperationStatus::Done
    }

    pub fn is_canceled(&self) -> bool {
        self.status == OperationStatus::Canceled
    }
}

/// Owns every timelock operation, keyed by operation id
#[derive(Debug, Clone)]
pub struct TimelockScheduler {
    config: TimelockConfig,
    cancellers: HashSet<AccountId>,
    operations: HashMap<Hash, TimelockOperation>,
}

impl TimelockScheduler {
    pub fn new(config: TimelockConfig, cancellers: impl IntoIterator<Item = AccountId>) -> Self {
        Self {
            config,
            cancellers: cancellers.into_iter().collect(),
            operations: HashMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.config.address
    }

    /// Current minimum delay. Read at every schedule call.
    pub fn min_delay(&self) -> Timestamp {
        self.config.min_delay
    }

    pub fn min_delay_floor(&self) -> Timestamp {
        self.config.min_delay_floor
    }

    pub fn grace_period(&self) -> Option<Timestamp> {
        self.config.grace_period
    }

    pub fn is_canceller(&self, account: &AccountId) -> bool {
        self.cancellers.contains(account)
    }

    /// Schedule a batch. A canceled id is burnt: scheduling it again fails.
    pub fn schedule(
        &mut self,
        calls: CallBatch,
        predecessor: Option<Hash>,
        salt: Hash,
        now: Timestamp,
    ) -> Result<Hash, GovernanceError> {
        let id = calls.operation_id(predecessor.as_ref(), &salt);
        if self.operations.contains_key(&id) {
            return Err(GovernanceError::AlreadyScheduled(id));
        }

        let maturity = now.saturating_add(self.config.min_delay);
        self.operations.insert(
            id,
            TimelockOperation {
                id,
                calls,
                predecessor,
                salt,
                scheduled_at: now,
                maturity,
                status: OperationStatus::Pending,
            },
        );

        info!("⏳ Operation {} scheduled, matures at {}", id, maturity);
        Ok(id)
    }

    /// True iff the operation is Pending and matured
    pub fn is_ready(&self, id: &Hash, now: Timestamp) -> bool {
        self.status_of(id, now) == OperationStatus::Ready
    }

    pub fn status_of(&self, id: &Hash, now: Timestamp) -> OperationStatus {
        self.operations
            .get(id)
            .map(|op| op.status_at(now))
            .unwrap_or(OperationStatus::Unscheduled)
    }

    /// Last executable instant (exclusive), if expiry is enabled
    pub fn expires_at(&self, op: &TimelockOperation) -> Option<Timestamp> {
        self.config.grace_period.map(|g| op.maturity.saturating_add(g))
    }

    pub fn operation(&self, id: &Hash) -> Option<&TimelockOperation> {
        self.operations.get(id)
    }

    /// Cancel a pending (or matured but unexecuted) operation. An expired
    /// operation is final and cannot be canceled.
    pub fn cancel(&mut self, id: &Hash, caller: &AccountId, now: Timestamp) -> Result<(), GovernanceError> {
        if !self.is_canceller(caller) {
            warn!("Cancel of {} rejected: {} is not a canceller", id, caller);
            return Err(GovernanceError::Unauthorized);
        }

        let grace = self.config.grace_period;
        let op = self
            .operations
            .get_mut(id)
            .ok_or(GovernanceError::UnknownOperation(*id))?;

        if let Some(expired_at) = grace.map(|g| op.maturity.saturating_add(g)) {
            if op.status == OperationStatus::Pending && now >= expired_at {
                warn!("Cancel of {} rejected: expired at {}", id, expired_at);
                return Err(GovernanceError::OperationExpired { expired_at });
            }
        }

        match op.status {
            OperationStatus::Pending => {
                op.status = OperationStatus::Canceled;
                info!("🛑 Operation {} canceled by {}", id, caller);
                Ok(())
            }
            OperationStatus::Done => Err(GovernanceError::AlreadyExecuted),
            _ => Err(GovernanceError::UnknownOperation(*id)),
        }
    }

    /// Flip a pending operation to Done. Only the execution guard calls this.
    pub(crate) fn mark_done(&mut self, id: &Hash) -> Result<(), GovernanceError> {
        let op = self
            .operations
            .get_mut(id)
            .ok_or(GovernanceError::UnknownOperation(*id))?;
        match op.status {
            OperationStatus::Pending => {
                op.status = OperationStatus::Done;
                Ok(())
            }
            OperationStatus::Done => Err(GovernanceError::AlreadyExecuted),
            _ => Err(GovernanceError::UnknownOperation(*id)),
        }
    }

    /// Change the minimum delay. Reachable only through an executed operation.
    pub(crate) fn set_min_delay(&mut self, delay: Timestamp) -> Result<Timestamp, GovernanceError> {
        if delay < self.config.min_delay_floor {
            return Err(GovernanceError::InvalidDelay {
                requested: delay,
                floor: self.config.min_delay_floor,
            });
        }
        let old = self.config.min_delay;
        self.config.min_delay = delay;
        info!("⏱️  Timelock min delay {} -> {}", old, delay);
        Ok(old)
    }
}
