// Governor Service - Shared async handle for concurrent callers
//
// Writes hold the write lock for the whole check-and-mutate step, so two
// racing calls are applied one after the other in a total order. Reads take
// the read lock and never observe a half-applied operation.

use crate::chain::ChainClock;
use crate::contracts::error::GovernanceError;
use crate::contracts::execution::{CallExecutor, ExecutionResult};
use crate::contracts::governor::{Governor, GovernorEvent};
use crate::contracts::ledger::{Tally, VoteChoice};
use crate::contracts::lifecycle::Phase;
use crate::contracts::weights::VoteWeightSource;
use crate::types::{AccountId, Balance, CallBatch, Hash};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct GovernorService<W: VoteWeightSource, C: ChainClock> {
    inner: Arc<RwLock<Governor<W, C>>>,
}

impl<W: VoteWeightSource, C: ChainClock> Clone for GovernorService<W, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W, C> GovernorService<W, C>
where
    W: VoteWeightSource + Send + Sync,
    C: ChainClock + Send + Sync,
{
    pub fn new(governor: Governor<W, C>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(governor)),
        }
    }

    pub async fn propose(
        &self,
        calls: CallBatch,
        description: &str,
        proposer: AccountId,
    ) -> Result<Hash, GovernanceError> {
        self.inner.write().await.propose(calls, description, proposer)
    }

    pub async fn cast_vote(
        &self,
        id: Hash,
        voter: AccountId,
        choice: VoteChoice,
    ) -> Result<Balance, GovernanceError> {
        self.inner.write().await.cast_vote(&id, voter, choice)
    }

    pub async fn queue(&self, calls: CallBatch, description_hash: Hash) -> Result<Hash, GovernanceError> {
        self.inner.write().await.queue_batch(calls, &description_hash)
    }

    pub async fn execute<E: CallExecutor>(
        &self,
        calls: &CallBatch,
        description_hash: Hash,
        executor: &mut E,
    ) -> Result<ExecutionResult, GovernanceError> {
        self.inner.write().await.execute_batch(calls, &description_hash, executor)
    }

    pub async fn cancel(&self, operation: Hash, caller: AccountId) -> Result<(), GovernanceError> {
        self.inner.write().await.cancel(&operation, &caller)
    }

    pub async fn cancel_proposal(&self, id: Hash, caller: AccountId) -> Result<(), GovernanceError> {
        self.inner.write().await.cancel_proposal(&id, &caller)
    }

    pub async fn get_phase(&self, id: Hash) -> Result<Phase, GovernanceError> {
        self.inner.read().await.get_phase(&id)
    }

    pub async fn get_tally(&self, id: Hash) -> Result<Tally, GovernanceError> {
        self.inner.read().await.get_tally(&id)
    }

    pub async fn drain_events(&self) -> Vec<GovernorEvent> {
        self.inner.write().await.drain_events()
    }

    /// Advance or otherwise drive the clock
    pub async fn with_clock<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(self.inner.write().await.clock_mut())
    }

    /// Run a read-only closure against the governor
    pub async fn read<R>(&self, f: impl FnOnce(&Governor<W, C>) -> R) -> R {
        f(&*self.inner.read().await)
    }
}
