// Governor - Single choke point for the proposal lifecycle
//
// Owns the registry, vote ledger, quorum policy and timelock. Every mutation
// goes through this type, and every operation checks everything before it
// mutates anything, so a rejected call leaves state exactly as it was.
//
// Height and time come from the injected `ChainClock`; the phase of a
// proposal is recomputed on each query and never stored.

use crate::chain::ChainClock;
use crate::cli::config::GovernorConfig;
use crate::contracts::error::GovernanceError;
use crate::contracts::execution::{CallExecutor, ExecutionGuard, ExecutionResult};
use crate::contracts::ledger::{Tally, VoteChoice, VoteLedger, VoteRecord};
use crate::contracts::lifecycle::{derive_phase, OperationView, Phase, PhaseInputs};
use crate::contracts::quorum::QuorumPolicy;
use crate::contracts::registry::{Proposal, ProposalRegistry};
use crate::contracts::timelock::{OperationStatus, TimelockOperation, TimelockScheduler};
use crate::contracts::weights::{CheckpointedVotes, VoteWeightSource, WeightError};
use crate::types::{AccountId, Address, Balance, BlockNumber, CallBatch, Hash, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// State changes recorded for drivers, in the order they happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GovernorEvent {
    ProposalCreated {
        proposal: Hash,
        proposer: AccountId,
        snapshot: BlockNumber,
        deadline: BlockNumber,
        description: String,
    },
    VoteCast {
        proposal: Hash,
        voter: AccountId,
        choice: VoteChoice,
        weight: Balance,
    },
    ProposalCanceled {
        proposal: Hash,
        by: AccountId,
        height: BlockNumber,
    },
    ProposalQueued {
        proposal: Hash,
        operation: Hash,
        maturity: Timestamp,
    },
    OperationCanceled {
        operation: Hash,
        by: AccountId,
    },
    ProposalExecuted {
        proposal: Hash,
        operation: Hash,
        executed_at: Timestamp,
    },
    MinDelayChanged {
        old: Timestamp,
        new: Timestamp,
    },
}

/// Governance engine over a weight source `W` and a chain clock `C`
pub struct Governor<W: VoteWeightSource, C: ChainClock> {
    config: GovernorConfig,
    registry: ProposalRegistry,
    ledger: VoteLedger,
    quorum: Box<dyn QuorumPolicy>,
    timelock: TimelockScheduler,
    guardian: Option<AccountId>,
    events: Vec<GovernorEvent>,
    weights: W,
    clock: C,
}

impl<W: VoteWeightSource, C: ChainClock> Governor<W, C> {
    pub fn new(config: GovernorConfig, weights: W, clock: C) -> Self {
        info!(
            "🏛️  Governor up: delay {} blocks, period {} blocks, timelock {}s",
            config.voting_delay, config.voting_period, config.timelock.min_delay
        );
        Self {
            registry: ProposalRegistry::new(config.voting_settings()),
            ledger: VoteLedger::new(),
            quorum: config.quorum.build(),
            timelock: TimelockScheduler::new(config.timelock.clone(), config.timelock_cancellers()),
            guardian: config.guardian,
            events: Vec::new(),
            weights,
            clock,
            config,
        }
    }

    // =========================================================================
    // PROPOSALS
    // =========================================================================

    /// Create a proposal from parallel call arrays
    pub fn create_proposal(
        &mut self,
        targets: &[Address],
        values: &[Balance],
        payloads: &[Vec<u8>],
        description: &str,
        proposer: AccountId,
    ) -> Result<Hash, GovernanceError> {
        let calls = CallBatch::from_parts(targets, values, payloads)?;
        self.propose(calls, description, proposer)
    }

    pub fn propose(
        &mut self,
        calls: CallBatch,
        description: &str,
        proposer: AccountId,
    ) -> Result<Hash, GovernanceError> {
        let height = self.clock.current_height();
        let id = self.registry.create(calls, description, proposer, height, &self.weights)?;

        if let Some(proposal) = self.registry.get(&id) {
            self.events.push(GovernorEvent::ProposalCreated {
                proposal: id,
                proposer,
                snapshot: proposal.snapshot,
                deadline: proposal.deadline,
                description: proposal.description.clone(),
            });
        }
        Ok(id)
    }

    /// Cancel a proposal before it is queued. The proposer may cancel while
    /// Pending; the guardian while Pending, Active or Succeeded.
    pub fn cancel_proposal(&mut self, id: &Hash, caller: &AccountId) -> Result<(), GovernanceError> {
        let proposal = self.proposal_or_err(id)?;
        let phase = self.get_phase(id)?;

        let is_guardian = self.guardian.as_ref() == Some(caller);
        let is_proposer = &proposal.proposer == caller;

        let allowed = if is_guardian {
            !phase.is_terminal() && phase != Phase::Queued
        } else if is_proposer {
            phase == Phase::Pending
        } else {
            debug!("Cancel of {} rejected: {} is neither proposer nor guardian", id, caller);
            return Err(GovernanceError::NotProposer);
        };

        if !allowed {
            debug!("Cancel of {} rejected in phase {}", id, phase);
            return Err(GovernanceError::NotCancelable(phase));
        }

        let height = self.clock.current_height();
        self.registry.mark_canceled(*id);
        self.events.push(GovernorEvent::ProposalCanceled {
            proposal: *id,
            by: *caller,
            height,
        });
        info!("🚫 Proposal {} canceled by {} at #{}", id, caller, height);
        Ok(())
    }

    // =========================================================================
    // VOTING
    // =========================================================================

    /// Cast a vote; returns the weight recorded at the snapshot
    pub fn cast_vote(
        &mut self,
        id: &Hash,
        voter: AccountId,
        choice: VoteChoice,
    ) -> Result<Balance, GovernanceError> {
        let phase = self.get_phase(id)?;
        if phase != Phase::Active {
            debug!("Vote by {} on {} rejected in phase {}", voter, id, phase);
            return Err(GovernanceError::ProposalNotActive(phase));
        }

        let height = self.clock.current_height();
        let proposal = self.registry.get(id).ok_or(GovernanceError::UnknownProposal(*id))?;
        let weight = self.ledger.cast(proposal, voter, choice, height, &self.weights)?;

        self.events.push(GovernorEvent::VoteCast {
            proposal: *id,
            voter,
            choice,
            weight,
        });
        Ok(weight)
    }

    pub fn get_tally(&self, id: &Hash) -> Result<Tally, GovernanceError> {
        self.proposal_or_err(id)?;
        Ok(self.ledger.tally(id))
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Phase at the clock's current height and time
    pub fn get_phase(&self, id: &Hash) -> Result<Phase, GovernanceError> {
        self.phase_at(id, self.clock.current_height(), self.clock.current_time())
    }

    /// Phase at an explicit height and time. Pure read.
    pub fn phase_at(&self, id: &Hash, height: BlockNumber, now: Timestamp) -> Result<Phase, GovernanceError> {
        let proposal = self.proposal_or_err(id)?;
        Ok(derive_phase(&self.phase_inputs(proposal, now), height, now))
    }

    fn phase_inputs(&self, proposal: &Proposal, now: Timestamp) -> PhaseInputs {
        let tally = self.ledger.tally(&proposal.id);
        let supply = self.weights.total_supply_at(proposal.snapshot);
        let operation = self
            .timelock
            .operation(&Self::operation_id_for(proposal))
            .map(|op| OperationView::observe(op, self.timelock.expires_at(op), now));

        PhaseInputs {
            vote_start: proposal.vote_start,
            deadline: proposal.deadline,
            canceled: self.registry.is_canceled(&proposal.id),
            quorum_met: self.quorum.is_met(&tally, supply),
            majority_for: tally.majority_for(),
            operation,
        }
    }

    /// Timelock id of a proposal's operation: no predecessor, salted with
    /// the description hash
    fn operation_id_for(proposal: &Proposal) -> Hash {
        proposal.calls.operation_id(None, &proposal.description_hash)
    }

    // =========================================================================
    // TIMELOCK
    // =========================================================================

    /// Queue a succeeded proposal, identified by its exact calls and
    /// description hash
    pub fn queue(
        &mut self,
        targets: &[Address],
        values: &[Balance],
        payloads: &[Vec<u8>],
        description_hash: &Hash,
    ) -> Result<Hash, GovernanceError> {
        let calls = CallBatch::from_parts(targets, values, payloads)?;
        self.queue_batch(calls, description_hash)
    }

    pub fn queue_batch(&mut self, calls: CallBatch, description_hash: &Hash) -> Result<Hash, GovernanceError> {
        let proposal_id = calls.proposal_id(description_hash);
        let operation_id = calls.operation_id(None, description_hash);

        if self.timelock.operation(&operation_id).is_some() {
            debug!("Queue of {} rejected: operation {} exists", proposal_id, operation_id);
            return Err(GovernanceError::AlreadyScheduled(operation_id));
        }

        let phase = self.get_phase(&proposal_id)?;
        if phase != Phase::Succeeded {
            debug!("Queue of {} rejected in phase {}", proposal_id, phase);
            return Err(GovernanceError::NotSucceeded(phase));
        }

        let now = self.clock.current_time();
        let id = self.timelock.schedule(calls, None, *description_hash, now)?;
        let maturity = self.timelock.operation(&id).map(|op| op.maturity).unwrap_or(now);

        self.events.push(GovernorEvent::ProposalQueued {
            proposal: proposal_id,
            operation: id,
            maturity,
        });
        info!("📥 Proposal {} queued as {}", proposal_id, id);
        Ok(id)
    }

    /// Execute a matured operation through `executor`
    pub fn execute<E: CallExecutor>(
        &mut self,
        targets: &[Address],
        values: &[Balance],
        payloads: &[Vec<u8>],
        description_hash: &Hash,
        executor: &mut E,
    ) -> Result<ExecutionResult, GovernanceError> {
        let calls = CallBatch::from_parts(targets, values, payloads)?;
        self.execute_batch(&calls, description_hash, executor)
    }

    pub fn execute_batch<E: CallExecutor>(
        &mut self,
        calls: &CallBatch,
        description_hash: &Hash,
        executor: &mut E,
    ) -> Result<ExecutionResult, GovernanceError> {
        let now = self.clock.current_time();
        let old_delay = self.timelock.min_delay();
        let result = ExecutionGuard::execute(&mut self.timelock, calls, None, description_hash, now, executor)?;

        self.events.push(GovernorEvent::ProposalExecuted {
            proposal: calls.proposal_id(description_hash),
            operation: result.operation,
            executed_at: result.executed_at,
        });
        if let Some(new) = result.min_delay_changed {
            self.events.push(GovernorEvent::MinDelayChanged { old: old_delay, new });
        }
        Ok(result)
    }

    /// Cancel a pending, unexpired operation. Caller must be a timelock canceller.
    pub fn cancel(&mut self, operation: &Hash, caller: &AccountId) -> Result<(), GovernanceError> {
        let now = self.clock.current_time();
        self.timelock.cancel(operation, caller, now)?;
        self.events.push(GovernorEvent::OperationCanceled {
            operation: *operation,
            by: *caller,
        });
        Ok(())
    }

    // =========================================================================
    // READ ACCESSORS
    // =========================================================================

    pub fn proposal(&self, id: &Hash) -> Option<&Proposal> {
        self.registry.get(id)
    }

    /// Proposals in creation order
    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.registry.iter()
    }

    pub fn proposal_snapshot(&self, id: &Hash) -> Result<BlockNumber, GovernanceError> {
        Ok(self.proposal_or_err(id)?.snapshot)
    }

    pub fn proposal_deadline(&self, id: &Hash) -> Result<BlockNumber, GovernanceError> {
        Ok(self.proposal_or_err(id)?.deadline)
    }

    /// Timelock operation id a proposal maps to
    pub fn proposal_operation_id(&self, id: &Hash) -> Result<Hash, GovernanceError> {
        Ok(Self::operation_id_for(self.proposal_or_err(id)?))
    }

    /// Quorum required for a snapshot taken at `height`
    pub fn quorum_at(&self, height: BlockNumber) -> Balance {
        self.quorum.quorum(self.weights.total_supply_at(height))
    }

    pub fn has_voted(&self, id: &Hash, voter: &AccountId) -> bool {
        self.ledger.has_voted(id, voter)
    }

    pub fn vote_of(&self, id: &Hash, voter: &AccountId) -> Option<&VoteRecord> {
        self.ledger.vote_of(id, voter)
    }

    pub fn operation(&self, id: &Hash) -> Option<&TimelockOperation> {
        self.timelock.operation(id)
    }

    pub fn operation_status(&self, id: &Hash) -> OperationStatus {
        self.timelock.status_of(id, self.clock.current_time())
    }

    pub fn is_ready(&self, id: &Hash) -> bool {
        self.timelock.is_ready(id, self.clock.current_time())
    }

    pub fn min_delay(&self) -> Timestamp {
        self.timelock.min_delay()
    }

    pub fn timelock_address(&self) -> Address {
        self.timelock.address()
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    pub fn weights(&self) -> &W {
        &self.weights
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Take every event recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<GovernorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drop every proposal, vote and operation. Test/reset boundary only.
    pub fn reset(&mut self) {
        self.registry = ProposalRegistry::new(self.config.voting_settings());
        self.ledger.reset();
        self.timelock = TimelockScheduler::new(self.config.timelock.clone(), self.config.timelock_cancellers());
        self.events.clear();
        info!("♻️  Governor state reset");
    }

    fn proposal_or_err(&self, id: &Hash) -> Result<&Proposal, GovernanceError> {
        self.registry.get(id).ok_or(GovernanceError::UnknownProposal(*id))
    }
}

// =========================================================================
// TOKEN LEDGER
// =========================================================================

/// Token moves on the reference ledger, stamped with the current block so
/// an already recorded snapshot cannot be rewritten
impl<C: ChainClock> Governor<CheckpointedVotes, C> {
    pub fn mint(&mut self, to: AccountId, amount: Balance) -> Result<(), WeightError> {
        let height = self.clock.current_height();
        self.weights.mint(to, amount, height)
    }

    pub fn transfer(&mut self, from: AccountId, to: AccountId, amount: Balance) -> Result<(), WeightError> {
        let height = self.clock.current_height();
        self.weights.transfer(from, to, amount, height)
    }

    pub fn delegate(&mut self, delegator: AccountId, delegatee: AccountId) -> Result<(), WeightError> {
        let height = self.clock.current_height();
        self.weights.delegate(delegator, delegatee, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::SimulatedChain;
    use crate::contracts::quorum::{QuorumConfig, QuorumCounting};
    use crate::contracts::timelock::TimelockConfig;
    use crate::contracts::treasury::{release_funds_call, Treasury};
    use crate::contracts::execution::update_delay_call;
    use crate::types::description_hash;

    const DESCRIPTION: &str = "Release Funds from Treasury";

    fn account(seed: u8) -> AccountId {
        AccountId::from_bytes([seed; 32])
    }

    fn guardian() -> AccountId {
        account(77)
    }

    fn treasury() -> Treasury {
        Treasury::new(account(99), account(1), 1_000)
    }

    fn config() -> GovernorConfig {
        GovernorConfig {
            voting_delay: 1,
            voting_period: 10,
            proposal_threshold: 0,
            quorum: QuorumConfig::SupplyFraction { numerator: 40, denominator: 100, counting: QuorumCounting::AllVotes },
            timelock: TimelockConfig { min_delay: 100, min_delay_floor: 10, ..TimelockConfig::default() },
            guardian: Some(guardian()),
            cancellers: Vec::new(),
        }
    }

    /// Five self-delegated voters with 10 units each
    fn governor() -> Governor<CheckpointedVotes, SimulatedChain> {
        let mut weights = CheckpointedVotes::new();
        for seed in 1..=5 {
            weights.delegate(account(seed), account(seed), 1).unwrap();
            weights.mint(account(seed), 10, 1).unwrap();
        }
        let mut chain = SimulatedChain::new(1, 1_000);
        chain.advance_blocks(1);
        Governor::new(config(), weights, chain)
    }

    fn release_batch() -> CallBatch {
        CallBatch::from_calls(vec![release_funds_call(account(99))]).unwrap()
    }

    fn propose(gov: &mut Governor<CheckpointedVotes, SimulatedChain>) -> Hash {
        gov.propose(release_batch(), DESCRIPTION, account(1)).unwrap()
    }

    fn vote_all(gov: &mut Governor<CheckpointedVotes, SimulatedChain>, id: &Hash, choices: [VoteChoice; 5]) {
        for (i, choice) in choices.into_iter().enumerate() {
            gov.cast_vote(id, account(i as u8 + 1), choice).unwrap();
        }
    }

    fn pass(gov: &mut Governor<CheckpointedVotes, SimulatedChain>) -> Hash {
        let id = propose(gov);
        gov.clock_mut().advance_blocks(2);
        use VoteChoice::*;
        vote_all(gov, &id, [For, For, For, Against, Abstain]);
        gov.clock_mut().advance_blocks(10);
        assert_eq!(gov.get_phase(&id).unwrap(), Phase::Succeeded);
        id
    }

    #[test]
    fn test_full_lifecycle() {
        let mut gov = governor();
        let id = propose(&mut gov);
        assert_eq!(gov.get_phase(&id).unwrap(), Phase::Pending);

        gov.clock_mut().advance_blocks(2);
        assert_eq!(gov.get_phase(&id).unwrap(), Phase::Active);
        use VoteChoice::*;
        vote_all(&mut gov, &id, [For, For, For, Against, Abstain]);
        assert_eq!(gov.get_tally(&id).unwrap().as_tuple(), (10, 30, 10));

        gov.clock_mut().advance_blocks(10);
        assert_eq!(gov.get_phase(&id).unwrap(), Phase::Succeeded);

        let desc_hash = description_hash(DESCRIPTION);
        let op = gov.queue_batch(release_batch(), &desc_hash).unwrap();
        assert_eq!(gov.get_phase(&id).unwrap(), Phase::Queued);
        assert_eq!(op, gov.proposal_operation_id(&id).unwrap());

        let mut t = treasury();
        assert!(matches!(
            gov.execute_batch(&release_batch(), &desc_hash, &mut t),
            Err(GovernanceError::NotReady { .. })
        ));

        gov.clock_mut().advance_time(100);
        assert!(gov.is_ready(&op));
        let result = gov.execute_batch(&release_batch(), &desc_hash, &mut t).unwrap();
        assert_eq!(result.operation, op);
        assert!(t.is_released());
        assert_eq!(gov.get_phase(&id).unwrap(), Phase::Executed);

        assert_eq!(
            gov.execute_batch(&release_batch(), &desc_hash, &mut t),
            Err(GovernanceError::AlreadyExecuted)
        );
    }

    #[test]
    fn test_vote_outside_window_rejected() {
        let mut gov = governor();
        let id = propose(&mut gov);
        assert_eq!(
            gov.cast_vote(&id, account(1), VoteChoice::For),
            Err(GovernanceError::ProposalNotActive(Phase::Pending))
        );

        gov.clock_mut().advance_blocks(20);
        assert_eq!(
            gov.cast_vote(&id, account(1), VoteChoice::For),
            Err(GovernanceError::ProposalNotActive(Phase::Defeated))
        );
        assert!(!gov.has_voted(&id, &account(1)));
    }

    #[test]
    fn test_unknown_proposal() {
        let mut gov = governor();
        let id = Hash::hash(b"missing");
        assert_eq!(gov.get_phase(&id), Err(GovernanceError::UnknownProposal(id)));
        assert_eq!(gov.get_tally(&id), Err(GovernanceError::UnknownProposal(id)));
        assert_eq!(
            gov.cast_vote(&id, account(1), VoteChoice::For),
            Err(GovernanceError::UnknownProposal(id))
        );
    }

    #[test]
    fn test_defeated_cannot_be_queued() {
        let mut gov = governor();
        let id = propose(&mut gov);
        gov.clock_mut().advance_blocks(2);
        use VoteChoice::*;
        vote_all(&mut gov, &id, [Against, Against, Against, For, Abstain]);
        gov.clock_mut().advance_blocks(10);

        assert_eq!(gov.get_phase(&id).unwrap(), Phase::Defeated);
        assert_eq!(
            gov.queue_batch(release_batch(), &description_hash(DESCRIPTION)),
            Err(GovernanceError::NotSucceeded(Phase::Defeated))
        );
    }

    #[test]
    fn test_queue_twice_rejected() {
        let mut gov = governor();
        pass(&mut gov);
        let desc_hash = description_hash(DESCRIPTION);
        let op = gov.queue_batch(release_batch(), &desc_hash).unwrap();
        assert_eq!(
            gov.queue_batch(release_batch(), &desc_hash),
            Err(GovernanceError::AlreadyScheduled(op))
        );
    }

    #[test]
    fn test_tampered_execution_is_unknown() {
        let mut gov = governor();
        pass(&mut gov);
        let desc_hash = description_hash(DESCRIPTION);
        gov.queue_batch(release_batch(), &desc_hash).unwrap();
        gov.clock_mut().advance_time(100);

        let mut t = treasury();
        let other_target = CallBatch::from_calls(vec![release_funds_call(account(98))]).unwrap();
        assert!(matches!(
            gov.execute_batch(&other_target, &desc_hash, &mut t),
            Err(GovernanceError::UnknownOperation(_))
        ));
        assert!(matches!(
            gov.execute_batch(&release_batch(), &description_hash("other"), &mut t),
            Err(GovernanceError::UnknownOperation(_))
        ));
        assert!(!t.is_released());
    }

    #[test]
    fn test_operation_cancel_makes_proposal_canceled() {
        let mut gov = governor();
        let id = pass(&mut gov);
        let desc_hash = description_hash(DESCRIPTION);
        let op = gov.queue_batch(release_batch(), &desc_hash).unwrap();

        assert_eq!(gov.cancel(&op, &account(1)), Err(GovernanceError::Unauthorized));
        gov.cancel(&op, &guardian()).unwrap();
        assert_eq!(gov.get_phase(&id).unwrap(), Phase::Canceled);

        gov.clock_mut().advance_time(100);
        let mut t = treasury();
        assert_eq!(
            gov.execute_batch(&release_batch(), &desc_hash, &mut t),
            Err(GovernanceError::UnknownOperation(op))
        );
        assert_eq!(
            gov.queue_batch(release_batch(), &desc_hash),
            Err(GovernanceError::AlreadyScheduled(op))
        );
    }

    #[test]
    fn test_proposer_cancels_only_while_pending() {
        let mut gov = governor();
        let id = propose(&mut gov);

        assert_eq!(gov.cancel_proposal(&id, &account(2)), Err(GovernanceError::NotProposer));
        gov.cancel_proposal(&id, &account(1)).unwrap();
        assert_eq!(gov.get_phase(&id).unwrap(), Phase::Canceled);

        let mut gov = governor();
        let id = propose(&mut gov);
        gov.clock_mut().advance_blocks(2);
        assert_eq!(
            gov.cancel_proposal(&id, &account(1)),
            Err(GovernanceError::NotCancelable(Phase::Active))
        );
    }

    #[test]
    fn test_guardian_cancels_until_queued() {
        let mut gov = governor();
        let id = pass(&mut gov);
        gov.cancel_proposal(&id, &guardian()).unwrap();
        assert_eq!(gov.get_phase(&id).unwrap(), Phase::Canceled);
        assert_eq!(
            gov.queue_batch(release_batch(), &description_hash(DESCRIPTION)),
            Err(GovernanceError::NotSucceeded(Phase::Canceled))
        );

        let mut gov = governor();
        let id = pass(&mut gov);
        gov.queue_batch(release_batch(), &description_hash(DESCRIPTION)).unwrap();
        assert_eq!(
            gov.cancel_proposal(&id, &guardian()),
            Err(GovernanceError::NotCancelable(Phase::Queued))
        );
    }

    #[test]
    fn test_expired_operation() {
        let mut gov = governor();
        let id = pass(&mut gov);
        let desc_hash = description_hash(DESCRIPTION);
        gov.queue_batch(release_batch(), &desc_hash).unwrap();

        let grace = gov.config().timelock.grace_period.unwrap();
        gov.clock_mut().advance_time(100 + grace);
        assert_eq!(gov.get_phase(&id).unwrap(), Phase::Expired);

        let mut t = treasury();
        assert!(matches!(
            gov.execute_batch(&release_batch(), &desc_hash, &mut t),
            Err(GovernanceError::OperationExpired { .. })
        ));
    }

    #[test]
    fn test_token_moves_after_snapshot_do_not_change_weight() {
        let mut gov = governor();
        let id = propose(&mut gov);
        gov.clock_mut().advance_blocks(5);
        let snapshot = gov.proposal_snapshot(&id).unwrap();
        let height = gov.clock().current_height();
        assert!(height > snapshot);

        gov.mint(account(2), 1_000).unwrap();
        gov.transfer(account(3), account(2), 10).unwrap();
        gov.delegate(account(4), account(2)).unwrap();

        assert_eq!(gov.cast_vote(&id, account(2), VoteChoice::For).unwrap(), 10);
        assert_eq!(gov.cast_vote(&id, account(3), VoteChoice::For).unwrap(), 10);
        assert_eq!(gov.weights().weight_at(&account(2), snapshot), 10);
        assert_eq!(gov.weights().weight_at(&account(2), height), 1_030);
        assert_eq!(gov.weights().tip(), height);
    }

    #[test]
    fn test_expired_operation_cannot_be_canceled() {
        let mut gov = governor();
        let id = pass(&mut gov);
        let op = gov.queue_batch(release_batch(), &description_hash(DESCRIPTION)).unwrap();

        let grace = gov.config().timelock.grace_period.unwrap();
        let expired_at = gov.operation(&op).unwrap().maturity + grace;
        gov.clock_mut().advance_time(100 + grace);
        assert_eq!(gov.get_phase(&id).unwrap(), Phase::Expired);

        gov.drain_events();
        assert_eq!(
            gov.cancel(&op, &guardian()),
            Err(GovernanceError::OperationExpired { expired_at })
        );
        assert_eq!(gov.get_phase(&id).unwrap(), Phase::Expired);
        assert!(gov.drain_events().is_empty());
    }

    #[test]
    fn test_delay_update_through_governance() {
        let mut gov = governor();
        let timelock = gov.timelock_address();
        let batch = CallBatch::from_calls(vec![update_delay_call(timelock, 50)]).unwrap();
        let description = "Shorten timelock";

        let id = gov.propose(batch.clone(), description, account(1)).unwrap();
        gov.clock_mut().advance_blocks(2);
        use VoteChoice::*;
        vote_all(&mut gov, &id, [For, For, For, For, For]);
        gov.clock_mut().advance_blocks(10);

        let desc_hash = description_hash(description);
        gov.queue_batch(batch.clone(), &desc_hash).unwrap();
        gov.clock_mut().advance_time(100);

        let mut t = treasury();
        let result = gov.execute_batch(&batch, &desc_hash, &mut t).unwrap();
        assert_eq!(result.min_delay_changed, Some(50));
        assert_eq!(gov.min_delay(), 50);

        let events = gov.drain_events();
        assert_eq!(events.last(), Some(&GovernorEvent::MinDelayChanged { old: 100, new: 50 }));
    }

    #[test]
    fn test_events_and_reset() {
        let mut gov = governor();
        let id = pass(&mut gov);
        let events = gov.drain_events();
        assert!(matches!(events[0], GovernorEvent::ProposalCreated { proposal, .. } if proposal == id));
        assert_eq!(events.iter().filter(|e| matches!(e, GovernorEvent::VoteCast { .. })).count(), 5);
        assert!(gov.drain_events().is_empty());

        gov.reset();
        assert!(gov.proposal(&id).is_none());
        assert!(!gov.has_voted(&id, &account(1)));
        assert_eq!(gov.proposals().count(), 0);
    }

    #[test]
    fn test_read_accessors() {
        let mut gov = governor();
        let id = propose(&mut gov);
        assert_eq!(gov.proposal_snapshot(&id).unwrap(), 3);
        assert_eq!(gov.proposal_deadline(&id).unwrap(), 13);
        assert_eq!(gov.quorum_at(3), 20);

        gov.clock_mut().advance_blocks(2);
        gov.cast_vote(&id, account(3), VoteChoice::Abstain).unwrap();
        let vote = gov.vote_of(&id, &account(3)).unwrap();
        assert_eq!(vote.weight, 10);
        assert_eq!(vote.choice, VoteChoice::Abstain);

        let op = gov.proposal_operation_id(&id).unwrap();
        assert_eq!(gov.operation_status(&op), OperationStatus::Unscheduled);
        assert!(gov.operation(&op).is_none());
    }
}
