// Execution Guard - Exactly-once, all-or-nothing execution of matured operations
//
// The operation id is recomputed from the arguments handed to `execute`, so a
// tampered target, value, payload or salt resolves to an unknown operation
// instead of running a different action.
//
// Calls run against a staged clone of the executor. The clone replaces the
// live executor only when every call succeeded; on failure nothing changes
// and the operation stays Pending, so execution can be retried.

use crate::contracts::error::GovernanceError;
use crate::contracts::timelock::{TimelockOperation, TimelockScheduler};
use crate::types::{selector, Address, Call, CallBatch, Hash, Selector, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// `updateDelay(uint256)` on the timelock's own address
pub fn update_delay_selector() -> Selector {
    selector("updateDelay(uint256)")
}

/// Build an administrative call changing the timelock's minimum delay
pub fn update_delay_call(timelock: Address, delay: Timestamp) -> Call {
    Call::with_selector(timelock, 0, update_delay_selector(), &delay.to_le_bytes())
}

/// Performs privileged calls on external targets
pub trait CallExecutor: Clone {
    /// Run one call, returning its output bytes or a failure reason
    fn execute_call(&mut self, call: &Call) -> Result<Vec<u8>, String>;
}

/// Outcome of a successful execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub operation: Hash,
    pub executed_at: Timestamp,
    /// Output of each call, in batch order
    pub outputs: Vec<Vec<u8>>,
    /// New minimum delay, when the batch changed it
    pub min_delay_changed: Option<Timestamp>,
}

/// Administrative actions targeting the timelock itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdminAction {
    UpdateDelay(Timestamp),
}

/// Stateless guard over the scheduler's operations
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionGuard;

impl ExecutionGuard {
    /// Validate that the operation derived from these arguments may run now
    pub fn check<'a>(
        scheduler: &'a TimelockScheduler,
        calls: &CallBatch,
        predecessor: Option<&Hash>,
        salt: &Hash,
        now: Timestamp,
    ) -> Result<&'a TimelockOperation, GovernanceError> {
        let id = calls.operation_id(predecessor, salt);
        let op = scheduler
            .operation(&id)
            .ok_or(GovernanceError::UnknownOperation(id))?;

        if op.is_canceled() {
            return Err(GovernanceError::UnknownOperation(id));
        }
        if op.is_done() {
            return Err(GovernanceError::AlreadyExecuted);
        }
        if let Some(pred) = op.predecessor {
            let pred_done = scheduler.operation(&pred).map(|p| p.is_done()).unwrap_or(false);
            if !pred_done {
                return Err(GovernanceError::PredecessorPending(pred));
            }
        }
        if !scheduler.is_ready(&id, now) {
            return Err(GovernanceError::NotReady { maturity: op.maturity, now });
        }
        if let Some(expired_at) = scheduler.expires_at(op) {
            if now >= expired_at {
                return Err(GovernanceError::OperationExpired { expired_at });
            }
        }
        Ok(op)
    }

    /// Execute every call in order, then mark the operation Done
    pub fn execute<E: CallExecutor>(
        scheduler: &mut TimelockScheduler,
        calls: &CallBatch,
        predecessor: Option<&Hash>,
        salt: &Hash,
        now: Timestamp,
        executor: &mut E,
    ) -> Result<ExecutionResult, GovernanceError> {
        let id = Self::check(scheduler, calls, predecessor, salt, now)?.id;
        let timelock = scheduler.address();

        let mut staged = executor.clone();
        let mut admin = Vec::new();
        let mut outputs = Vec::with_capacity(calls.len());

        for (index, call) in calls.calls().iter().enumerate() {
            if call.target == timelock {
                let action = Self::decode_admin(call).map_err(|reason| {
                    warn!("Operation {} call {} rejected: {}", id, index, reason);
                    GovernanceError::SubcallFailed { index, reason }
                })?;
                let AdminAction::UpdateDelay(delay) = action;
                let floor = scheduler.min_delay_floor();
                if delay < floor {
                    return Err(GovernanceError::SubcallFailed {
                        index,
                        reason: format!("delay {} below floor {}", delay, floor),
                    });
                }
                admin.push(action);
                outputs.push(Vec::new());
                continue;
            }

            match staged.execute_call(call) {
                Ok(output) => {
                    debug!("Operation {} call {} -> {} ok", id, index, call.target);
                    outputs.push(output);
                }
                Err(reason) => {
                    warn!("Operation {} call {} -> {} failed: {}", id, index, call.target, reason);
                    return Err(GovernanceError::SubcallFailed { index, reason });
                }
            }
        }

        // Every call succeeded: commit
        scheduler.mark_done(&id)?;
        *executor = staged;

        let mut min_delay_changed = None;
        for action in admin {
            let AdminAction::UpdateDelay(delay) = action;
            scheduler.set_min_delay(delay)?;
            min_delay_changed = Some(delay);
        }

        info!("✅ Operation {} executed ({} calls)", id, calls.len());

        Ok(ExecutionResult {
            operation: id,
            executed_at: now,
            outputs,
            min_delay_changed,
        })
    }

    fn decode_admin(call: &Call) -> Result<AdminAction, String> {
        if call.value != 0 {
            return Err("timelock admin calls carry no value".to_string());
        }
        let (sel, args) = call.selector().ok_or("payload too short")?;
        if sel != update_delay_selector() {
            return Err(format!("unknown timelock selector 0x{}", hex::encode(sel)));
        }
        let bytes: [u8; 8] = args
            .try_into()
            .map_err(|_| format!("updateDelay expects 8 bytes, got {}", args.len()))?;
        Ok(AdminAction::UpdateDelay(Timestamp::from_le_bytes(bytes)))
    }
}
