// Runner - Drive a scenario through the full proposal lifecycle
// Principle: Every step goes through the public governor surface

use crate::chain::{ChainClock, SimulatedChain};
use crate::cli::config::GovernorConfig;
use crate::cli::scenario::Scenario;
use crate::contracts::error::GovernanceError;
use crate::contracts::governor::{Governor, GovernorEvent};
use crate::contracts::ledger::Tally;
use crate::contracts::lifecycle::Phase;
use crate::contracts::treasury::{release_funds_call, Treasury};
use crate::contracts::weights::CheckpointedVotes;
use crate::types::{description_hash, AccountId, Balance, BlockNumber, CallBatch, Hash, Timestamp};
use serde::Serialize;
use tracing::{info, warn};

/// Phase observed after a driver step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseChange {
    pub step: String,
    pub height: BlockNumber,
    pub time: Timestamp,
    pub phase: Phase,
}

/// Outcome of a scenario run
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub proposal: Hash,
    pub operation: Option<Hash>,
    pub tally: Tally,
    pub quorum: Balance,
    pub transitions: Vec<PhaseChange>,
    pub final_phase: Phase,
    /// Rejections the driver observed on the way, in order
    pub rejections: Vec<String>,
    pub treasury_balance: Balance,
    pub beneficiary_paid: Balance,
    pub events: Vec<GovernorEvent>,
}

type SimGovernor = Governor<CheckpointedVotes, SimulatedChain>;

fn voter_account(name: &str) -> AccountId {
    AccountId::derive(&format!("kratos-governor/voter/{}", name))
}

pub fn guardian_account() -> AccountId {
    AccountId::derive("kratos-governor/guardian")
}

pub fn treasury_account() -> AccountId {
    AccountId::derive("kratos-governor/treasury")
}

fn record(gov: &SimGovernor, id: &Hash, step: &str, transitions: &mut Vec<PhaseChange>) -> anyhow::Result<Phase> {
    let phase = gov.get_phase(id)?;
    let change = PhaseChange {
        step: step.to_string(),
        height: gov.clock().current_height(),
        time: gov.clock().current_time(),
        phase,
    };
    info!("📍 {} -> {} (#{} @ {})", step, phase, change.height, change.time);
    transitions.push(change);
    Ok(phase)
}

/// Run a scenario end to end on a fresh simulated chain
pub fn run_scenario(mut config: GovernorConfig, scenario: &Scenario) -> anyhow::Result<ScenarioReport> {
    scenario.validate()?;
    config.validate()?;
    if scenario.cancel_after_queue && config.guardian.is_none() {
        config.guardian = Some(guardian_account());
    }
    let guardian = config.guardian;

    info!("🎬 Running scenario '{}' with {} voters", scenario.name, scenario.voters.len());

    // Electorate: mint and self-delegate at genesis
    let mut chain = SimulatedChain::default();
    let mut weights = CheckpointedVotes::new();
    let genesis = chain.current_height();
    for voter in &scenario.voters {
        let account = voter_account(&voter.name);
        weights.delegate(account, account, genesis)?;
        weights.mint(account, voter.weight.into(), genesis)?;
    }
    chain.advance_blocks(1);

    let proposer = voter_account(&scenario.voters[scenario.proposer].name);
    let mut treasury = Treasury::new(treasury_account(), proposer, scenario.treasury_balance.into());
    let voting_delay = config.voting_delay;
    let voting_period = config.voting_period;
    let mut gov = Governor::new(config, weights, chain);

    let mut transitions = Vec::new();
    let mut rejections = Vec::new();

    let calls = CallBatch::from_calls(vec![release_funds_call(treasury.address)])?;
    let desc_hash = description_hash(&scenario.description);
    let id = gov.propose(calls.clone(), &scenario.description, proposer)?;
    record(&gov, &id, "proposed", &mut transitions)?;

    gov.clock_mut().advance_blocks(voting_delay + 1);
    record(&gov, &id, "voting opened", &mut transitions)?;

    for voter in &scenario.voters {
        if let Some(choice) = voter.vote {
            gov.cast_vote(&id, voter_account(&voter.name), choice)?;
        }
    }

    gov.clock_mut().advance_blocks(voting_period);
    let tally = gov.get_tally(&id)?;
    let quorum = gov.quorum_at(gov.proposal_snapshot(&id)?);
    info!(
        "📊 Tally: against {} / for {} / abstain {} (quorum {})",
        tally.against, tally.for_votes, tally.abstain, quorum
    );
    let phase = record(&gov, &id, "voting closed", &mut transitions)?;

    let mut operation = None;
    match gov.queue_batch(calls.clone(), &desc_hash) {
        Ok(op) => {
            operation = Some(op);
            record(&gov, &id, "queued", &mut transitions)?;
        }
        Err(e) => {
            warn!("Queue refused in phase {}: {}", phase, e);
            rejections.push(format!("queue: {}", e));
        }
    }

    if let Some(op) = operation {
        if scenario.cancel_after_queue {
            if let Some(guardian) = guardian {
                gov.cancel(&op, &guardian)?;
                record(&gov, &id, "operation canceled", &mut transitions)?;
            }
        }

        // One second early must be refused
        let delay = gov.min_delay();
        if delay > 0 {
            gov.clock_mut().advance_time(delay - 1);
            match gov.execute_batch(&calls, &desc_hash, &mut treasury) {
                Err(e @ GovernanceError::NotReady { .. }) => {
                    rejections.push(format!("execute before maturity: {}", e));
                }
                Err(e @ GovernanceError::UnknownOperation(_)) if scenario.cancel_after_queue => {
                    rejections.push(format!("execute after cancel: {}", e));
                }
                Err(e) => return Err(e.into()),
                Ok(result) => anyhow::bail!("operation {} executed before maturity", result.operation),
            }
        }

        gov.clock_mut().advance_time(1);
        match gov.execute_batch(&calls, &desc_hash, &mut treasury) {
            Ok(result) => {
                info!("✅ Executed {} at {}", result.operation, result.executed_at);
                record(&gov, &id, "executed", &mut transitions)?;
            }
            Err(e @ GovernanceError::UnknownOperation(_)) if scenario.cancel_after_queue => {
                rejections.push(format!("execute after cancel: {}", e));
            }
            Err(e) => return Err(e.into()),
        }
    }

    let final_phase = gov.get_phase(&id)?;
    Ok(ScenarioReport {
        scenario: scenario.name.clone(),
        proposal: id,
        operation,
        tally,
        quorum,
        transitions,
        final_phase,
        rejections,
        treasury_balance: treasury.balance(),
        beneficiary_paid: treasury.paid_out(),
        events: gov.drain_events(),
    })
}

/// Identifiers a driver needs to look a proposal up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProposalIds {
    pub description_hash: Hash,
    pub proposal_id: Hash,
    pub operation_id: Hash,
}

/// Compute ids offline. Empty `targets` means the demo release-funds call.
pub fn compute_ids(
    targets: &[AccountId],
    values: &[Balance],
    payloads: &[String],
    description: &str,
) -> anyhow::Result<ProposalIds> {
    let calls = if targets.is_empty() && values.is_empty() && payloads.is_empty() {
        CallBatch::from_calls(vec![release_funds_call(treasury_account())])?
    } else {
        let decoded = payloads
            .iter()
            .map(|p| hex::decode(p.strip_prefix("0x").unwrap_or(p)))
            .collect::<Result<Vec<_>, _>>()?;
        CallBatch::from_parts(targets, values, &decoded)?
    };

    let desc_hash = description_hash(description);
    Ok(ProposalIds {
        description_hash: desc_hash,
        proposal_id: calls.proposal_id(&desc_hash),
        operation_id: calls.operation_id(None, &desc_hash),
    })
}

/// Print a report for humans, then as JSON
pub fn print_report(report: &ScenarioReport) -> anyhow::Result<()> {
    println!();
    println!("Scenario: {}", report.scenario);
    println!("Proposal: {}", report.proposal.to_hex());
    if let Some(op) = report.operation {
        println!("Operation: {}", op.to_hex());
    }
    for change in &report.transitions {
        println!("  #{:<8} t={:<12} {:<20} {}", change.height, change.time, change.step, change.phase);
    }
    let (against, for_votes, abstain) = report.tally.as_tuple();
    println!("Tally: against={} for={} abstain={} (quorum {})", against, for_votes, abstain, report.quorum);
    for rejection in &report.rejections {
        println!("Refused: {}", rejection);
    }
    println!("Final phase: {}", report.final_phase);
    println!(
        "Treasury balance: {} (paid to beneficiary: {})",
        report.treasury_balance, report.beneficiary_paid
    );
    println!();
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
