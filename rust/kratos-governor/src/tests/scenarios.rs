// Scenario tests - five equal voters, 40% quorum over all votes
//
// A: [For, For, For, Against, Abstain] succeeds
// B: [Against, Against, Against, For, Abstain] is defeated
// C: execution one second before maturity is refused, at maturity it runs
// D: a canceled operation can no longer execute

#[cfg(test)]
mod scenario_tests {
    use crate::chain::SimulatedChain;
    use crate::cli::config::GovernorConfig;
    use crate::contracts::error::GovernanceError;
    use crate::contracts::governor::Governor;
    use crate::contracts::ledger::VoteChoice::{self, *};
    use crate::contracts::lifecycle::Phase;
    use crate::contracts::quorum::{QuorumConfig, QuorumCounting};
    use crate::contracts::timelock::{OperationStatus, TimelockConfig};
    use crate::contracts::treasury::{release_funds_call, Treasury};
    use crate::contracts::weights::CheckpointedVotes;
    use crate::types::{description_hash, AccountId, Hash};

    const DESCRIPTION: &str = "Release Funds from Treasury";
    const MIN_DELAY: u64 = 172_800;

    struct Setup {
        gov: Governor<CheckpointedVotes, SimulatedChain>,
        treasury: Treasury,
        proposal: Hash,
    }

    fn voter(i: usize) -> AccountId {
        AccountId::derive(&format!("voter-{}", i))
    }

    fn guardian() -> AccountId {
        AccountId::derive("guardian")
    }

    fn config() -> GovernorConfig {
        GovernorConfig {
            voting_delay: 1,
            voting_period: 5,
            proposal_threshold: 0,
            quorum: QuorumConfig::SupplyFraction { numerator: 40, denominator: 100, counting: QuorumCounting::AllVotes },
            timelock: TimelockConfig { min_delay: MIN_DELAY, ..TimelockConfig::default() },
            guardian: Some(guardian()),
            cancellers: Vec::new(),
        }
    }

    fn setup(ballots: [VoteChoice; 5]) -> Setup {
        let mut weights = CheckpointedVotes::new();
        for i in 0..5 {
            weights.delegate(voter(i), voter(i), 1).unwrap();
            weights.mint(voter(i), 10, 1).unwrap();
        }
        let mut chain = SimulatedChain::new(1, 1_000_000);
        chain.advance_blocks(1);

        let treasury = Treasury::new(AccountId::derive("treasury"), voter(0), 5_000);
        let mut gov = Governor::new(config(), weights, chain);

        let call = release_funds_call(treasury.address);
        let proposal = gov
            .create_proposal(&[call.target], &[call.value], &[call.payload.clone()], DESCRIPTION, voter(0))
            .unwrap();

        gov.clock_mut().advance_blocks(2);
        for (i, choice) in ballots.into_iter().enumerate() {
            assert_eq!(gov.cast_vote(&proposal, voter(i), choice).unwrap(), 10);
        }
        gov.clock_mut().advance_blocks(5);

        Setup { gov, treasury, proposal }
    }

    fn queue(s: &mut Setup) -> Hash {
        let call = release_funds_call(s.treasury.address);
        s.gov
            .queue(&[call.target], &[call.value], &[call.payload], &description_hash(DESCRIPTION))
            .unwrap()
    }

    fn execute(s: &mut Setup) -> Result<(), GovernanceError> {
        let call = release_funds_call(s.treasury.address);
        s.gov
            .execute(&[call.target], &[call.value], &[call.payload], &description_hash(DESCRIPTION), &mut s.treasury)
            .map(|_| ())
    }

    #[test]
    fn test_scenario_a_succeeds() {
        let s = setup([For, For, For, Against, Abstain]);
        assert_eq!(s.gov.get_tally(&s.proposal).unwrap().as_tuple(), (10, 30, 10));
        assert_eq!(s.gov.quorum_at(s.gov.proposal_snapshot(&s.proposal).unwrap()), 20);
        assert_eq!(s.gov.get_phase(&s.proposal).unwrap(), Phase::Succeeded);
    }

    #[test]
    fn test_scenario_b_defeated() {
        let mut s = setup([Against, Against, Against, For, Abstain]);
        assert_eq!(s.gov.get_tally(&s.proposal).unwrap().as_tuple(), (30, 10, 10));
        assert_eq!(s.gov.get_phase(&s.proposal).unwrap(), Phase::Defeated);

        let call = release_funds_call(s.treasury.address);
        let result = s.gov.queue(&[call.target], &[call.value], &[call.payload], &description_hash(DESCRIPTION));
        assert_eq!(result, Err(GovernanceError::NotSucceeded(Phase::Defeated)));
    }

    #[test]
    fn test_tie_is_defeated() {
        let s = setup([For, For, Against, Against, Abstain]);
        assert_eq!(s.gov.get_phase(&s.proposal).unwrap(), Phase::Defeated);
    }

    #[test]
    fn test_scenario_c_maturity_boundary() {
        let mut s = setup([For, For, For, Against, Abstain]);
        let op = queue(&mut s);
        let queued_at = s.gov.operation(&op).unwrap().scheduled_at;
        assert_eq!(s.gov.operation(&op).unwrap().maturity, queued_at + MIN_DELAY);

        s.gov.clock_mut().advance_time(MIN_DELAY - 1);
        assert!(matches!(execute(&mut s), Err(GovernanceError::NotReady { .. })));
        assert_eq!(s.gov.operation_status(&op), OperationStatus::Pending);
        assert_eq!(s.treasury.balance(), 5_000);

        s.gov.clock_mut().advance_time(1);
        assert_eq!(s.gov.operation_status(&op), OperationStatus::Ready);
        execute(&mut s).unwrap();
        assert_eq!(s.treasury.balance(), 0);
        assert_eq!(s.treasury.paid_out(), 5_000);
        assert_eq!(s.gov.get_phase(&s.proposal).unwrap(), Phase::Executed);

        assert_eq!(execute(&mut s), Err(GovernanceError::AlreadyExecuted));
    }

    #[test]
    fn test_scenario_d_cancel_removes_eligibility() {
        let mut s = setup([For, For, For, Against, Abstain]);
        let op = queue(&mut s);

        s.gov.cancel(&op, &guardian()).unwrap();
        assert_eq!(s.gov.operation_status(&op), OperationStatus::Canceled);

        s.gov.clock_mut().advance_time(MIN_DELAY);
        assert_eq!(execute(&mut s), Err(GovernanceError::UnknownOperation(op)));
        assert_eq!(s.gov.get_phase(&s.proposal).unwrap(), Phase::Canceled);
        assert_eq!(s.treasury.balance(), 5_000);
    }

    #[test]
    fn test_failed_execution_can_be_retried() {
        use crate::contracts::execution::CallExecutor;

        let mut s = setup([For, For, For, Against, Abstain]);
        let op = queue(&mut s);
        s.gov.clock_mut().advance_time(MIN_DELAY);

        // A treasury that already paid out rejects the release
        let mut spent = s.treasury.clone();
        spent.execute_call(&release_funds_call(spent.address)).unwrap();
        let call = release_funds_call(s.treasury.address);
        let result = s.gov.execute(
            &[call.target],
            &[call.value],
            &[call.payload.clone()],
            &description_hash(DESCRIPTION),
            &mut spent,
        );
        assert!(matches!(result, Err(GovernanceError::SubcallFailed { index: 0, .. })));
        assert_eq!(s.gov.operation_status(&op), OperationStatus::Ready);
        assert_eq!(s.gov.get_phase(&s.proposal).unwrap(), Phase::Queued);

        execute(&mut s).unwrap();
        assert_eq!(s.gov.operation_status(&op), OperationStatus::Done);
        assert!(s.treasury.is_released());
    }
}
