// Scenario - Declarative description of one governance run
//
// A scenario names the electorate, their weights and ballots, and what the
// driver should do once voting closes. The two built-in demos reproduce the
// release-funds and refused-proposal flows.

use crate::contracts::ledger::VoteChoice;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const RELEASE_FUNDS_DESCRIPTION: &str = "Release Funds from Treasury";

/// One voter of the electorate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterSpec {
    pub name: String,

    /// Tokens minted to and self-delegated by this voter
    pub weight: u64,

    /// Ballot; `None` abstains from voting entirely
    #[serde(default)]
    pub vote: Option<VoteChoice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,

    #[serde(default = "default_description")]
    pub description: String,

    /// Index into `voters` of the proposer
    #[serde(default)]
    pub proposer: usize,

    /// Balance held by the treasury before the proposal runs
    #[serde(default = "default_treasury_balance")]
    pub treasury_balance: u64,

    /// Guardian cancels the operation after it is queued
    #[serde(default)]
    pub cancel_after_queue: bool,

    pub voters: Vec<VoterSpec>,
}

fn default_description() -> String {
    RELEASE_FUNDS_DESCRIPTION.to_string()
}

fn default_treasury_balance() -> u64 {
    1_000
}

impl Scenario {
    /// Five voters with 10 units each; ballots in voter order
    fn five_voters(name: &str, ballots: [VoteChoice; 5]) -> Self {
        let names = ["alice", "bob", "carol", "dave", "erin"];
        Self {
            name: name.to_string(),
            description: default_description(),
            proposer: 0,
            treasury_balance: default_treasury_balance(),
            cancel_after_queue: false,
            voters: names
                .iter()
                .zip(ballots)
                .map(|(name, vote)| VoterSpec {
                    name: name.to_string(),
                    weight: 10,
                    vote: Some(vote),
                })
                .collect(),
        }
    }

    /// Votes [For, For, For, Against, Abstain]: passes and releases funds
    pub fn release_funds() -> Self {
        use VoteChoice::*;
        Self::five_voters("release-funds", [For, For, For, Against, Abstain])
    }

    /// Votes [Against, Against, Against, For, Abstain]: defeated
    pub fn refuse() -> Self {
        use VoteChoice::*;
        Self::five_voters("refuse", [Against, Against, Against, For, Abstain])
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let scenario: Self = toml::from_str(&content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.voters.is_empty() {
            anyhow::bail!("scenario {} has no voters", self.name);
        }
        if self.proposer >= self.voters.len() {
            anyhow::bail!(
                "proposer index {} out of range ({} voters)",
                self.proposer,
                self.voters.len()
            );
        }
        let mut names: Vec<&str> = self.voters.iter().map(|v| v.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.voters.len() {
            anyhow::bail!("voter names must be unique");
        }
        Ok(())
    }
}
