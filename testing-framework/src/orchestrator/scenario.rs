// File: testing-framework/src/orchestrator/scenario.rs
//
// Scenario definitions and results.

use serde::{Deserialize, Serialize};

use crate::accounts::{AccountId, GENESIS_PUBLIC_KEY};
use crate::config::WaitConfig;
use crate::network::{
    BlockCount, BlockHash, Convergence, DeployHash, ExecutionOutcome, PublicKey, StateSnapshot,
};

/// How a step's deploy is expected to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepExpectation {
    /// Transfer applies
    #[default]
    Success,
    /// Block is produced but the deploy's execution fails, leaving the
    /// involved accounts untouched
    Failure,
}

/// One transfer in a scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferStep {
    /// Signing account; `None` uses the node's default identity
    pub sender: Option<AccountId>,
    /// Account whose transfer contract is deployed
    pub recipient: AccountId,
    /// Block count that must be observed before the step completes
    pub expected_min_block_count: BlockCount,
    /// Expected execution result
    pub expect: StepExpectation,
}

impl TransferStep {
    /// Transfer to `recipient` signed by the default identity
    pub fn new(recipient: AccountId, expected_min_block_count: BlockCount) -> Self {
        Self {
            sender: None,
            recipient,
            expected_min_block_count,
            expect: StepExpectation::Success,
        }
    }

    /// Sign with `sender` instead of the default identity
    pub fn from_account(mut self, sender: AccountId) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Expect the deploy's execution to fail
    pub fn expecting_failure(mut self) -> Self {
        self.expect = StepExpectation::Failure;
        self
    }
}

/// Ordered list of dependent transfers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferScenario {
    /// Name used in logs
    pub name: String,
    /// Free-form summary, logged when the scenario starts
    pub description: Option<String>,
    /// Key of the node's default identity, queried for steps without a sender
    pub default_sender: PublicKey,
    /// Retry budget for every step's convergence wait
    pub wait: WaitConfig,
    /// Steps in execution order
    pub steps: Vec<TransferStep>,
}

impl TransferScenario {
    /// Empty scenario with the genesis default sender and the
    /// environment/default wait budget
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            default_sender: GENESIS_PUBLIC_KEY,
            wait: WaitConfig::from_env_or_default(),
            steps: Vec::new(),
        }
    }

    /// Append a step
    pub fn with_step(mut self, step: TransferStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Attach a summary
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the wait budget
    pub fn with_wait(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    /// Replace the default sender key
    pub fn with_default_sender(mut self, key: PublicKey) -> Self {
        self.default_sender = key;
        self
    }
}

/// Single-node account transfer scenario
///
/// 1. default identity `3030…30` → account 1 (`0101…01`), 100, block count ≥ 2
/// 2. account 1 → account 2 (`0202…02`), 175, block count ≥ 3
/// 3. same transfer again, which account 1 can no longer fund, block count ≥ 4
pub fn account_transfer_scenario() -> TransferScenario {
    TransferScenario::new("Account transfer")
        .with_step(TransferStep::new(AccountId(1), 2))
        .with_step(TransferStep::new(AccountId(2), 3).from_account(AccountId(1)))
        .with_step(
            TransferStep::new(AccountId(2), 4)
                .from_account(AccountId(1))
                .expecting_failure(),
        )
}

/// Completed step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    /// 1-indexed step number
    pub step: usize,
    /// Block the step's deploy was proposed in
    pub block_hash: BlockHash,
    /// Deploy submitted by the step
    pub deploy_hash: DeployHash,
    /// Execution result from the block's log
    pub outcome: ExecutionOutcome,
    /// Convergence wait result
    pub convergence: Convergence,
    /// Account states queried at `block_hash` (sender first, then recipient)
    pub snapshots: Vec<StateSnapshot>,
}

impl StepRecord {
    /// Snapshot of `key` taken after this step
    pub fn snapshot(&self, key: &PublicKey) -> Option<&StateSnapshot> {
        self.snapshots.iter().find(|s| &s.key == key)
    }
}

/// Outcome of a completed scenario, one record per step in step order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioResult {
    /// Scenario name
    pub name: String,
    /// Step records
    pub steps: Vec<StepRecord>,
}

impl ScenarioResult {
    /// Block hashes in step order
    pub fn block_hashes(&self) -> Vec<&BlockHash> {
        self.steps.iter().map(|s| &s.block_hash).collect()
    }

    /// Balance of `key` after `step` (1-indexed), if it was queried and the
    /// account exists
    pub fn balance_after(&self, step: usize, key: &PublicKey) -> Option<u64> {
        self.steps
            .get(step.checked_sub(1)?)?
            .snapshot(key)
            .and_then(|s| s.balance())
    }

    /// Print report to stdout
    pub fn print(&self) {
        println!("\nScenario: {}", self.name);
        println!("═════════");
        for record in &self.steps {
            let status = match &record.outcome {
                ExecutionOutcome::Success => "success".to_string(),
                ExecutionOutcome::Failure { reason } => format!("failed ({})", reason),
            };
            println!(
                "  Step {}: block {} (count {}, {} retries) {}",
                record.step,
                record.block_hash.short(),
                record.convergence.observed_count,
                record.convergence.retries(),
                status
            );
            for snapshot in &record.snapshots {
                match snapshot.balance() {
                    Some(balance) => println!("    {} balance={}", snapshot.key.short(), balance),
                    None => println!("    {} absent", snapshot.key.short()),
                }
            }
        }
    }
}
