// File: testing-framework/src/orchestrator/mod.rs
//
// Transfer Scenario Orchestrator
//
// Runs the steps of a scenario strictly in order. Step i+1 is not started
// until step i's deploy has been accepted and its block counted, because
// every step's starting balances are the previous step's results.

/// Clock abstractions for deterministic time control in tests
pub mod clock;
/// Single transfer step: deploy, propose, converge
pub mod executor;
/// Scenario definitions and results
pub mod scenario;

pub use clock::{Clock, CountingClock, PausedClock, SystemClock};
pub use executor::{StepReceipt, TransferStepExecutor};
pub use scenario::{
    account_transfer_scenario, ScenarioResult, StepExpectation, StepRecord, TransferScenario,
    TransferStep,
};

use crate::accounts::AccountRegistry;
use crate::error::{HarnessError, StepError, StepPhase};
use crate::network::{BlockHash, ExecutionOutcome, KeyType, NodeHandle, PublicKey, StateSnapshot};
use std::sync::Arc;

/// Drives transfer scenarios against one node
///
/// The node and account registry are passed per run; the orchestrator only
/// owns the clock used for convergence sleeps.
///
/// # Example
///
/// ```rust,ignore
/// let clock = Arc::new(PausedClock::new());
/// let node = SimulatedNodeBuilder::new()
///     .with_clock(clock.clone())
///     .with_funded_account(PublicKey::new([0x01; 32]), 150)
///     .build();
///
/// let orchestrator = ScenarioOrchestrator::new(clock);
/// let result = orchestrator
///     .run(&node, &fixture_accounts(), &account_transfer_scenario())
///     .await?;
///
/// assert_eq!(result.steps.len(), 3);
/// ```
pub struct ScenarioOrchestrator {
    clock: Arc<dyn Clock>,
}

impl ScenarioOrchestrator {
    /// Create an orchestrator sleeping on `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Run every step of `scenario` against `node`.
    ///
    /// Each step resolves its accounts, deploys the recipient's transfer
    /// payload, waits for `expected_min_block_count`, checks the deploy is in
    /// the block's execution log with the expected outcome, and queries the
    /// sender and recipient at the step's block. A step expected to fail must
    /// leave both accounts byte-identical to their state at the previous
    /// step's block.
    ///
    /// # Errors
    ///
    /// The first failing step aborts the run; its `StepError` is returned
    /// unchanged. A step whose `expected_min_block_count` is not above the
    /// count the previous step observed fails with `InvalidWaitConfig`
    /// before deploying.
    pub async fn run<N, R>(
        &self,
        node: &N,
        registry: &R,
        scenario: &TransferScenario,
    ) -> Result<ScenarioResult, StepError>
    where
        N: NodeHandle + ?Sized,
        R: AccountRegistry + ?Sized,
    {
        log::info!(
            "Starting scenario '{}' ({} steps, {} retries every {:?})",
            scenario.name,
            scenario.steps.len(),
            scenario.wait.max_retries,
            scenario.wait.retry_interval
        );
        if let Some(description) = &scenario.description {
            log::info!("{}", description);
        }

        let executor = TransferStepExecutor::new(self.clock.clone(), scenario.wait);
        let mut records: Vec<StepRecord> = Vec::with_capacity(scenario.steps.len());
        let mut previous_block: Option<BlockHash> = None;

        for (idx, step) in scenario.steps.iter().enumerate() {
            let number = idx + 1;

            // One block per step: a target already reached would pass the
            // wait before this step's block is counted
            if let Some(previous) = records.last() {
                let observed = previous.convergence.observed_count;
                if step.expected_min_block_count <= observed {
                    return Err(StepError::new(
                        number,
                        StepPhase::Convergence,
                        HarnessError::InvalidWaitConfig(format!(
                            "target block count {} is not above the {} already observed by step {}",
                            step.expected_min_block_count, observed, previous.step
                        )),
                    ));
                }
            }

            let lookup_err = |e| StepError::new(number, StepPhase::Lookup, e);

            let recipient = registry.lookup(step.recipient).map_err(lookup_err)?;
            let sender_key = match step.sender {
                Some(id) => Some(registry.lookup(id).map_err(lookup_err)?.public_key.clone()),
                None => None,
            };

            let mut relevant = vec![sender_key
                .clone()
                .unwrap_or_else(|| scenario.default_sender.clone())];
            if !relevant.contains(&recipient.public_key) {
                relevant.push(recipient.public_key.clone());
            }

            let baseline = match (step.expect, &previous_block) {
                (StepExpectation::Failure, Some(block)) => {
                    Some(query_accounts(node, number, block, &relevant).await?)
                }
                (StepExpectation::Failure, None) => {
                    log::warn!(
                        "Step {}: no previous block, cannot compare state around the failed transfer",
                        number
                    );
                    None
                }
                (StepExpectation::Success, _) => None,
            };

            let receipt = executor
                .execute(
                    node,
                    number,
                    &recipient.transfer_payload,
                    sender_key.as_ref(),
                    step.expected_min_block_count,
                )
                .await?;

            let at_block = |phase, e| StepError::new(number, phase, e).at_block(&receipt.block_hash);

            let deploys = node
                .block_deploys(&receipt.block_hash)
                .await
                .map_err(|e| at_block(StepPhase::Verification, HarnessError::query_failed(e)))?;
            let record = deploys
                .into_iter()
                .find(|d| d.deploy_hash == receipt.deploy_hash)
                .ok_or_else(|| {
                    at_block(
                        StepPhase::Verification,
                        HarnessError::DeployNotInBlock {
                            deploy_hash: receipt.deploy_hash.clone(),
                            block_hash: receipt.block_hash.clone(),
                        },
                    )
                })?;

            match (step.expect, &record.outcome) {
                (StepExpectation::Success, ExecutionOutcome::Failure { reason }) => {
                    return Err(at_block(
                        StepPhase::Verification,
                        HarnessError::DeployFailed {
                            reason: reason.clone(),
                        },
                    ));
                }
                (StepExpectation::Failure, ExecutionOutcome::Success) => {
                    return Err(at_block(
                        StepPhase::Assertion,
                        HarnessError::AssertionFailed(format!(
                            "deploy {} was expected to fail but executed successfully",
                            receipt.deploy_hash
                        )),
                    ));
                }
                _ => {}
            }

            let snapshots = query_accounts(node, number, &receipt.block_hash, &relevant).await?;

            if let Some(before) = baseline {
                for (prior, after) in before.iter().zip(&snapshots) {
                    if prior.value_bytes() != after.value_bytes() {
                        return Err(at_block(
                            StepPhase::Assertion,
                            HarnessError::AssertionFailed(format!(
                                "state of {} changed by a failed transfer ({} -> {})",
                                after.key,
                                describe_balance(prior),
                                describe_balance(after)
                            )),
                        ));
                    }
                }
            }

            log::info!(
                "Step {} complete: block {}, outcome {:?}",
                number,
                receipt.block_hash.short(),
                record.outcome
            );

            previous_block = Some(receipt.block_hash.clone());
            records.push(StepRecord {
                step: number,
                block_hash: receipt.block_hash,
                deploy_hash: receipt.deploy_hash,
                outcome: record.outcome,
                convergence: receipt.convergence,
                snapshots,
            });
        }

        log::info!("Scenario '{}' completed", scenario.name);

        Ok(ScenarioResult {
            name: scenario.name.clone(),
            steps: records,
        })
    }
}

fn describe_balance(snapshot: &StateSnapshot) -> String {
    match snapshot.balance() {
        Some(balance) => format!("balance {}", balance),
        None => "absent".to_string(),
    }
}

/// Query the address state of each key at `block_hash`, in order
async fn query_accounts<N: NodeHandle + ?Sized>(
    node: &N,
    step: usize,
    block_hash: &BlockHash,
    keys: &[PublicKey],
) -> Result<Vec<StateSnapshot>, StepError> {
    let mut snapshots = Vec::with_capacity(keys.len());
    for key in keys {
        let snapshot = node
            .query_state(block_hash, KeyType::Address, key, "")
            .await
            .map_err(|e| {
                StepError::new(step, StepPhase::Query, HarnessError::query_failed(e))
                    .at_block(block_hash)
            })?;
        snapshots.push(snapshot);
    }
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{fixture_accounts, AccountId};
    use crate::config::WaitConfig;
    use crate::network::{SimulatedNode, SimulatedNodeBuilder};
    use crate::types::HASH_SIZE;
    use tokio::time::Duration;

    fn funded_node(clock: Arc<PausedClock>, account_1_balance: u64) -> SimulatedNode {
        SimulatedNodeBuilder::new()
            .with_clock(clock)
            .with_funded_account(PublicKey::new([0x01; HASH_SIZE]), account_1_balance)
            .with_funded_account(PublicKey::new([0x02; HASH_SIZE]), 0)
            .with_propagation_delay(Duration::from_millis(300))
            .build()
    }

    fn quick_wait() -> WaitConfig {
        WaitConfig::new(5, Duration::from_millis(100))
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_recipient_fails_lookup_before_deploy() {
        let clock = Arc::new(PausedClock::new());
        let node = funded_node(clock.clone(), 150);
        let scenario = TransferScenario::new("unknown")
            .with_wait(quick_wait())
            .with_step(TransferStep::new(AccountId(7), 2));

        let err = ScenarioOrchestrator::new(clock)
            .run(&node, &fixture_accounts(), &scenario)
            .await
            .unwrap_err();

        assert_eq!(err.step, 1);
        assert_eq!(err.phase, StepPhase::Lookup);
        assert_eq!(err.source, HarnessError::UnknownAccount(AccountId(7)));
        assert_eq!(node.produced_block_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_execution_failure_is_deploy_failed() {
        let clock = Arc::new(PausedClock::new());
        let node = funded_node(clock.clone(), 10);
        let scenario = TransferScenario::new("underfunded")
            .with_wait(quick_wait())
            .with_step(TransferStep::new(AccountId(2), 2).from_account(AccountId(1)));

        let err = ScenarioOrchestrator::new(clock)
            .run(&node, &fixture_accounts(), &scenario)
            .await
            .unwrap_err();

        assert_eq!(err.phase, StepPhase::Verification);
        assert!(err.block_hash.is_some());
        assert!(matches!(err.source, HarnessError::DeployFailed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expected_failure_that_succeeds_is_assertion_error() {
        let clock = Arc::new(PausedClock::new());
        let node = funded_node(clock.clone(), 10_000);
        let scenario = TransferScenario::new("overfunded")
            .with_wait(quick_wait())
            .with_step(TransferStep::new(AccountId(1), 2))
            .with_step(
                TransferStep::new(AccountId(2), 3)
                    .from_account(AccountId(1))
                    .expecting_failure(),
            );

        let err = ScenarioOrchestrator::new(clock)
            .run(&node, &fixture_accounts(), &scenario)
            .await
            .unwrap_err();

        assert_eq!(err.step, 2);
        assert_eq!(err.phase, StepPhase::Assertion);
        assert!(matches!(err.source, HarnessError::AssertionFailed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expected_failure_as_first_step_skips_comparison() {
        let clock = Arc::new(PausedClock::new());
        let node = funded_node(clock.clone(), 10);
        let scenario = TransferScenario::new("first step fails")
            .with_wait(quick_wait())
            .with_step(
                TransferStep::new(AccountId(1), 2)
                    .from_account(AccountId(1))
                    .expecting_failure(),
            );

        let result = ScenarioOrchestrator::new(clock)
            .run(&node, &fixture_accounts(), &scenario)
            .await
            .unwrap();

        // Sender and recipient are the same account, queried once
        assert_eq!(result.steps[0].snapshots.len(), 1);
        assert!(!result.steps[0].outcome.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_transfer_to_unfunded_recipient() {
        let clock = Arc::new(PausedClock::new());
        let node = SimulatedNodeBuilder::new()
            .with_clock(clock.clone())
            .with_propagation_delay(Duration::from_millis(300))
            .build();
        let scenario = TransferScenario::new("unfunded recipient")
            .with_wait(quick_wait())
            .with_step(TransferStep::new(AccountId(1), 2))
            .with_step(
                TransferStep::new(AccountId(2), 3)
                    .from_account(AccountId(1))
                    .expecting_failure(),
            );

        let result = ScenarioOrchestrator::new(clock)
            .run(&node, &fixture_accounts(), &scenario)
            .await
            .unwrap();

        let record = &result.steps[1];
        assert!(!record.outcome.is_success());
        let recipient = record.snapshot(&PublicKey::new([0x02; HASH_SIZE])).unwrap();
        assert_eq!(recipient.account, None);
        assert_eq!(result.balance_after(2, &PublicKey::new([0x01; HASH_SIZE])), Some(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_target_is_rejected_before_deploy() {
        let clock = Arc::new(PausedClock::new());
        let node = funded_node(clock.clone(), 150);
        let scenario = TransferScenario::new("same target")
            .with_wait(quick_wait())
            .with_step(TransferStep::new(AccountId(1), 2))
            .with_step(TransferStep::new(AccountId(2), 2).from_account(AccountId(1)));

        let err = ScenarioOrchestrator::new(clock)
            .run(&node, &fixture_accounts(), &scenario)
            .await
            .unwrap_err();

        assert_eq!(err.step, 2);
        assert_eq!(err.phase, StepPhase::Convergence);
        assert_eq!(err.block_hash, None);
        assert!(matches!(err.source, HarnessError::InvalidWaitConfig(_)));
        // Second transfer never submitted
        assert_eq!(node.produced_block_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_sender_and_recipient_are_snapshotted() {
        let clock = Arc::new(PausedClock::new());
        let node = funded_node(clock.clone(), 150);
        let scenario = TransferScenario::new("one transfer")
            .with_wait(quick_wait())
            .with_step(TransferStep::new(AccountId(1), 2));

        let result = ScenarioOrchestrator::new(clock)
            .run(&node, &fixture_accounts(), &scenario)
            .await
            .unwrap();

        let record = &result.steps[0];
        assert_eq!(record.snapshots[0].key, crate::accounts::GENESIS_PUBLIC_KEY);
        assert_eq!(record.snapshots[1].key, PublicKey::new([0x01; HASH_SIZE]));
        assert_eq!(record.snapshots[1].balance(), Some(250));
        // 300ms propagation polled every 100ms
        assert_eq!(record.convergence.attempts, 4);
    }
}
