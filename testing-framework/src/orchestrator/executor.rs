//! Transfer step execution
//!
//! One causally ordered transfer: deploy and propose, then wait until the
//! node counts the resulting block. A receipt is only returned once the
//! step's effect is observable.

use crate::accounts::TransferPayload;
use crate::config::WaitConfig;
use crate::error::{HarnessError, StepError, StepPhase};
use crate::network::{
    wait_for_block_count, BlockCount, BlockHash, Convergence, DeployHash, NodeHandle, PublicKey,
};
use crate::orchestrator::Clock;
use std::sync::Arc;

/// Converged transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReceipt {
    /// Submitted deploy
    pub deploy_hash: DeployHash,
    /// Block the deploy was proposed in
    pub block_hash: BlockHash,
    /// Result of the convergence wait
    pub convergence: Convergence,
}

/// Runs single transfer steps against a node
pub struct TransferStepExecutor {
    clock: Arc<dyn Clock>,
    wait: WaitConfig,
}

impl TransferStepExecutor {
    /// Create an executor sleeping on `clock` with the `wait` retry budget
    pub fn new(clock: Arc<dyn Clock>, wait: WaitConfig) -> Self {
        Self { clock, wait }
    }

    /// Retry budget used for convergence
    pub fn wait_config(&self) -> &WaitConfig {
        &self.wait
    }

    /// Deploy `payload`, propose its block, and wait for the node's block
    /// count to reach `expected_block_count`.
    ///
    /// `step` is only used to label errors and log lines.
    ///
    /// # Errors
    ///
    /// - phase `Deploy`, `DeployFailed`: the node rejected the deploy
    /// - phase `Convergence`, `ConvergenceTimeout` or `QueryFailed`: the block
    ///   was proposed (its hash is attached) but the count never reached the
    ///   target, or could not be read
    pub async fn execute<N: NodeHandle + ?Sized>(
        &self,
        node: &N,
        step: usize,
        payload: &TransferPayload,
        sender: Option<&PublicKey>,
        expected_block_count: BlockCount,
    ) -> Result<StepReceipt, StepError> {
        let receipt = node
            .deploy_and_propose(payload, sender)
            .await
            .map_err(|e| StepError::new(step, StepPhase::Deploy, HarnessError::deploy_failed(e)))?;

        log::info!(
            "Step {}: deploy {} proposed in block {}, waiting for block count >= {}",
            step,
            receipt.deploy_hash.short(),
            receipt.block_hash.short(),
            expected_block_count
        );

        let convergence =
            wait_for_block_count(node, self.clock.as_ref(), expected_block_count, &self.wait)
                .await
                .map_err(|e| {
                    StepError::new(step, StepPhase::Convergence, e).at_block(&receipt.block_hash)
                })?;

        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Step {}: converged at block count {} after {} retries",
                step,
                convergence.observed_count,
                convergence.retries()
            );
        }

        Ok(StepReceipt {
            deploy_hash: receipt.deploy_hash,
            block_hash: receipt.block_hash,
            convergence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{fixture_accounts, AccountId, AccountRegistry};
    use crate::network::SimulatedNodeBuilder;
    use crate::orchestrator::PausedClock;
    use tokio::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_returns_after_block_propagates() {
        let clock = Arc::new(PausedClock::new());
        let node = SimulatedNodeBuilder::new()
            .with_clock(clock.clone())
            .with_propagation_delay(Duration::from_millis(1500))
            .build();
        let accounts = fixture_accounts();
        let payload = &accounts.lookup(AccountId(1)).unwrap().transfer_payload;

        let executor =
            TransferStepExecutor::new(clock.clone(), WaitConfig::new(5, Duration::from_secs(1)));
        let start = clock.now();

        let receipt = executor.execute(&node, 1, payload, None, 2).await.unwrap();

        // Observed at t=0 and t=1s below target, satisfied at t=2s
        assert_eq!(receipt.convergence.attempts, 3);
        assert_eq!(clock.now() - start, Duration::from_secs(2));
        assert_eq!(
            node.block_deploys(&receipt.block_hash).await.unwrap()[0].deploy_hash,
            receipt.deploy_hash
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_deploy_is_deploy_phase() {
        let clock = Arc::new(PausedClock::new());
        let node = SimulatedNodeBuilder::new().with_clock(clock.clone()).build();
        node.reject_next_deploy("invalid signature");
        let accounts = fixture_accounts();
        let payload = &accounts.lookup(AccountId(2)).unwrap().transfer_payload;

        let executor = TransferStepExecutor::new(clock, WaitConfig::default());
        let err = executor.execute(&node, 3, payload, None, 2).await.unwrap_err();

        assert_eq!(err.step, 3);
        assert_eq!(err.phase, StepPhase::Deploy);
        assert!(err.block_hash.is_none());
        assert_eq!(
            err.source,
            HarnessError::DeployFailed {
                reason: "Deploy rejected: invalid signature".to_string()
            }
        );
        assert_eq!(node.produced_block_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_convergence_phase_with_block_hash() {
        let clock = Arc::new(PausedClock::new());
        let node = SimulatedNodeBuilder::new()
            .with_clock(clock.clone())
            .with_propagation_delay(Duration::from_secs(60))
            .build();
        let accounts = fixture_accounts();
        let payload = &accounts.lookup(AccountId(1)).unwrap().transfer_payload;

        let executor =
            TransferStepExecutor::new(clock, WaitConfig::new(3, Duration::from_secs(1)));
        let err = executor.execute(&node, 1, payload, None, 2).await.unwrap_err();

        assert_eq!(err.phase, StepPhase::Convergence);
        assert!(err.block_hash.is_some());
        assert_eq!(
            err.source,
            HarnessError::ConvergenceTimeout {
                target_count: 2,
                last_observed_count: 1,
                attempts: 3,
            }
        );
    }
}
