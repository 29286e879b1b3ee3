// File: testing-framework/src/network/waiters.rs
//
// Block-count convergence waiter.
//
// Deploy and propose calls can return before the resulting block is counted
// by the node, so every step synchronizes on the observed block count
// instead of the call's return value.

use super::{BlockCount, NodeHandle};
use crate::config::WaitConfig;
use crate::error::HarnessError;
use crate::orchestrator::Clock;

/// Successful wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence {
    /// Block count at the satisfying observation
    pub observed_count: BlockCount,
    /// Observations made, including the satisfying one
    pub attempts: u32,
}

impl Convergence {
    /// Observations beyond the first
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Poll `node` until its block count is at least `target_count`.
///
/// Makes at most `config.max_retries` observations and sleeps
/// `config.retry_interval` on `clock` between two of them. A target already
/// met on the first observation returns without sleeping, and nothing sleeps
/// after the last failed observation.
///
/// # Errors
///
/// - `InvalidWaitConfig` if `target_count` or `max_retries` is zero
/// - `QueryFailed` as soon as a block-count query fails
/// - `ConvergenceTimeout` after `max_retries` observations below target
///
/// # Example
///
/// ```rust,ignore
/// let config = WaitConfig::new(4, Duration::from_millis(250));
/// let convergence = wait_for_block_count(&node, clock.as_ref(), 2, &config).await?;
/// assert!(convergence.observed_count >= 2);
/// ```
pub async fn wait_for_block_count<N: NodeHandle + ?Sized>(
    node: &N,
    clock: &dyn Clock,
    target_count: BlockCount,
    config: &WaitConfig,
) -> Result<Convergence, HarnessError> {
    if target_count == 0 {
        return Err(HarnessError::InvalidWaitConfig(
            "target block count must be at least 1".to_string(),
        ));
    }
    if config.max_retries == 0 {
        return Err(HarnessError::InvalidWaitConfig(
            "max_retries must be at least 1".to_string(),
        ));
    }

    let mut highest_seen: Option<BlockCount> = None;
    let mut last_observed = 0;

    for attempt in 1..=config.max_retries {
        let observed = node
            .current_block_count()
            .await
            .map_err(HarnessError::query_failed)?;

        if let Some(highest) = highest_seen {
            if observed < highest {
                log::warn!(
                    "Block count went backwards: observed {} after {}",
                    observed,
                    highest
                );
            }
        }
        highest_seen = Some(highest_seen.map_or(observed, |h| h.max(observed)));
        last_observed = observed;

        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Block count {}/{} (attempt {}/{})",
                observed,
                target_count,
                attempt,
                config.max_retries
            );
        }

        if observed >= target_count {
            return Ok(Convergence {
                observed_count: observed,
                attempts: attempt,
            });
        }

        if attempt < config.max_retries {
            clock.sleep(config.retry_interval).await;
        }
    }

    Err(HarnessError::ConvergenceTimeout {
        target_count,
        last_observed_count: last_observed,
        attempts: config.max_retries,
    })
}
