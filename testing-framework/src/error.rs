// File: testing-framework/src/error.rs
//
// Error taxonomy for transfer scenarios.
//
// Node and fixture calls report `anyhow` errors; everything surfaced to a
// scenario caller is one of the typed variants below, wrapped in a
// `StepError` that records where in the scenario it happened.

use std::fmt;

use thiserror::Error;

use crate::accounts::AccountId;
use crate::network::{BlockCount, BlockHash, DeployHash};

/// Failure of a single harness operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HarnessError {
    /// The node rejected the deploy, or its execution reported failure
    #[error("Deploy failed: {reason}")]
    DeployFailed {
        /// Node supplied reason
        reason: String,
    },

    /// Block count did not reach the target within the retry budget
    #[error(
        "Convergence timeout: expected block count >= {target_count}, last observed {last_observed_count} after {attempts} attempts"
    )]
    ConvergenceTimeout {
        /// Block count the waiter was asked for
        target_count: BlockCount,
        /// Last count reported by the node
        last_observed_count: BlockCount,
        /// Number of observations made
        attempts: u32,
    },

    /// A read against the node failed
    #[error("Query failed: {reason}")]
    QueryFailed {
        /// Node supplied reason
        reason: String,
    },

    /// The account registry has no entry for this id
    #[error("Unknown account: {0}")]
    UnknownAccount(AccountId),

    /// Waiter called with a target or retry budget of zero
    #[error("Invalid wait configuration: {0}")]
    InvalidWaitConfig(String),

    /// Block was produced but its execution log does not list the deploy
    #[error("Deploy {deploy_hash} not found in block {block_hash}")]
    DeployNotInBlock {
        /// Deploy that was submitted
        deploy_hash: DeployHash,
        /// Block it was expected in
        block_hash: BlockHash,
    },

    /// Observed state does not match what the step expects
    #[error("Assertion failed: {0}")]
    AssertionFailed(String),
}

impl HarnessError {
    pub(crate) fn deploy_failed(err: anyhow::Error) -> Self {
        Self::DeployFailed {
            reason: format!("{:#}", err),
        }
    }

    pub(crate) fn query_failed(err: anyhow::Error) -> Self {
        Self::QueryFailed {
            reason: format!("{:#}", err),
        }
    }
}

/// Part of a transfer step an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    /// Resolving accounts in the registry
    Lookup,
    /// Submitting the deploy and proposing its block
    Deploy,
    /// Waiting for the block count to reach the target
    Convergence,
    /// Reading the block's execution log
    Verification,
    /// Querying account state at the block
    Query,
    /// Comparing observed results with the step expectation
    Assertion,
}

impl fmt::Display for StepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepPhase::Lookup => "lookup",
            StepPhase::Deploy => "deploy",
            StepPhase::Convergence => "convergence",
            StepPhase::Verification => "verification",
            StepPhase::Query => "query",
            StepPhase::Assertion => "assertion",
        };
        f.write_str(name)
    }
}

/// A `HarnessError` annotated with the step and phase that produced it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("step {step} failed during {phase}: {source}")]
pub struct StepError {
    /// 1-indexed step number
    pub step: usize,
    /// Phase of the step
    pub phase: StepPhase,
    /// Block proposed by the step, if it got that far
    pub block_hash: Option<BlockHash>,
    /// Underlying failure
    #[source]
    pub source: HarnessError,
}

impl StepError {
    pub(crate) fn new(step: usize, phase: StepPhase, source: HarnessError) -> Self {
        Self {
            step,
            phase,
            block_hash: None,
            source,
        }
    }

    pub(crate) fn at_block(mut self, block_hash: &BlockHash) -> Self {
        self.block_hash = Some(block_hash.clone());
        self
    }
}
