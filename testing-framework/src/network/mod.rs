// File: testing-framework/src/network/mod.rs
//
// Node Interface
//
// The operations a transfer scenario needs from one running ledger node,
// the convergence waiter built on top of them, and an in-process node that
// implements them for tests.

pub mod builder;
pub mod simulated_node;
/// Block-count convergence waiter
pub mod waiters;


pub use builder::SimulatedNodeBuilder;
pub use simulated_node::SimulatedNode;
pub use waiters::{wait_for_block_count, Convergence};

pub use crate::types::{BlockCount, BlockHash, DeployHash, PublicKey};

use crate::accounts::TransferPayload;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of global-state key a query addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// Account address (public key)
    Address,
    /// Stored contract hash
    Hash,
    /// Unforgeable reference
    Uref,
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyType::Address => "address",
            KeyType::Hash => "hash",
            KeyType::Uref => "uref",
        };
        f.write_str(name)
    }
}

/// Returned by a successful deploy+propose
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReceipt {
    /// Hash of the submitted deploy
    pub deploy_hash: DeployHash,
    /// Block the deploy was proposed in
    pub block_hash: BlockHash,
}

/// Result of executing one deploy inside a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecutionOutcome {
    /// State changes were committed
    Success,
    /// Execution failed; the block is valid but the deploy had no effect
    Failure {
        /// Error reported by the execution engine
        reason: String,
    },
}

impl ExecutionOutcome {
    /// Whether execution succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success)
    }
}

/// Entry of a block's execution log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRecord {
    /// Deploy hash
    pub deploy_hash: DeployHash,
    /// Account that signed the deploy
    pub sender: PublicKey,
    /// Payload that was executed
    pub payload: TransferPayload,
    /// Execution result
    pub outcome: ExecutionOutcome,
}

/// Account value stored under an address key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Account public key
    pub public_key: PublicKey,
    /// Main purse balance
    pub balance: u64,
}

/// Value returned by a state query at a given block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Block the state was read at
    pub block_hash: BlockHash,
    /// Key type queried
    pub key_type: KeyType,
    /// Key queried
    pub key: PublicKey,
    /// Path below the key (empty for the key itself)
    pub path: String,
    /// Value found, `None` if nothing is stored under the key at this block
    pub account: Option<AccountState>,
}

impl StateSnapshot {
    /// Balance stored under the key, if the account exists
    pub fn balance(&self) -> Option<u64> {
        self.account.as_ref().map(|account| account.balance)
    }

    /// Canonical encoding of the stored value, independent of the block it
    /// was read at
    ///
    /// An absent account encodes as `null`, so "absent before, absent after"
    /// compares equal.
    pub fn value_bytes(&self) -> Vec<u8> {
        // Serializing plain structs of integers and hex strings cannot fail
        serde_json::to_vec(&self.account).unwrap_or_default()
    }
}

/// Operations the scenario core needs from one ledger node
///
/// Errors are plain `anyhow` errors; the harness classifies them by the call
/// that produced them (deploy vs. query).
#[async_trait]
pub trait NodeHandle: Send + Sync {
    /// Submit `payload` as a deploy and propose a block containing it.
    ///
    /// `sender` overrides the node's default signing identity. Execution
    /// failure does not fail this call: the block is still proposed and the
    /// failure shows up in its execution log.
    ///
    /// # Errors
    ///
    /// Returns an error if the deploy is rejected or no block is proposed.
    async fn deploy_and_propose(
        &self,
        payload: &TransferPayload,
        sender: Option<&PublicKey>,
    ) -> Result<DeployReceipt>;

    /// Number of blocks this node has produced or received so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is unreachable.
    async fn current_block_count(&self) -> Result<BlockCount>;

    /// Read global state at `block_hash`.
    ///
    /// # Errors
    ///
    /// Returns an error if the block is unknown, the key is absent, or the
    /// node is unreachable.
    async fn query_state(
        &self,
        block_hash: &BlockHash,
        key_type: KeyType,
        key: &PublicKey,
        path: &str,
    ) -> Result<StateSnapshot>;

    /// Execution log of `block_hash`, in execution order.
    ///
    /// # Errors
    ///
    /// Returns an error if the block is unknown or the node is unreachable.
    async fn block_deploys(&self, block_hash: &BlockHash) -> Result<Vec<DeployRecord>>;
}
