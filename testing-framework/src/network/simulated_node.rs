//! SimulatedNode - In-process ledger node for exercising transfer scenarios
//!
//! Executes transfer payloads against an account-balance ledger, seals one
//! block per deploy and makes each block visible only after a propagation
//! delay measured on the injected clock.

use crate::accounts::TransferPayload;
use crate::network::{
    AccountState, BlockCount, BlockHash, DeployHash, DeployReceipt, DeployRecord,
    ExecutionOutcome, KeyType, NodeHandle, PublicKey, StateSnapshot,
};
use crate::orchestrator::Clock;
use crate::types::HASH_SIZE;
use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use sha3::{Digest, Sha3_256};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

/// Block with the post-state it produced
struct SealedBlock {
    hash: BlockHash,
    visible_at: Instant,
    deploys: Vec<DeployRecord>,
    balances: BTreeMap<PublicKey, u64>,
}

struct LedgerState {
    /// Genesis first, in proposal order
    blocks: Vec<SealedBlock>,
    is_running: bool,
    pending_rejection: Option<String>,
    deploys_submitted: u64,
}

/// In-process ledger node implementing `NodeHandle`
///
/// # Example
///
/// ```rust,ignore
/// use ledger_testing_framework::network::SimulatedNodeBuilder;
///
/// let node = SimulatedNodeBuilder::new()
///     .with_clock(clock)
///     .with_funded_account(alice, 150)
///     .with_propagation_delay(Duration::from_millis(500))
///     .build();
///
/// let receipt = node.deploy_and_propose(&payload, Some(&alice)).await?;
///
/// // Not counted until the delay has elapsed
/// assert_eq!(node.current_block_count().await?, 1);
/// ```
pub struct SimulatedNode {
    state: Mutex<LedgerState>,

    /// Injected clock for propagation timing
    clock: Arc<dyn Clock>,

    /// Signs deploys submitted without a sender override
    default_identity: PublicKey,

    /// Time between sealing a block and the node counting it
    propagation_delay: Duration,
}

impl SimulatedNode {
    /// Create a node from its genesis balances
    ///
    /// This is an internal constructor. Use `SimulatedNodeBuilder` instead.
    pub(crate) fn new(
        genesis_balances: BTreeMap<PublicKey, u64>,
        default_identity: PublicKey,
        propagation_delay: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let genesis = SealedBlock {
            hash: genesis_hash(&genesis_balances),
            visible_at: clock.now(),
            deploys: Vec::new(),
            balances: genesis_balances,
        };

        Self {
            state: Mutex::new(LedgerState {
                blocks: vec![genesis],
                is_running: true,
                pending_rejection: None,
                deploys_submitted: 0,
            }),
            clock,
            default_identity,
            propagation_delay,
        }
    }

    // ========================================================================
    // Inspection (for test assertions)
    // ========================================================================

    /// Identity used when no sender override is given
    pub fn default_identity(&self) -> &PublicKey {
        &self.default_identity
    }

    /// Hash of the genesis block
    pub fn genesis_hash(&self) -> BlockHash {
        self.state.lock().blocks[0].hash.clone()
    }

    /// Blocks sealed so far, including ones not yet visible
    pub fn produced_block_count(&self) -> BlockCount {
        self.state.lock().blocks.len() as BlockCount
    }

    /// Balance after the latest sealed block, visible or not
    pub fn latest_balance(&self, key: &PublicKey) -> Option<u64> {
        let state = self.state.lock();
        state
            .blocks
            .last()
            .and_then(|block| block.balances.get(key).copied())
    }

    // ========================================================================
    // Lifecycle and fault injection
    // ========================================================================

    /// Check if the node is currently running
    pub fn is_running(&self) -> bool {
        self.state.lock().is_running
    }

    /// Make every call fail until `start()`
    pub fn stop(&self) {
        self.state.lock().is_running = false;
    }

    /// Resume serving calls
    pub fn start(&self) {
        self.state.lock().is_running = true;
    }

    /// Reject the next submitted deploy with `reason`
    pub fn reject_next_deploy(&self, reason: impl Into<String>) {
        self.state.lock().pending_rejection = Some(reason.into());
    }

    fn visible_block<'a>(&self, state: &'a LedgerState, hash: &BlockHash) -> Result<&'a SealedBlock> {
        let now = self.clock.now();
        match state.blocks.iter().find(|block| &block.hash == hash) {
            Some(block) if block.visible_at <= now => Ok(block),
            _ => bail!("Block {} not found", hash),
        }
    }
}

fn ensure_running(state: &LedgerState) -> Result<()> {
    if !state.is_running {
        bail!("Node is not running");
    }
    Ok(())
}

fn genesis_hash(balances: &BTreeMap<PublicKey, u64>) -> BlockHash {
    let mut hasher = Sha3_256::new();
    hasher.update(b"genesis");
    for (key, balance) in balances {
        hasher.update(key.as_bytes());
        hasher.update(balance.to_le_bytes());
    }
    let digest: [u8; HASH_SIZE] = hasher.finalize().into();
    BlockHash::new(digest)
}

fn deploy_hash(sequence: u64, sender: &PublicKey, payload: &TransferPayload) -> DeployHash {
    let mut hasher = Sha3_256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(sender.as_bytes());
    hasher.update(payload.contract.as_bytes());
    hasher.update(payload.recipient.as_bytes());
    hasher.update(payload.amount.to_le_bytes());
    let digest: [u8; HASH_SIZE] = hasher.finalize().into();
    DeployHash::new(digest)
}

fn block_hash(parent: &BlockHash, height: u64, deploy: &DeployHash) -> BlockHash {
    let mut hasher = Sha3_256::new();
    hasher.update(parent.as_bytes());
    hasher.update(height.to_le_bytes());
    hasher.update(deploy.as_bytes());
    let digest: [u8; HASH_SIZE] = hasher.finalize().into();
    BlockHash::new(digest)
}

/// Apply a transfer to `balances`; on failure leave them untouched
fn execute_transfer(
    balances: &mut BTreeMap<PublicKey, u64>,
    sender: &PublicKey,
    payload: &TransferPayload,
) -> ExecutionOutcome {
    let available = balances.get(sender).copied().unwrap_or(0);
    if available < payload.amount {
        return ExecutionOutcome::Failure {
            reason: format!(
                "Insufficient funds: balance {} is below transfer amount {}",
                available, payload.amount
            ),
        };
    }

    balances.insert(sender.clone(), available - payload.amount);
    let credited = balances.entry(payload.recipient.clone()).or_insert(0);
    *credited = credited.saturating_add(payload.amount);
    ExecutionOutcome::Success
}

#[async_trait]
impl NodeHandle for SimulatedNode {
    async fn deploy_and_propose(
        &self,
        payload: &TransferPayload,
        sender: Option<&PublicKey>,
    ) -> Result<DeployReceipt> {
        let mut state = self.state.lock();
        ensure_running(&state)?;

        if let Some(reason) = state.pending_rejection.take() {
            bail!("Deploy rejected: {}", reason);
        }
        if payload.amount == 0 {
            bail!("Deploy rejected: transfer amount must be positive");
        }

        let sender = sender.unwrap_or(&self.default_identity).clone();
        state.deploys_submitted += 1;
        let deploy = deploy_hash(state.deploys_submitted, &sender, payload);

        let (parent_hash, mut balances) = match state.blocks.last() {
            Some(parent) => (parent.hash.clone(), parent.balances.clone()),
            None => bail!("Node has no genesis block"),
        };
        let outcome = execute_transfer(&mut balances, &sender, payload);
        let height = state.blocks.len() as u64;
        let hash = block_hash(&parent_hash, height, &deploy);

        log::info!(
            "Proposed block {} at height {} ({} from {} -> {}: {:?})",
            hash.short(),
            height,
            payload.amount,
            sender.short(),
            payload.recipient.short(),
            outcome
        );

        state.blocks.push(SealedBlock {
            hash: hash.clone(),
            visible_at: self.clock.now() + self.propagation_delay,
            deploys: vec![DeployRecord {
                deploy_hash: deploy.clone(),
                sender,
                payload: payload.clone(),
                outcome,
            }],
            balances,
        });

        Ok(DeployReceipt {
            deploy_hash: deploy,
            block_hash: hash,
        })
    }

    async fn current_block_count(&self) -> Result<BlockCount> {
        let state = self.state.lock();
        ensure_running(&state)?;

        let now = self.clock.now();
        let visible = state
            .blocks
            .iter()
            .take_while(|block| block.visible_at <= now)
            .count();
        Ok(visible as BlockCount)
    }

    async fn query_state(
        &self,
        block_hash: &BlockHash,
        key_type: KeyType,
        key: &PublicKey,
        path: &str,
    ) -> Result<StateSnapshot> {
        let state = self.state.lock();
        ensure_running(&state)?;

        if key_type != KeyType::Address {
            bail!("Unsupported key type '{}'", key_type);
        }
        if !path.is_empty() {
            bail!("Path '{}' not found under {}", path, key);
        }

        let block = self.visible_block(&state, block_hash)?;
        let account = block.balances.get(key).map(|balance| AccountState {
            public_key: key.clone(),
            balance: *balance,
        });

        Ok(StateSnapshot {
            block_hash: block_hash.clone(),
            key_type,
            key: key.clone(),
            path: path.to_string(),
            account,
        })
    }

    async fn block_deploys(&self, block_hash: &BlockHash) -> Result<Vec<DeployRecord>> {
        let state = self.state.lock();
        ensure_running(&state)?;

        let block = self.visible_block(&state, block_hash)?;
        Ok(block.deploys.clone())
    }
}
