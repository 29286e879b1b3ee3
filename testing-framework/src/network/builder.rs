//! SimulatedNodeBuilder - Fluent API for configuring SimulatedNode instances

use super::simulated_node::SimulatedNode;
use crate::accounts::GENESIS_PUBLIC_KEY;
use crate::network::PublicKey;
use crate::orchestrator::{Clock, SystemClock};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::Duration;

/// Genesis balance of the default identity
pub const DEFAULT_GENESIS_BALANCE: u64 = 1_000_000_000;

/// Builder for SimulatedNode instances with fluent API
///
/// # Example
///
/// ```rust
/// # use ledger_testing_framework::prelude::*;
/// # tokio_test::block_on(async {
/// let alice = PublicKey::new([0x01; 32]);
/// let node = SimulatedNodeBuilder::new()
///     .with_funded_account(alice.clone(), 150)
///     .build();
///
/// let registry = fixture_accounts();
/// let payload = &registry.lookup(AccountId(2)).unwrap().transfer_payload;
/// node.deploy_and_propose(payload, Some(&alice)).await.unwrap();
///
/// // No propagation delay: counted as soon as it is proposed
/// assert_eq!(node.current_block_count().await.unwrap(), 2);
///
/// // 175 exceeds alice's balance, so the block records a failed execution
/// assert_eq!(node.latest_balance(&alice), Some(150));
/// # });
/// ```
pub struct SimulatedNodeBuilder {
    /// Clock implementation for propagation timing
    clock: Option<Arc<dyn Clock>>,

    /// Signs deploys without a sender override
    default_identity: PublicKey,

    /// Genesis balance of the default identity
    default_balance: u64,

    /// Additional funded accounts (address, balance)
    funded_accounts: Vec<(PublicKey, u64)>,

    /// Delay before a sealed block is counted
    propagation_delay: Duration,
}

impl SimulatedNodeBuilder {
    /// Create new builder with defaults
    ///
    /// Default configuration:
    /// - SystemClock (real time)
    /// - default identity `3030…30` funded with `DEFAULT_GENESIS_BALANCE`
    /// - blocks visible immediately
    pub fn new() -> Self {
        Self {
            clock: None,
            default_identity: GENESIS_PUBLIC_KEY,
            default_balance: DEFAULT_GENESIS_BALANCE,
            funded_accounts: Vec::new(),
            propagation_delay: Duration::ZERO,
        }
    }

    /// Set clock implementation
    ///
    /// If not set, uses `SystemClock` by default.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replace the default identity and its genesis balance
    pub fn with_default_identity(mut self, key: PublicKey, balance: u64) -> Self {
        self.default_identity = key;
        self.default_balance = balance;
        self
    }

    /// Fund an account at genesis
    ///
    /// Later entries for the same key override earlier ones, including the
    /// default identity.
    pub fn with_funded_account(mut self, key: PublicKey, balance: u64) -> Self {
        self.funded_accounts.push((key, balance));
        self
    }

    /// Delay between sealing a block and counting it
    pub fn with_propagation_delay(mut self, delay: Duration) -> Self {
        self.propagation_delay = delay;
        self
    }

    /// Build the SimulatedNode instance
    pub fn build(self) -> SimulatedNode {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let mut balances = BTreeMap::new();
        balances.insert(self.default_identity.clone(), self.default_balance);
        for (key, balance) in self.funded_accounts {
            balances.insert(key, balance);
        }

        SimulatedNode::new(
            balances,
            self.default_identity,
            self.propagation_delay,
            clock,
        )
    }
}

impl Default for SimulatedNodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
