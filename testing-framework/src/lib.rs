//! # Ledger Testing Framework
//!
//! Deterministic orchestration of account transfers against a ledger node.
//!
//! ## Architecture Overview
//!
//! - **network**: the `NodeHandle` interface, the block-count convergence
//!   waiter, and `SimulatedNode`, an in-process node for tests
//! - **accounts**: `AccountRegistry` and the fixture accounts
//! - **orchestrator**: clocks, the single-step executor, and the scenario
//!   orchestrator
//! - **scenarios**: YAML scenario definitions
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ledger_testing_framework::prelude::*;
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_account_transfer() {
//!     let clock = Arc::new(PausedClock::new());
//!     let node = SimulatedNodeBuilder::new()
//!         .with_clock(clock.clone())
//!         .with_funded_account(PublicKey::new([0x01; 32]), 150)
//!         .build();
//!
//!     let result = ScenarioOrchestrator::new(clock)
//!         .run(&node, &fixture_accounts(), &account_transfer_scenario())
//!         .await
//!         .unwrap();
//!
//!     assert_eq!(result.steps.len(), 3);
//! }
//! ```
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: every sleep goes through a `Clock`
//! 2. **Causal**: state is only queried at blocks the node has counted
//! 3. **Sequential**: a step starts after the previous step's block is seen

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Fixture accounts and the account registry interface
pub mod accounts;

/// Wait budget configuration
pub mod config;

/// Harness error types
pub mod error;

/// Node interface, convergence waiter and simulated node
pub mod network;

/// Clock, step executor and scenario orchestrator
pub mod orchestrator;

// DSL scenario parser
pub mod scenarios;

/// Hash and key identifiers
pub mod types;

// Convenient re-exports for common usage
pub mod prelude;

// Re-export commonly used types at crate root
pub use error::{HarnessError, StepError, StepPhase};
pub use network::{wait_for_block_count, NodeHandle, SimulatedNode, SimulatedNodeBuilder};
pub use orchestrator::{Clock, PausedClock, ScenarioOrchestrator, SystemClock};

/// Framework version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
