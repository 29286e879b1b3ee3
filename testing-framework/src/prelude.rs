//! Common imports for scenario tests
//!
//! ```rust,ignore
//! use ledger_testing_framework::prelude::*;
//! ```

pub use crate::accounts::{
    fixture_accounts, Account, AccountId, AccountRegistry, StaticAccountRegistry,
    TransferPayload, GENESIS_PUBLIC_KEY,
};
pub use crate::config::WaitConfig;
pub use crate::error::{HarnessError, StepError, StepPhase};
pub use crate::network::{
    wait_for_block_count, AccountState, BlockCount, BlockHash, Convergence, DeployHash,
    DeployReceipt, DeployRecord, ExecutionOutcome, KeyType, NodeHandle, PublicKey,
    SimulatedNode, SimulatedNodeBuilder, StateSnapshot,
};
pub use crate::orchestrator::{
    account_transfer_scenario, Clock, CountingClock, PausedClock, ScenarioOrchestrator,
    ScenarioResult, StepExpectation, StepReceipt, StepRecord, SystemClock, TransferScenario,
    TransferStep, TransferStepExecutor,
};
pub use crate::scenarios::{load_scenario, parse_scenario};

pub use std::sync::Arc;
pub use std::time::Duration;
