//! YAML scenario definitions
//!
//! Transfer scenarios can be written as YAML instead of built in code:
//! - `to` names the account whose transfer contract is deployed
//! - `from` overrides the signing account (default: node identity)
//! - `expect_block_count` is the convergence target for the step
//! - `expect: failure` marks a transfer whose execution must fail
//!
//! ## Example Scenario
//!
//! ```yaml
//! name: "Account transfer"
//! wait:
//!   max_retries: 10
//!   retry_interval_ms: 1000
//! steps:
//!   - to: 1
//!     expect_block_count: 2
//!   - from: 1
//!     to: 2
//!     expect_block_count: 3
//!   - from: 1
//!     to: 2
//!     expect_block_count: 4
//!     expect: failure
//! ```

pub mod parser;

pub use parser::{load_scenario, parse_scenario};
