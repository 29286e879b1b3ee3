//! YAML scenario parser
//!
//! Turns a scenario document into a validated `TransferScenario`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::accounts::AccountId;
use crate::config::WaitConfig;
use crate::network::{BlockCount, PublicKey};
use crate::orchestrator::{StepExpectation, TransferScenario, TransferStep};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioDoc {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    default_sender: Option<PublicKey>,
    #[serde(default)]
    wait: Option<WaitConfig>,
    steps: Vec<StepDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StepDoc {
    #[serde(default)]
    from: Option<AccountId>,
    to: AccountId,
    expect_block_count: BlockCount,
    #[serde(default)]
    expect: StepExpectation,
}

/// Parse a YAML scenario
///
/// Without a `wait` section the scenario uses
/// `WaitConfig::from_env_or_default()`.
///
/// # Errors
///
/// Returns an error if the YAML is malformed, has no steps, or a step's
/// `expect_block_count` is zero or not above the previous step's. Every
/// step seals one block, so a repeated target would let a step pass its
/// wait before its own block is counted.
pub fn parse_scenario(yaml: &str) -> Result<TransferScenario> {
    let doc: ScenarioDoc = serde_yaml::from_str(yaml).context("Invalid scenario YAML")?;

    if doc.steps.is_empty() {
        bail!("Scenario '{}' has no steps", doc.name);
    }

    let mut scenario = TransferScenario::new(doc.name);
    if let Some(description) = doc.description {
        scenario = scenario.with_description(description);
    }
    if let Some(sender) = doc.default_sender {
        scenario = scenario.with_default_sender(sender);
    }
    if let Some(wait) = doc.wait {
        scenario = scenario.with_wait(wait);
    }

    let mut previous_target = 0;
    for (idx, step) in doc.steps.into_iter().enumerate() {
        if step.expect_block_count == 0 {
            bail!("Step {}: expect_block_count must be at least 1", idx + 1);
        }
        if step.expect_block_count <= previous_target {
            bail!(
                "Step {}: expect_block_count {} must be above the previous step's {}",
                idx + 1,
                step.expect_block_count,
                previous_target
            );
        }
        previous_target = step.expect_block_count;

        let mut transfer = TransferStep::new(step.to, step.expect_block_count);
        transfer.sender = step.from;
        transfer.expect = step.expect;
        scenario = scenario.with_step(transfer);
    }

    Ok(scenario)
}

/// Read and parse a YAML scenario file
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails `parse_scenario`.
pub fn load_scenario(path: impl AsRef<Path>) -> Result<TransferScenario> {
    let path = path.as_ref();
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario {}", path.display()))?;
    parse_scenario(&yaml).with_context(|| format!("Failed to parse scenario {}", path.display()))
}
