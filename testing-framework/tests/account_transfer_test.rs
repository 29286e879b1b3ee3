// Integration test for the single-node account transfer scenario
//
// 3030…30 -> 0101…01: 100, then 0101…01 -> 0202…02: 175 twice. The second
// 175 transfer cannot be funded and must leave both accounts unchanged.

use ledger_testing_framework::prelude::*;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn account_1() -> PublicKey {
    PublicKey::new([0x01; 32])
}

fn account_2() -> PublicKey {
    PublicKey::new([0x02; 32])
}

fn transfer_node(clock: Arc<PausedClock>, delay: Duration) -> SimulatedNode {
    SimulatedNodeBuilder::new()
        .with_clock(clock)
        .with_funded_account(account_1(), 150)
        .with_propagation_delay(delay)
        .build()
}

fn bundled_scenario() -> TransferScenario {
    load_scenario(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/scenarios/account_transfer.yaml"
    ))
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_account_transfer_scenario() {
    init_logger();
    let clock = Arc::new(PausedClock::new());
    let node = transfer_node(clock.clone(), Duration::from_millis(2_500));
    let start = clock.now();

    let result = ScenarioOrchestrator::new(clock.clone())
        .run(&node, &fixture_accounts(), &bundled_scenario())
        .await
        .unwrap();
    result.print();

    assert_eq!(result.name, "Account transfer");
    assert_eq!(result.steps.len(), 3);

    // 0101…01 after each step
    assert_eq!(result.balance_after(1, &account_1()), Some(250));
    assert_eq!(result.balance_after(2, &account_1()), Some(75));
    assert_eq!(result.balance_after(3, &account_1()), Some(75));
    assert_eq!(result.balance_after(2, &account_2()), Some(175));
    assert_eq!(result.balance_after(3, &account_2()), Some(175));
    assert_eq!(
        result.balance_after(1, &GENESIS_PUBLIC_KEY),
        Some(1_000_000_000 - 100)
    );

    assert!(result.steps[0].outcome.is_success());
    assert!(result.steps[1].outcome.is_success());
    assert!(matches!(
        &result.steps[2].outcome,
        ExecutionOutcome::Failure { reason } if reason.contains("Insufficient funds")
    ));

    // Each block is counted on the 4th observation, one second apart
    for record in &result.steps {
        assert_eq!(record.convergence.attempts, 4);
    }
    assert_eq!(
        result
            .steps
            .iter()
            .map(|s| s.convergence.observed_count)
            .collect::<Vec<_>>(),
        vec![2, 3, 4]
    );
    assert_eq!(clock.now() - start, Duration::from_secs(9));

    let hashes = result.block_hashes();
    assert_ne!(hashes[0], hashes[1]);
    assert_ne!(hashes[1], hashes[2]);
}

#[tokio::test(start_paused = true)]
async fn test_transfers_are_listed_in_execution_log() {
    init_logger();
    let clock = Arc::new(PausedClock::new());
    let node = transfer_node(clock.clone(), Duration::from_millis(500));

    let result = ScenarioOrchestrator::new(clock)
        .run(&node, &fixture_accounts(), &account_transfer_scenario())
        .await
        .unwrap();

    for record in &result.steps {
        let deploys = node.block_deploys(&record.block_hash).await.unwrap();
        assert_eq!(deploys.len(), 1);
        assert_eq!(deploys[0].deploy_hash, record.deploy_hash);
        assert_eq!(deploys[0].outcome, record.outcome);
    }

    let first = &node.block_deploys(&result.steps[0].block_hash).await.unwrap()[0];
    assert_eq!(first.sender, GENESIS_PUBLIC_KEY);
    assert_eq!(first.payload.recipient, account_1());
    assert_eq!(first.payload.amount, 100);

    let third = &node.block_deploys(&result.steps[2].block_hash).await.unwrap()[0];
    assert_eq!(third.sender, account_1());
    assert_eq!(third.payload.amount, 175);
}

#[tokio::test(start_paused = true)]
async fn test_failed_transfer_leaves_state_byte_identical() {
    init_logger();
    let clock = Arc::new(PausedClock::new());
    let node = transfer_node(clock.clone(), Duration::from_millis(500));

    let result = ScenarioOrchestrator::new(clock)
        .run(&node, &fixture_accounts(), &account_transfer_scenario())
        .await
        .unwrap();

    let before = &result.steps[1];
    let after = &result.steps[2];
    for key in [account_1(), account_2()] {
        assert_eq!(
            before.snapshot(&key).unwrap().value_bytes(),
            after.snapshot(&key).unwrap().value_bytes()
        );
    }
    assert_eq!(node.latest_balance(&account_1()), Some(75));
}

#[tokio::test(start_paused = true)]
async fn test_state_is_only_queryable_after_convergence() {
    init_logger();
    let clock = Arc::new(PausedClock::new());
    let node = transfer_node(clock.clone(), Duration::from_millis(800));
    let registry = fixture_accounts();
    let payload = &registry.lookup(AccountId(1)).unwrap().transfer_payload;

    let receipt = node.deploy_and_propose(payload, None).await.unwrap();

    // Accepted but not yet counted
    assert_eq!(node.current_block_count().await.unwrap(), 1);
    assert!(node
        .query_state(&receipt.block_hash, KeyType::Address, &account_1(), "")
        .await
        .is_err());

    let config = WaitConfig::new(5, Duration::from_millis(250));
    let convergence = wait_for_block_count(&node, clock.as_ref(), 2, &config)
        .await
        .unwrap();
    assert_eq!(convergence.attempts, 5);

    let snapshot = node
        .query_state(&receipt.block_hash, KeyType::Address, &account_1(), "")
        .await
        .unwrap();
    assert_eq!(snapshot.block_hash, receipt.block_hash);
    assert_eq!(snapshot.balance(), Some(250));
}

#[tokio::test(start_paused = true)]
async fn test_yaml_scenario_with_custom_wait() {
    init_logger();
    let clock = Arc::new(PausedClock::new());
    let node = transfer_node(clock.clone(), Duration::from_millis(150));

    let scenario = parse_scenario(
        r#"
name: "Two transfers"
wait:
  max_retries: 3
  retry_interval_ms: 100
steps:
  - to: 1
    expect_block_count: 2
  - from: 1
    to: 2
    expect_block_count: 3
"#,
    )
    .unwrap();

    let result = ScenarioOrchestrator::new(clock)
        .run(&node, &fixture_accounts(), &scenario)
        .await
        .unwrap();

    assert_eq!(result.steps.len(), 2);
    assert_eq!(result.balance_after(2, &account_2()), Some(175));
    assert_eq!(result.steps[0].convergence.attempts, 3);
}
