//! End-to-end lifecycle: compile, create, setup, opt-in, supply

use amm_orchestrator::{
    amm::{SETUP_ARG, SUPPLY_ARG},
    types::TransactionKind,
    Address, AmmParams, ContractPrograms, Error, FundingPolicy, Orchestrator, PoolAssets,
};
use amm_orchestrator_integration_tests::*;
use solana_sdk::signature::Keypair;

const TOKEN_A: u64 = 1_001;
const TOKEN_B: u64 = 1_002;
const POOL_TOKEN: u64 = 1_003;

fn params() -> AmmParams {
    AmmParams {
        token_a: TOKEN_A,
        token_b: TOKEN_B,
        fee_bps: 30,
        min_increment: 1_000,
    }
}

#[test]
fn test_full_deployment_and_supply() {
    let node = initialized_pool_node(TOKEN_A, TOKEN_B, POOL_TOKEN);
    let creator = Keypair::new();
    let supplier = Keypair::new();
    let orchestrator = Orchestrator::new(&node);

    let programs = ContractPrograms::compile(&node, APPROVAL_SOURCE, CLEAR_SOURCE, 6).unwrap();
    assert!(node
        .compiled_sources()
        .iter()
        .all(|src| src.starts_with("#pragma version 6\n")));

    let app_id = orchestrator.create_app(&programs, &params(), &creator).unwrap();
    assert_eq!(app_id, MockNode::APP_ID);

    let pool_token = orchestrator
        .setup_app(app_id, TOKEN_A, TOKEN_B, &creator)
        .unwrap();
    assert_eq!(pool_token, POOL_TOKEN);

    orchestrator
        .opt_in_to_pool_token(&supplier, pool_token)
        .unwrap();

    let assets = PoolAssets {
        token_a: TOKEN_A,
        token_b: TOKEN_B,
        pool_token,
    };
    let confirmed = orchestrator
        .supply(app_id, 50_000, 100_000, &assets, &supplier)
        .unwrap();
    assert!(confirmed.is_confirmed());

    // create, setup group, opt-in, supply group
    let submitted = node.submitted();
    let sizes: Vec<usize> = submitted.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![1, 2, 1, 4]);

    for batch in &submitted {
        let group = batch[0].txn.group;
        assert!(batch.iter().all(|stx| stx.txn.group == group));
        assert!(batch.iter().all(|stx| stx.verify()));
        // {sig, txn} msgpack map per member
        assert!(batch.iter().all(|stx| stx.to_bytes().unwrap()[0] == 0x82));
    }

    let setup = &submitted[1];
    assert!(setup.iter().all(|stx| stx.txn.sender == Address::of(&creator)));
    let funding = FundingPolicy::default().amount();
    assert!(matches!(
        setup[0].txn.kind,
        TransactionKind::Payment { amount, .. } if amount == funding
    ));
    match &setup[1].txn.kind {
        TransactionKind::ApplicationCall(call) => {
            assert_eq!(call.app_args, vec![SETUP_ARG.to_vec()])
        }
        other => panic!("expected setup call, got {other:?}"),
    }

    let supply = &submitted[3];
    assert!(supply.iter().all(|stx| stx.txn.sender == Address::of(&supplier)));
    match &supply[3].txn.kind {
        TransactionKind::ApplicationCall(call) => {
            assert_eq!(call.app_args, vec![SUPPLY_ARG.to_vec()]);
            assert_eq!(call.foreign_assets, vec![TOKEN_A, TOKEN_B, POOL_TOKEN]);
        }
        other => panic!("expected supply call, got {other:?}"),
    }
}

#[test]
fn test_supply_discovers_assets_from_global_state() {
    let node = initialized_pool_node(TOKEN_A, TOKEN_B, POOL_TOKEN);
    let supplier = Keypair::new();

    let state = Orchestrator::new(&node).pool_state(MockNode::APP_ID).unwrap();
    assert_eq!(state.pool_token, POOL_TOKEN);

    Orchestrator::new(&node)
        .supply_to_pool(MockNode::APP_ID, 10, 10, &supplier)
        .unwrap();

    let batch = &node.submitted()[0];
    assert!(matches!(
        batch[1].txn.kind,
        TransactionKind::AssetTransfer { asset_id: TOKEN_A, amount: 10, .. }
    ));
    assert!(matches!(
        batch[2].txn.kind,
        TransactionKind::AssetTransfer { asset_id: TOKEN_B, amount: 10, .. }
    ));
}

#[test]
fn test_rejected_setup_stops_the_flow() {
    let node = MockNode::new().reject_with("underflow on subtracting 403000 from sender amount 0");
    let funder = Keypair::new();

    let err = Orchestrator::new(&node)
        .setup_app(MockNode::APP_ID, TOKEN_A, TOKEN_B, &funder)
        .unwrap_err();

    match err {
        Error::PoolRejected { reason, .. } => assert!(reason.starts_with("underflow")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(node.submitted().len(), 1);
}

#[test]
fn test_slow_confirmation_within_budget() {
    let node = initialized_pool_node(TOKEN_A, TOKEN_B, POOL_TOKEN).confirm_on_poll(4);
    let supplier = Keypair::new();

    Orchestrator::new(&node)
        .with_timeout_rounds(5)
        .supply_to_pool(MockNode::APP_ID, 1, 1, &supplier)
        .unwrap();

    assert_eq!(node.current_round(), MockNode::START_ROUND + 3);
}

#[test]
fn test_slow_confirmation_beyond_budget_times_out() {
    let node = initialized_pool_node(TOKEN_A, TOKEN_B, POOL_TOKEN).confirm_on_poll(4);
    let supplier = Keypair::new();

    let err = Orchestrator::new(&node)
        .with_timeout_rounds(3)
        .supply_to_pool(MockNode::APP_ID, 1, 1, &supplier)
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { rounds: 3, .. }));
}
