//! Integration tests for signed command dispatch.
//!
//! Every request goes through `GigEngine::execute`, the way a remote caller
//! would drive the engine: sign a JSON command, submit it, inspect the outcome.

use std::io::Write;
use std::sync::Arc;

use gig_escrow::{
    CommandOutcome, DescriptionPolicy, EngineConfig, ErrorKind, GigCommand, GigEngine, GigId,
    GigState,
};
use gig_ledger::{Amount, CustodyLedger, InMemoryLedger, Wallet};
use tempfile::NamedTempFile;

fn engine_with(config: EngineConfig) -> GigEngine<InMemoryLedger> {
    GigEngine::with_config(Arc::new(InMemoryLedger::new()), config).expect("engine")
}

fn created(outcome: CommandOutcome) -> GigId {
    match outcome {
        CommandOutcome::Created(id) => id,
        other => panic!("expected a created gig, got {other:?}"),
    }
}

#[test]
fn full_lifecycle_over_signed_commands() {
    let engine = engine_with(EngineConfig::default());
    let client = Wallet::generate().expect("client");
    let freelancer = Wallet::generate().expect("freelancer");
    engine
        .ledger()
        .mint(client.address(), Amount::from_units(300))
        .expect("mint");

    let run = |wallet: &Wallet, command: GigCommand| {
        engine.execute(&command.sign(wallet).expect("sign"))
    };

    let id = created(
        run(
            &client,
            GigCommand::Create {
                description: b"write docs".to_vec(),
                price: Amount::from_units(300),
            },
        )
        .expect("create"),
    );
    run(&client, GigCommand::Fund { gig_id: id, amount: Amount::from_units(300) }).expect("fund");
    run(&freelancer, GigCommand::Bid { gig_id: id }).expect("bid");
    run(&client, GigCommand::RaiseDispute { gig_id: id }).expect("dispute");
    run(&freelancer, GigCommand::MarkComplete { gig_id: id }).expect("mark");

    let outcome = run(&client, GigCommand::ResolveDispute { gig_id: id, resolved: true })
        .expect("resolve");
    let CommandOutcome::Settled(settlement) = outcome else {
        panic!("expected settlement");
    };
    assert_eq!(&settlement.recipient, freelancer.address());
    assert_eq!(
        engine.ledger().balance_of(freelancer.address()),
        Amount::from_units(300)
    );

    let err = run(&client, GigCommand::ResolveDispute { gig_id: id, resolved: true })
        .expect_err("already resolved");
    assert_eq!(err.kind(), ErrorKind::AlreadyResolved);
}

#[test]
fn payload_built_by_hand_is_accepted() {
    let engine = engine_with(EngineConfig::default());
    let client = Wallet::generate().expect("client");
    let payload = serde_json::json!({
        "op": "create",
        "description": [104, 105],
        "price": 5,
    });
    let request = client.sign_request(serde_json::to_vec(&payload).expect("encode"));

    let id = created(engine.execute(&request).expect("create"));
    let view = engine.get(id).expect("get");
    assert_eq!(view.description, b"hi".to_vec());
    assert_eq!(view.price, Amount::from_units(5));
}

#[test]
fn forged_signature_is_rejected() {
    let engine = engine_with(EngineConfig::default());
    let client = Wallet::generate().expect("client");
    let mallory = Wallet::generate().expect("mallory");

    let mut request = GigCommand::Create {
        description: Vec::new(),
        price: Amount::ZERO,
    }
    .sign(&mallory)
    .expect("sign");
    request.sender = client.address().clone();

    let err = engine.execute(&request).expect_err("forged");
    assert_eq!(err.kind(), ErrorKind::Ledger);
    assert!(engine.is_empty());
}

#[test]
fn stale_nonce_is_rejected() {
    let engine = engine_with(EngineConfig::default());
    let client = Wallet::generate().expect("client");
    let command = GigCommand::Create {
        description: Vec::new(),
        price: Amount::ZERO,
    };
    let payload = command.to_payload().expect("encode");

    engine
        .execute(&client.sign_request_with_nonce(payload.clone(), 10))
        .expect("nonce 10");
    let err = engine
        .execute(&client.sign_request_with_nonce(payload, 9))
        .expect_err("nonce 9");
    assert_eq!(err.kind(), ErrorKind::Ledger);
    assert_eq!(engine.len(), 1);
}

#[test]
fn config_file_controls_description_policy() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "description_policy = \"anytime\"").expect("write");
    writeln!(file, "max_description_len = 8").expect("write");
    let config = EngineConfig::from_file(file.path()).expect("load config");
    assert_eq!(config.description_policy, DescriptionPolicy::Anytime);

    let engine = engine_with(config);
    let client = Wallet::generate().expect("client");
    let freelancer = Wallet::generate().expect("freelancer");
    let run = |wallet: &Wallet, command: GigCommand| {
        engine.execute(&command.sign(wallet).expect("sign"))
    };

    let id = created(
        run(&client, GigCommand::Create { description: b"v1".to_vec(), price: Amount::ZERO })
            .expect("create"),
    );
    run(&freelancer, GigCommand::Bid { gig_id: id }).expect("bid");
    let outcome = run(
        &client,
        GigCommand::UpdateDescription { gig_id: id, description: b"v2".to_vec() },
    )
    .expect("update while assigned");
    assert!(matches!(outcome, CommandOutcome::Updated(ref v) if v.description == b"v2".to_vec()));

    let err = run(
        &client,
        GigCommand::UpdateDescription { gig_id: id, description: b"way too long".to_vec() },
    )
    .expect_err("too long");
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(matches!(
        engine.get(id).expect("get").state,
        GigState::Assigned { .. }
    ));
}
