//! Ledger integration tests
//!
//! Tests the tamper-detection cycle and the authenticated TCP session,
//! the two things that have to hold for the ledger to be trustworthy.

use sealchain::network::protocol::CommandEnvelope;
use sealchain::{
    Authenticator, Command, CommandDispatcher, KeyPair, Ledger, LedgerClient, LedgerError,
    LedgerView, Server, SessionEnd,
};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

const TEST_KEY_BITS: u64 = 192;

fn test_keys() -> KeyPair {
    KeyPair::generate(TEST_KEY_BITS, 20).unwrap()
}

/// Serve exactly one session on an ephemeral port, handing the server back
/// afterwards so the test can inspect the ledger.
fn spawn_single_session_server(
    genesis_difficulty: u32,
) -> (String, thread::JoinHandle<(Server, SessionEnd)>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let ledger = Ledger::new(genesis_difficulty).unwrap();
    let mut server = Server::new(
        ledger,
        CommandDispatcher::new(None, Duration::from_millis(10)),
    );

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let end = server.handle_connection(stream).unwrap();
        (server, end)
    });
    (addr, handle)
}

#[test]
fn test_tamper_and_repair_cycle() {
    let mut ledger = Ledger::new(2).unwrap();
    ledger.append("A pays B 10", 3).unwrap();
    assert!(ledger.is_valid());

    let original_nonce = ledger.get_block(1).unwrap().get_nonce();
    let mut tampered = "A pays B 10000".to_string();
    ledger.corrupt(1, &tampered).unwrap();
    // A one-in-4096 chance leaves the new payload sealed; nudge it until not
    while ledger.get_block(1).unwrap().is_sealed() {
        tampered.push('0');
        ledger.corrupt(1, &tampered).unwrap();
    }
    assert!(!ledger.is_valid());

    ledger.repair().unwrap();
    assert!(ledger.is_valid());

    let repaired = ledger.get_block(1).unwrap();
    assert_eq!(repaired.get_payload(), tampered);
    assert_ne!(repaired.get_nonce(), original_nonce);
    assert_eq!(repaired.get_difficulty(), 3);
    assert_eq!(ledger.get_chain_hash(), repaired.calculate_hash());
}

#[test]
fn test_identity_checked_before_signature() {
    let x = test_keys();
    let y = test_keys();

    let mut envelope = CommandEnvelope::signed(&x, &Command::Status).unwrap();
    envelope.identity = y.identity();

    assert_eq!(
        Authenticator::authenticate(&envelope),
        Err(LedgerError::IdentityMismatch)
    );
}

#[test]
fn test_remote_session_end_to_end() {
    let (addr, handle) = spawn_single_session_server(1);
    let mut client = LedgerClient::connect(&addr, test_keys()).unwrap();

    let appended = client
        .send(&Command::Append {
            difficulty: 2,
            payload: "A pays B 10".to_string(),
        })
        .unwrap();
    assert!(appended.contains("Block 1 added"));

    let verdict = client.send(&Command::Validate).unwrap();
    assert!(verdict.contains("Chain verification: true"));

    client
        .send(&Command::Corrupt {
            block_index: 1,
            new_payload: "A pays B 10000".to_string(),
        })
        .unwrap();
    client.send(&Command::Repair).unwrap();
    let verdict = client.send(&Command::Validate).unwrap();
    assert!(verdict.contains("Chain verification: true"));

    let view: LedgerView = serde_json::from_str(&client.send(&Command::View).unwrap()).unwrap();
    assert_eq!(view.entries.len(), 2);
    assert_eq!(view.entries[1].get_payload(), "A pays B 10000");

    let status = client.send(&Command::Status).unwrap();
    assert!(status.contains("Current size of chain: 2"));
    assert!(status.contains(&format!("Chain hash: {}", view.chain_hash)));

    client.close().unwrap();
    let (server, end) = handle.join().unwrap();
    assert_eq!(end, SessionEnd::ClientExit);
    assert!(server.ledger().is_valid());
}

#[test]
fn test_rejected_commands_keep_session_and_ledger() {
    let (addr, handle) = spawn_single_session_server(1);
    let keys = test_keys();
    let imposter = test_keys();
    let mut client = LedgerClient::connect(&addr, keys.clone()).unwrap();

    // Signed by `keys` but claiming the imposter's identity
    let mut forged = CommandEnvelope::signed(
        &keys,
        &Command::Corrupt {
            block_index: 0,
            new_payload: "forged".to_string(),
        },
    )
    .unwrap();
    forged.identity = imposter.identity();
    let response = client.send_envelope(&forged).unwrap().unwrap();
    assert_eq!(response.error, Some(LedgerError::IdentityMismatch.to_string()));

    // Correct identity, altered after signing
    let mut tampered = CommandEnvelope::signed(
        &keys,
        &Command::Corrupt {
            block_index: 0,
            new_payload: "honest".to_string(),
        },
    )
    .unwrap();
    tampered.new_payload = Some("forged".to_string());
    let response = client.send_envelope(&tampered).unwrap().unwrap();
    assert_eq!(response.error, Some(LedgerError::SignatureMismatch.to_string()));

    // Out of range is reported but does not end the session
    let err = client
        .send(&Command::Corrupt {
            block_index: 42,
            new_payload: "x".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, LedgerError::Rejected(_)));

    let verdict = client.send(&Command::Validate).unwrap();
    assert!(verdict.contains("Chain verification: true"));
    client.close().unwrap();

    let (server, _) = handle.join().unwrap();
    assert_eq!(server.ledger().get_latest_block().get_payload(), "Genesis");
}

#[test]
fn test_unknown_option_ends_session() {
    let (addr, handle) = spawn_single_session_server(1);
    let keys = test_keys();
    let mut client = LedgerClient::connect(&addr, keys.clone()).unwrap();

    // Re-sign by hand so the envelope authenticates with option 9
    let mut envelope = CommandEnvelope::signed(&keys, &Command::Status).unwrap();
    envelope.option = 9;
    let message = sealchain::auth::signing_message(
        &envelope.identity,
        &keys.public_key_text(),
        envelope.option,
        &[],
    );
    envelope.signature = sealchain::sign(&message, keys.get_d(), keys.get_n()).unwrap();

    let response = client.send_envelope(&envelope).unwrap().unwrap();
    assert_eq!(response.error, Some(LedgerError::UnknownOption(9).to_string()));

    let (_, end) = handle.join().unwrap();
    assert_eq!(end, SessionEnd::ProtocolViolation(LedgerError::UnknownOption(9)));
}
