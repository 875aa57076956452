//! Integration tests for keychain-backed secrets
//!
//! Lookups of absent entries must never fail or prompt. The store/lookup
//! round-trip needs a real keychain and only runs when
//! `MATHCREW_KEYRING_TESTS=1` is set.

use mathcrew_engine::secrets::{SecretManager, SecretString};
use sdk::errors::EngineError;

const TEST_SERVICE: &str = "mathcrew-integration-test";

fn keyring_tests_enabled() -> bool {
    std::env::var("MATHCREW_KEYRING_TESTS").as_deref() == Ok("1")
}

#[test]
fn test_lookup_of_missing_secret_is_none() {
    let manager = SecretManager::new(TEST_SERVICE);
    let result = manager.lookup("never_stored_key_7f3a");
    assert!(matches!(result, Ok(None)));
}

#[test]
fn test_blank_secret_is_refused() {
    let manager = SecretManager::new(TEST_SERVICE);
    let err = manager.set_secret("openai_api_key", "").unwrap_err();
    assert!(matches!(err, EngineError::Configuration(_)));
}

#[test]
fn test_secret_string_is_redacted() {
    let secret = SecretString::new("sk-live-123");
    assert_eq!(secret.unsecure(), "sk-live-123");
    assert!(!format!("{:?}", secret).contains("sk-live-123"));
}

#[test]
fn test_store_and_lookup_round_trip() {
    if !keyring_tests_enabled() {
        return;
    }

    let manager = SecretManager::new(TEST_SERVICE);
    manager.set_secret("round_trip_key", "sk-round-trip").unwrap();

    let found = manager.lookup("round_trip_key").unwrap();
    assert_eq!(found.map(|s| s.unsecure().to_string()), Some("sk-round-trip".to_string()));
}
