pub mod string;

pub use string::SecretString;

use keyring::Entry;
use sdk::errors::EngineError;

/// Keychain service name used for stored credentials
pub const SERVICE_NAME: &str = "mathcrew";

/// Read-only access to credentials stored in the OS keychain.
///
/// Secrets are stored in:
/// - macOS: Keychain
/// - Windows: Credential Manager
/// - Linux: Secret Service (libsecret)
///
/// Lookups never prompt: a missing entry is reported as `None` so that
/// startup can fail with a configuration error instead of blocking.
pub struct SecretManager {
    service_name: String,
}

impl SecretManager {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Look up a secret without prompting.
    ///
    /// # Errors
    /// Returns `EngineError::Configuration` if the keychain itself is unusable.
    pub fn lookup(&self, key: &str) -> Result<Option<SecretString>, EngineError> {
        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::Configuration(format!("Failed to open keychain entry '{}': {}", key, e))
        })?;

        match entry.get_password() {
            Ok(secret) if !secret.trim().is_empty() => {
                tracing::debug!("Retrieved secret '{}' from keychain", key);
                Ok(Some(SecretString::new(secret)))
            }
            Ok(_) | Err(keyring::Error::NoEntry) => Ok(None),
            Err(keyring::Error::PlatformFailure(e)) | Err(keyring::Error::NoStorageAccess(e)) => {
                tracing::debug!("Keychain unavailable: {}", e);
                Ok(None)
            }
            Err(e) => Err(EngineError::Configuration(format!(
                "Failed to read secret '{}' from keychain: {}",
                key, e
            ))),
        }
    }

    /// Store a secret in the OS keychain
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), EngineError> {
        if value.trim().is_empty() {
            return Err(EngineError::Configuration(format!(
                "Refusing to store empty secret '{}'",
                key
            )));
        }
        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::Configuration(format!("Failed to open keychain entry '{}': {}", key, e))
        })?;
        entry.set_password(value).map_err(|e| {
            EngineError::Configuration(format!("Failed to store secret '{}': {}", key, e))
        })
    }
}

impl Default for SecretManager {
    fn default() -> Self {
        Self::new(SERVICE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_secret_rejected() {
        let manager = SecretManager::new("mathcrew-test");
        let err = manager.set_secret("openai_api_key", "   ").unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }
}
