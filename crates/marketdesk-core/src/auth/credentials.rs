use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

/// Admin passwords remembered in the OS keychain, keyed by email.
pub struct CredentialStore {
    service: String,
}

impl CredentialStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, email: &str) -> Result<Entry> {
        Entry::new(&self.service, email).context("Failed to create keyring entry")
    }

    pub fn remember(&self, email: &str, password: &str) -> Result<()> {
        self.entry(email)?
            .set_password(password)
            .context("Failed to store password in keychain")
    }

    /// The remembered password, if the keychain has one for `email`.
    pub fn recall(&self, email: &str) -> Option<String> {
        match self.entry(email).and_then(|e| e.get_password().map_err(Into::into)) {
            Ok(password) => Some(password),
            Err(e) => {
                debug!(error = %e, "No remembered password");
                None
            }
        }
    }

    pub fn forget(&self, email: &str) -> Result<()> {
        self.entry(email)?
            .delete_credential()
            .context("Failed to delete credential from keychain")
    }
}
