//! Session persistence sealed with the session secret.
//!
//! The token record is encrypted with ChaCha20-Poly1305 under a key derived
//! from the secret with Argon2, so the refresh token never sits on disk in
//! the clear and a file written under another secret will not open.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use argon2::Argon2;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::token::SessionToken;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

const SEAL_VERSION: u32 = 1;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

#[derive(Serialize, Deserialize)]
struct SealedSession {
    version: u32,
    salt: String,
    nonce: String,
    ciphertext: String,
}

#[derive(Clone)]
pub struct SessionStore {
    dir: PathBuf,
    secret: String,
}

impl SessionStore {
    pub fn new(dir: PathBuf, secret: impl Into<String>) -> Self {
        Self {
            dir,
            secret: secret.into(),
        }
    }

    /// Load the stored session. Terminal sessions are not restored.
    pub fn load(&self) -> Result<Option<SessionToken>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let sealed: SealedSession =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        let token = self.open(&sealed)?;

        if token.is_terminal() {
            debug!(error = ?token.error, "Stored session is terminal, ignoring");
            return Ok(None);
        }
        Ok(Some(token))
    }

    pub fn save(&self, token: &SessionToken) -> Result<()> {
        std::fs::create_dir_all(&self.dir).context("Failed to create session directory")?;
        let sealed = self.seal(token)?;
        let contents = serde_json::to_string_pretty(&sealed)?;
        std::fs::write(self.session_path(), contents).context("Failed to write session file")?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove session file")?;
        }
        Ok(())
    }

    fn seal(&self, token: &SessionToken) -> Result<SealedSession> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        let mut rng = rand::thread_rng();
        rng.fill_bytes(&mut salt);
        rng.fill_bytes(&mut nonce);

        let plaintext = serde_json::to_vec(token)?;
        let cipher = self.cipher(&salt)?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_ref())
            .map_err(|_| anyhow!("Failed to encrypt session"))?;

        Ok(SealedSession {
            version: SEAL_VERSION,
            salt: STANDARD.encode(salt),
            nonce: STANDARD.encode(nonce),
            ciphertext: STANDARD.encode(ciphertext),
        })
    }

    fn open(&self, sealed: &SealedSession) -> Result<SessionToken> {
        if sealed.version != SEAL_VERSION {
            bail!("Unsupported session file version {}", sealed.version);
        }

        let salt = STANDARD.decode(&sealed.salt).context("Corrupt session salt")?;
        let nonce = STANDARD.decode(&sealed.nonce).context("Corrupt session nonce")?;
        let ciphertext = STANDARD.decode(&sealed.ciphertext).context("Corrupt session data")?;
        if nonce.len() != NONCE_LEN {
            bail!("Corrupt session nonce");
        }

        let plaintext = self
            .cipher(&salt)?
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
            .map_err(|_| anyhow!("Failed to unseal session (was the session secret changed?)"))?;

        serde_json::from_slice(&plaintext).context("Failed to parse stored session")
    }

    fn cipher(&self, salt: &[u8]) -> Result<ChaCha20Poly1305> {
        let mut key = [0u8; 32];
        Argon2::default()
            .hash_password_into(self.secret.as_bytes(), salt, &mut key)
            .map_err(|e| anyhow!("Failed to derive session key: {}", e))?;
        Ok(ChaCha20Poly1305::new(Key::from_slice(&key)))
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenError;
    use crate::testutil::principal;

    fn token() -> SessionToken {
        SessionToken::issue("A1".to_string(), Some("R1".to_string()), principal(), 1_000)
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = SessionStore::new(dir.path().join("nested"), "secret");
        assert_eq!(store.load().expect("load empty"), None);

        store.save(&token()).expect("save");
        assert_eq!(store.load().expect("load"), Some(token()));

        // Record is not stored in the clear
        let raw = std::fs::read_to_string(dir.path().join("nested").join(SESSION_FILE)).expect("read");
        assert!(!raw.contains("refreshToken"));
        assert!(!raw.contains("admin@example.com"));

        store.clear().expect("clear");
        assert_eq!(store.load().expect("load cleared"), None);
        store.clear().expect("clearing twice is fine");
    }

    #[test]
    fn test_wrong_secret_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        SessionStore::new(dir.path().to_path_buf(), "secret").save(&token()).expect("save");

        let other = SessionStore::new(dir.path().to_path_buf(), "another-secret");
        let err = other.load().expect_err("wrong secret");
        assert!(err.to_string().contains("unseal"));
    }

    #[test]
    fn test_terminal_session_not_restored() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = SessionStore::new(dir.path().to_path_buf(), "secret");
        store
            .save(&token().with_error(TokenError::RefreshAccessTokenError))
            .expect("save");
        assert_eq!(store.load().expect("load"), None);
    }
}
