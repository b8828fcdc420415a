//! Wraps the signing keypair so the raw secret-key bytes it was built from
//! are zeroized immediately after construction, never reachable again
//! through this process's memory except inside `solana_sdk::Keypair`
//! itself.

use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use zeroize::Zeroize;

use crate::config::KeySource;
use crate::error::StartupError;

pub struct KeyHandle {
    keypair: Keypair,
}

impl KeyHandle {
    /// Reads the key material from `source`, builds the `Keypair`, then
    /// zeroizes every intermediate buffer the bytes passed through
    /// (including clearing the source environment variable so a later
    /// crash dump or `/proc/<pid>/environ` read can't recover it).
    pub fn load(source: &KeySource) -> Result<Self, StartupError> {
        let mut raw = match source {
            KeySource::Env(var) => {
                let value = std::env::var(var).map_err(|_| {
                    StartupError::Key(format!("environment variable {var} not set"))
                })?;
                std::env::remove_var(var);
                value
            }
            KeySource::Stdin => {
                let mut line = String::new();
                std::io::stdin()
                    .read_line(&mut line)
                    .map_err(|e| StartupError::Key(format!("reading stdin: {e}")))?;
                line
            }
            KeySource::File(path) => std::fs::read_to_string(path)
                .map_err(|e| StartupError::Key(format!("reading {path}: {e}")))?,
        };

        let bytes: Vec<u8> = serde_json::from_str(raw.trim())
            .map_err(|e| StartupError::Key(format!("secret key must be a JSON byte array: {e}")))?;
        let keypair = Keypair::from_bytes(&bytes)
            .map_err(|e| StartupError::Key(format!("invalid keypair bytes: {e}")))?;

        raw.zeroize();
        let mut bytes = bytes;
        bytes.zeroize();

        Ok(Self { keypair })
    }

    pub fn pubkey(&self) -> solana_sdk::pubkey::Pubkey {
        self.keypair.pubkey()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn into_keypair(self) -> Keypair {
        self.keypair
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_from_env_and_clears_it() {
        let kp = Keypair::new();
        let json = serde_json::to_string(&kp.to_bytes().to_vec()).unwrap();
        std::env::set_var("TEST_UPDATER_KEYPAIR_JSON", &json);

        let handle = KeyHandle::load(&KeySource::Env("TEST_UPDATER_KEYPAIR_JSON".into())).unwrap();
        assert_eq!(handle.pubkey(), kp.pubkey());
        assert!(std::env::var("TEST_UPDATER_KEYPAIR_JSON").is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        std::env::set_var("TEST_UPDATER_KEYPAIR_BAD", "not json");
        let err = KeyHandle::load(&KeySource::Env("TEST_UPDATER_KEYPAIR_BAD".into()));
        assert!(err.is_err());
    }
}
