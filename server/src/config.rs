//! Server configuration from environment variables.
//!
//! Operational flags (port, data file, verbosity) can also be set on the
//! command line; CLI values win over the environment.

use anyhow::{bail, Context, Result};
use keymint_engine::{KeyGenerator, DEFAULT_LIFETIME_MS};
use std::path::PathBuf;

/// Which token generation mode the deployment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    /// High-entropy random tokens.
    Random,
    /// Tokens derived from (identity, shared secret).
    Derived,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP listener binds to.
    pub port: u16,
    /// Path of the JSON key snapshot.
    pub data_file: PathBuf,
    /// Shared-secret credential for the admin surface.
    pub admin_token: String,
    /// Webhook endpoint for key event notifications, if any.
    pub webhook_url: Option<String>,
    /// Lifetime of newly issued keys in milliseconds.
    pub key_lifetime_ms: i64,
    /// Token prefix.
    pub key_prefix: String,
    /// Generation mode.
    pub key_mode: KeyMode,
    /// Derivation secret; required in derived mode.
    pub key_secret: Option<String>,
}

impl Config {
    /// Loads configuration from the environment.
    ///
    /// `KEYMINT_ADMIN_TOKEN` has no default on purpose: the server refuses
    /// to start without an explicit credential rather than shipping a
    /// hardcoded password.
    pub fn from_env() -> Result<Self> {
        let port = std::env::var("KEYMINT_PORT")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .context("KEYMINT_PORT must be a port number")?;

        let data_file = std::env::var("KEYMINT_DATA_FILE")
            .unwrap_or_else(|_| "keys.json".to_string())
            .into();

        let admin_token = match std::env::var("KEYMINT_ADMIN_TOKEN") {
            Ok(token) if !token.is_empty() => token,
            _ => bail!("KEYMINT_ADMIN_TOKEN environment variable required"),
        };

        let webhook_url = std::env::var("KEYMINT_WEBHOOK_URL").ok().filter(|s| !s.is_empty());

        let key_lifetime_ms = match std::env::var("KEYMINT_KEY_LIFETIME_HOURS") {
            Ok(hours) => {
                let hours: i64 = hours
                    .parse()
                    .context("KEYMINT_KEY_LIFETIME_HOURS must be an integer")?;
                if hours <= 0 {
                    bail!("KEYMINT_KEY_LIFETIME_HOURS must be positive");
                }
                hours * 3_600_000
            }
            Err(_) => DEFAULT_LIFETIME_MS,
        };

        let key_prefix =
            std::env::var("KEYMINT_KEY_PREFIX").unwrap_or_else(|_| "MINT".to_string());

        let key_mode = match std::env::var("KEYMINT_KEY_MODE").as_deref() {
            Ok("derived") => KeyMode::Derived,
            Ok("random") | Err(_) => KeyMode::Random,
            Ok(other) => bail!("KEYMINT_KEY_MODE must be 'random' or 'derived', got '{other}'"),
        };

        let key_secret = std::env::var("KEYMINT_KEY_SECRET").ok();
        if key_mode == KeyMode::Derived && key_secret.is_none() {
            bail!("KEYMINT_KEY_SECRET required in derived mode");
        }

        Ok(Self {
            port,
            data_file,
            admin_token,
            webhook_url,
            key_lifetime_ms,
            key_prefix,
            key_mode,
            key_secret,
        })
    }

    /// Builds the token generator this configuration describes.
    #[must_use]
    pub fn generator(&self) -> KeyGenerator {
        match self.key_mode {
            KeyMode::Random => KeyGenerator::random(&self.key_prefix),
            KeyMode::Derived => KeyGenerator::derived(
                &self.key_prefix,
                self.key_secret.as_deref().unwrap_or_default(),
            ),
        }
    }
}
