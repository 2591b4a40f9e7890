//! License token generation.
//!
//! Tokens are a fixed prefix plus 48 alphanumeric characters in four
//! dash-separated blocks of twelve, e.g.
//! `MINT-Ab3kZ9qLw0Xy-PdE2nR7sVt1M-...`. Two modes:
//!
//! - **Random**: each character drawn uniformly from a 62-symbol alphabet
//!   (`62^48`, comfortably past a 256-bit practical entropy target).
//! - **Derived**: a one-way hash of (identity, shared secret) encoded into
//!   the same format. The same identity and secret always yield the same
//!   token, which makes "recover my key" possible without a lookup table.
//!   The cost: anyone who learns the secret can forge any identity's
//!   token. That tradeoff is inherent to the mode — deployments that
//!   cannot accept it must use random mode.

use rand::Rng;
use sha2::{Digest, Sha512};

/// Characters per dash-separated block.
pub const BLOCK_LEN: usize = 12;
/// Number of blocks in the token body.
pub const BLOCK_COUNT: usize = 4;

const BODY_LEN: usize = BLOCK_LEN * BLOCK_COUNT;
const ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Domain separator between secret and identity in derived mode.
const DERIVE_SEP: u8 = 0x1f;

/// How tokens are produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationMode {
    /// High-entropy random tokens.
    Random,
    /// Tokens derived from (identity, secret) via SHA-512.
    Derived {
        /// Shared secret mixed into the derivation.
        secret: String,
    },
}

/// Produces license token strings.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    prefix: String,
    mode: GenerationMode,
}

impl KeyGenerator {
    /// Creates a generator producing random tokens with the given prefix.
    #[must_use]
    pub fn random(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            mode: GenerationMode::Random,
        }
    }

    /// Creates a generator deriving tokens from (identity, `secret`).
    #[must_use]
    pub fn derived(prefix: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            mode: GenerationMode::Derived {
                secret: secret.into(),
            },
        }
    }

    /// Returns true if generation is deterministic per identity.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        matches!(self.mode, GenerationMode::Derived { .. })
    }

    /// Generates a token for the given identity.
    ///
    /// Random mode ignores the identity; derived mode hashes it together
    /// with the shared secret.
    #[must_use]
    pub fn generate(&self, hwid: &str) -> String {
        match &self.mode {
            GenerationMode::Random => self.generate_random(),
            GenerationMode::Derived { secret } => {
                let mut hasher = Sha512::new();
                hasher.update(secret.as_bytes());
                hasher.update([DERIVE_SEP]);
                hasher.update(hwid.as_bytes());
                let digest = hasher.finalize();
                let body = digest[..BODY_LEN]
                    .iter()
                    .map(|b| ALPHABET[(*b as usize) % ALPHABET.len()] as char);
                self.format(body)
            }
        }
    }

    /// Generates a random token regardless of mode.
    ///
    /// Used for permanent keys, which have no identity to derive from.
    #[must_use]
    pub fn generate_random(&self) -> String {
        let mut rng = rand::thread_rng();
        let body =
            (0..BODY_LEN).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char);
        self.format(body)
    }

    fn format(&self, body: impl Iterator<Item = char>) -> String {
        let mut out = String::with_capacity(self.prefix.len() + BODY_LEN + BLOCK_COUNT);
        out.push_str(&self.prefix);
        for (i, c) in body.enumerate() {
            if i % BLOCK_LEN == 0 {
                out.push('-');
            }
            out.push(c);
        }
        out
    }
}
