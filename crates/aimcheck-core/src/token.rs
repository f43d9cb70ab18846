//! Verification token derivation.
//!
//! The token is a session artifact shown to the player after a win. It mixes
//! an unseeded random draw and the wall clock, so it is not reproducible and
//! proves nothing: it carries **no cryptographic guarantee** and must never
//! be treated as authentication or as evidence that a challenge was solved.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::time::unix_millis;

/// Number of characters kept from the encoded material.
pub const TOKEN_LENGTH: usize = 32;
/// Base-36 digits in the random component (a u64 always fits in 13).
const RANDOM_DIGITS: usize = 13;
/// Minimum digits of the timestamp component.
const TIMESTAMP_DIGITS: usize = 13;

/// Inputs the token was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSource {
    pub completion_time_ms: u64,
    pub score: u32,
}

/// Opaque completion string. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    value: String,
    derived_from: TokenSource,
}

impl Token {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn derived_from(&self) -> TokenSource {
        self.derived_from
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// Derive a token using the thread RNG and the current wall clock.
pub fn generate(completion_time_ms: u64, score: u32) -> Token {
    generate_with(&mut rand::rng(), completion_time_ms, score, unix_millis())
}

/// Derive a token from an explicit RNG and timestamp.
///
/// Material: 13 base-36 random digits, base-36 completion time, base-36
/// score, zero-padded decimal timestamp. The material is Base64 encoded,
/// truncated to [`TOKEN_LENGTH`] characters and upper-cased.
pub fn generate_with<R: Rng>(
    rng: &mut R,
    completion_time_ms: u64,
    score: u32,
    timestamp_ms: u64,
) -> Token {
    let random = format!("{:0>RANDOM_DIGITS$}", to_base36(rng.random::<u64>()));
    let material = format!(
        "{random}{}{}{timestamp_ms:0TIMESTAMP_DIGITS$}",
        to_base36(completion_time_ms),
        to_base36(u64::from(score)),
    );
    let mut value = STANDARD.encode(material.as_bytes());
    value.truncate(TOKEN_LENGTH);
    value.make_ascii_uppercase();

    Token {
        value,
        derived_from: TokenSource {
            completion_time_ms,
            score,
        },
    }
}

/// Lowercase base-36 rendering of `n`.
pub fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::with_capacity(RANDOM_DIGITS);
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}
