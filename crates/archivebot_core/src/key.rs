use std::fmt;

use thiserror::Error;

/// Length of a canonical content identifier in hex characters.
pub const KEY_HEX_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("key must be 64 hex characters, got {0}")]
    Length(usize),
    #[error("key must be lowercase hex")]
    Alphabet,
}

/// A feed public key in its canonical form: 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(String);

impl ContentId {
    /// Accepts exactly `^[0-9a-f]{64}$`. Uppercase input is rejected, not folded.
    pub fn parse(raw: &str) -> Result<Self, KeyError> {
        if raw.len() != KEY_HEX_LEN {
            return Err(KeyError::Length(raw.len()));
        }
        if !raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(KeyError::Alphabet);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        let decoded = hex::decode_to_slice(&self.0, &mut out);
        debug_assert!(decoded.is_ok(), "ContentId holds invalid hex: {}", self.0);
        out
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
