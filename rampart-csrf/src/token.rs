//! Real tokens, their generation, and the masked form sent to clients.
//!
//! A masked token is `base64(mask ‖ (real XOR mask))` with a fresh mask for
//! every emission, so the real token bytes never repeat across responses.

use crate::error::{CsrfError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;
use std::fmt;
use subtle::ConstantTimeEq;

/// Length of a real token in bytes
pub const TOKEN_LENGTH: usize = 32;

/// The secret per-client token stored only inside the signed cookie
#[derive(Clone, PartialEq, Eq)]
pub struct RealToken(Vec<u8>);

impl RealToken {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this token has the length the middleware issues
    pub fn has_valid_length(&self) -> bool {
        self.0.len() == TOKEN_LENGTH
    }

    /// Constant-time comparison against another token
    pub fn ct_eq(&self, other: &RealToken) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl fmt::Debug for RealToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RealToken(<{} bytes>)", self.0.len())
    }
}

/// Source of cryptographically random bytes
///
/// Implementations are shared across concurrent requests.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self, len: usize) -> Result<Vec<u8>>;
}

/// Generator backed by the operating system's random source
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRngGenerator;

impl TokenGenerator for OsRngGenerator {
    fn generate(&self, len: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; len];
        rand::rngs::OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CsrfError::Generation(e.to_string()))?;
        Ok(bytes)
    }
}

/// Draw exactly `len` bytes, treating a short or long result as a failure
fn draw(generator: &dyn TokenGenerator, len: usize) -> Result<Vec<u8>> {
    let bytes = generator.generate(len)?;
    if bytes.len() != len {
        return Err(CsrfError::Generation(format!(
            "generator returned {} bytes, expected {}",
            bytes.len(),
            len
        )));
    }
    Ok(bytes)
}

/// Generate a new real token
pub fn generate_token(generator: &dyn TokenGenerator) -> Result<RealToken> {
    draw(generator, TOKEN_LENGTH).map(RealToken)
}

/// Mask a real token with a fresh one-time pad
pub fn mask_token(real: &RealToken, generator: &dyn TokenGenerator) -> Result<String> {
    let mask = draw(generator, real.len())?;

    let mut masked = Vec::with_capacity(real.len() * 2);
    masked.extend_from_slice(&mask);
    masked.extend(real.as_bytes().iter().zip(&mask).map(|(r, m)| r ^ m));

    Ok(STANDARD.encode(masked))
}

/// Recover the real token from its masked form
pub fn unmask_token(masked: &str) -> Result<RealToken> {
    let decoded = STANDARD
        .decode(masked.trim())
        .map_err(|_| CsrfError::BadToken)?;

    if decoded.len() != TOKEN_LENGTH * 2 {
        return Err(CsrfError::BadToken);
    }

    let (mask, cipher) = decoded.split_at(TOKEN_LENGTH);
    Ok(RealToken(
        cipher.iter().zip(mask).map(|(c, m)| c ^ m).collect(),
    ))
}
