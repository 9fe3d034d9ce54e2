//! Signed (and optionally encrypted) cookie encoding of the real token.
//!
//! Cookie value layout: `base64url(body) "." base64url(hmac)` where the MAC is
//! HMAC-SHA256 over `cookie_name "|" base64url(body)`. The body is the JSON
//! payload, or `nonce ‖ AES-256-GCM(payload)` when an encryption key is set.

use crate::config::CsrfConfig;
use crate::error::{CsrfError, Result};
use crate::token::RealToken;
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const NONCE_LENGTH: usize = 12;
const ENCRYPTION_KEY_LENGTH: usize = 32;

/// Serializes the real token into a cookie value and back
///
/// Decoding must fail, never panic, on forged or corrupted input.
pub trait TokenCodec: Send + Sync {
    fn encode(&self, name: &str, token: &RealToken) -> Result<String>;
    fn decode(&self, name: &str, value: &str) -> Result<RealToken>;
}

#[derive(Serialize, Deserialize)]
struct CookiePayload {
    token: String,
    issued_at: i64,
}

/// HMAC-SHA256 authenticated cookie codec
#[derive(Clone)]
pub struct SecureCookieCodec {
    secret: Vec<u8>,
    encryption_key: Option<Vec<u8>>,
    max_age: Option<i64>,
}

impl SecureCookieCodec {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            encryption_key: None,
            max_age: None,
        }
    }

    /// Build the codec described by a CSRF configuration
    pub fn from_config(config: &CsrfConfig) -> Self {
        let codec = Self::new(config.secret.clone()).with_max_age(config.cookie_max_age);
        match &config.encryption_key {
            Some(key) => codec.with_encryption_key(key.clone()),
            None => codec,
        }
    }

    /// Encrypt payloads with AES-256-GCM; the key must be 32 bytes
    pub fn with_encryption_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.encryption_key = Some(key.into());
        self
    }

    /// Reject values issued more than `seconds` ago; 0 or less disables expiry
    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = (seconds > 0).then_some(seconds);
        self
    }

    fn mac(&self, name: &str, body: &str) -> Result<HmacSha256> {
        if self.secret.is_empty() {
            return Err(CsrfError::SecretMissing);
        }
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .map_err(|e| CsrfError::InvalidKey(e.to_string()))?;
        mac.update(name.as_bytes());
        mac.update(b"|");
        mac.update(body.as_bytes());
        Ok(mac)
    }

    fn cipher(&self) -> Result<Option<Aes256Gcm>> {
        let Some(key) = &self.encryption_key else {
            return Ok(None);
        };
        if key.len() != ENCRYPTION_KEY_LENGTH {
            return Err(CsrfError::InvalidKey(format!(
                "encryption key must be {} bytes, got {}",
                ENCRYPTION_KEY_LENGTH,
                key.len()
            )));
        }
        Aes256Gcm::new_from_slice(key)
            .map(Some)
            .map_err(|e| CsrfError::InvalidKey(e.to_string()))
    }
}

impl TokenCodec for SecureCookieCodec {
    fn encode(&self, name: &str, token: &RealToken) -> Result<String> {
        if self.secret.is_empty() {
            return Err(CsrfError::SecretMissing);
        }

        let payload = serde_json::to_vec(&CookiePayload {
            token: URL_SAFE_NO_PAD.encode(token.as_bytes()),
            issued_at: Utc::now().timestamp(),
        })
        .map_err(|e| CsrfError::Codec(e.to_string()))?;

        let body = match self.cipher()? {
            Some(cipher) => {
                let nonce_bytes: [u8; NONCE_LENGTH] = rand::random();
                let ciphertext = cipher
                    .encrypt(&Nonce::from(nonce_bytes), payload.as_ref())
                    .map_err(|e| CsrfError::Codec(e.to_string()))?;

                let mut body = nonce_bytes.to_vec();
                body.extend_from_slice(&ciphertext);
                body
            }
            None => payload,
        };

        let body = URL_SAFE_NO_PAD.encode(body);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(name, &body)?.finalize().into_bytes());

        Ok(format!("{}.{}", body, signature))
    }

    fn decode(&self, name: &str, value: &str) -> Result<RealToken> {
        if self.secret.is_empty() {
            return Err(CsrfError::SecretMissing);
        }
        let cipher = self.cipher()?;

        let (body, signature) = value
            .split_once('.')
            .ok_or_else(|| CsrfError::Codec("malformed cookie value".to_string()))?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|e| CsrfError::Codec(e.to_string()))?;

        // verify_slice compares in constant time
        self.mac(name, body)?
            .verify_slice(&signature)
            .map_err(|_| CsrfError::Codec("signature mismatch".to_string()))?;

        let body = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|e| CsrfError::Codec(e.to_string()))?;

        let payload = match cipher {
            Some(cipher) => {
                if body.len() <= NONCE_LENGTH {
                    return Err(CsrfError::Codec("ciphertext too short".to_string()));
                }
                let (nonce, ciphertext) = body.split_at(NONCE_LENGTH);
                cipher
                    .decrypt(Nonce::from_slice(nonce), ciphertext)
                    .map_err(|e| CsrfError::Codec(e.to_string()))?
            }
            None => body,
        };

        let payload: CookiePayload =
            serde_json::from_slice(&payload).map_err(|e| CsrfError::Codec(e.to_string()))?;

        if let Some(max_age) = self.max_age {
            let age = Utc::now().timestamp() - payload.issued_at;
            if age > max_age {
                return Err(CsrfError::Codec("cookie expired".to_string()));
            }
        }

        URL_SAFE_NO_PAD
            .decode(&payload.token)
            .map(RealToken::from_bytes)
            .map_err(|e| CsrfError::Codec(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{OsRngGenerator, generate_token};

    const SECRET: &[u8] = b"481e5d98a31585148b8b1dfb6a3c0465";
    const COOKIE: &str = "_csrf_token";

    fn token() -> RealToken {
        generate_token(&OsRngGenerator).unwrap()
    }

    fn signed_payload(codec: &SecureCookieCodec, payload: &CookiePayload) -> String {
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
        let signature = codec.mac(COOKIE, &body).unwrap().finalize().into_bytes();
        format!("{}.{}", body, URL_SAFE_NO_PAD.encode(signature))
    }

    #[test]
    fn test_round_trip() {
        let codec = SecureCookieCodec::new(SECRET);
        let real = token();

        let value = codec.encode(COOKIE, &real).unwrap();
        assert_eq!(codec.decode(COOKIE, &value).unwrap(), real);
        // Decoding is repeatable for the same cookie
        assert_eq!(codec.decode(COOKIE, &value).unwrap(), real);
    }

    #[test]
    fn test_value_is_cookie_safe() {
        let value = SecureCookieCodec::new(SECRET).encode(COOKIE, &token()).unwrap();
        assert!(
            value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        );
    }

    #[test]
    fn test_wrong_secret_fails() {
        let value = SecureCookieCodec::new(SECRET).encode(COOKIE, &token()).unwrap();
        let other = SecureCookieCodec::new(b"a-completely-different-secret!!!".to_vec());

        assert!(matches!(other.decode(COOKIE, &value), Err(CsrfError::Codec(_))));
    }

    #[test]
    fn test_value_is_bound_to_cookie_name() {
        let codec = SecureCookieCodec::new(SECRET);
        let value = codec.encode(COOKIE, &token()).unwrap();

        assert!(codec.decode("other_cookie", &value).is_err());
    }

    #[test]
    fn test_corrupted_values_fail() {
        let codec = SecureCookieCodec::new(SECRET);
        let value = codec.encode(COOKIE, &token()).unwrap();

        for corrupted in [
            "",
            "no-separator",
            "abc.def",
            "%%%.%%%",
            &value[1..],
            &format!("{}x", value),
        ] {
            assert!(codec.decode(COOKIE, corrupted).is_err(), "{corrupted}");
        }
    }

    #[test]
    fn test_missing_secret() {
        let codec = SecureCookieCodec::new(Vec::new());
        assert_eq!(codec.encode(COOKIE, &token()), Err(CsrfError::SecretMissing));
        assert_eq!(codec.decode(COOKIE, "a.b"), Err(CsrfError::SecretMissing));
    }

    #[test]
    fn test_encrypted_round_trip() {
        let codec = SecureCookieCodec::new(SECRET).with_encryption_key([9u8; 32]);
        let real = token();

        let value = codec.encode(COOKIE, &real).unwrap();
        assert_eq!(codec.decode(COOKIE, &value).unwrap(), real);

        // The payload is not readable without the key
        let body = URL_SAFE_NO_PAD.decode(value.split('.').next().unwrap()).unwrap();
        assert!(serde_json::from_slice::<CookiePayload>(&body).is_err());

        let other_key = SecureCookieCodec::new(SECRET).with_encryption_key([8u8; 32]);
        assert!(matches!(other_key.decode(COOKIE, &value), Err(CsrfError::Codec(_))));
    }

    #[test]
    fn test_invalid_encryption_key() {
        let codec = SecureCookieCodec::new(SECRET).with_encryption_key(b"short".to_vec());
        assert!(matches!(codec.encode(COOKIE, &token()), Err(CsrfError::InvalidKey(_))));
    }

    #[test]
    fn test_max_age() {
        let codec = SecureCookieCodec::new(SECRET).with_max_age(60);
        let real = token();

        let fresh = signed_payload(
            &codec,
            &CookiePayload {
                token: URL_SAFE_NO_PAD.encode(real.as_bytes()),
                issued_at: Utc::now().timestamp() - 30,
            },
        );
        assert_eq!(codec.decode(COOKIE, &fresh).unwrap(), real);

        let stale = signed_payload(
            &codec,
            &CookiePayload {
                token: URL_SAFE_NO_PAD.encode(real.as_bytes()),
                issued_at: Utc::now().timestamp() - 3600,
            },
        );
        assert!(matches!(codec.decode(COOKIE, &stale), Err(CsrfError::Codec(_))));

        // Without a max-age the same value stays valid
        assert!(SecureCookieCodec::new(SECRET).decode(COOKIE, &stale).is_ok());
    }
}
