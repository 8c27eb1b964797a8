//! Request signing for the Coinbase Exchange REST API.
//!
//! Every private request carries four headers:
//! `CB-ACCESS-KEY`, `CB-ACCESS-SIGN`, `CB-ACCESS-TIMESTAMP`, `CB-ACCESS-PASSPHRASE`.
//! The signature is base64(HMAC-SHA256(decoded secret, prehash)) where
//! prehash = timestamp + METHOD + request path (with query) + body.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// API credentials for one exchange profile.
pub struct Credentials {
    pub api_key: String,
    /// Base64-encoded signing secret, as issued by the exchange.
    pub api_secret: SecretString,
    pub passphrase: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}

/// Headers to attach to one signed request.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedHeaders {
    pub key: String,
    pub sign: String,
    pub timestamp: String,
    pub passphrase: String,
}

impl Credentials {
    pub fn new(api_key: String, api_secret: String, passphrase: String) -> Self {
        Self {
            api_key,
            api_secret: SecretString::new(api_secret),
            passphrase: SecretString::new(passphrase),
        }
    }

    /// Sign a request made at `timestamp` (unix seconds, as sent).
    pub fn sign(
        &self,
        timestamp: &str,
        method: &str,
        request_path: &str,
        body: &str,
    ) -> Result<SignedHeaders> {
        let key = STANDARD
            .decode(self.api_secret.expose_secret())
            .context("API secret is not valid base64")?;

        let mut mac = HmacSha256::new_from_slice(&key).context("Invalid HMAC key length")?;
        mac.update(timestamp.as_bytes());
        mac.update(method.to_uppercase().as_bytes());
        mac.update(request_path.as_bytes());
        mac.update(body.as_bytes());
        let sign = STANDARD.encode(mac.finalize().into_bytes());

        Ok(SignedHeaders {
            key: self.api_key.clone(),
            sign,
            timestamp: timestamp.to_string(),
            passphrase: self.passphrase.expose_secret().clone(),
        })
    }
}
