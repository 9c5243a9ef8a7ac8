//! HMAC-SHA256 signing over a canonical parameter string.
//!
//! The exchange recomputes the signature over the same canonical form, so the
//! key ordering and the value strings here must match byte for byte what is
//! sent in the request body.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::fmt::Display;

type HmacSha256 = Hmac<Sha256>;

/// Build `k1=v1&k2=v2...` with keys sorted by their bytes.
///
/// The input order is irrelevant; duplicate keys keep their relative order.
pub fn canonical_query<I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Display,
{
    let mut pairs: Vec<(K, V)> = params.into_iter().collect();
    pairs.sort_by(|(a, _), (b, _)| a.as_ref().as_bytes().cmp(b.as_ref().as_bytes()));
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k.as_ref(), v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Lower-case hex HMAC-SHA256 of `payload` keyed by `secret`.
pub fn hmac_sha256_hex(secret: &str, payload: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Sign a parameter set: HMAC-SHA256 over its canonical query string.
pub fn sign<I, K, V>(params: I, secret: &str) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Display,
{
    hmac_sha256_hex(secret, &canonical_query(params))
}

/// Holds the API secret and signs parameter sets with it.
#[derive(Clone)]
pub struct Signer {
    secret: SecretString,
}

impl Signer {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    pub fn sign<I, K, V>(&self, params: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Display,
    {
        sign(params, self.secret.expose_secret())
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").field("secret", &"[REDACTED]").finish()
    }
}
