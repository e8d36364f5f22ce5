use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::{Digest, Sha256, Sha512};
use uuid::Uuid;

use crate::error::ExchangeError;

type HmacSha256 = Hmac<Sha256>;

const JWT_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// API key pair used to sign private requests
#[derive(Clone)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

#[derive(Serialize)]
struct Claims<'a> {
    access_key: &'a str,
    nonce: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_hash_alg: Option<&'static str>,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// `Authorization` header value for a request with the given query string
    pub fn authorization(&self, query: Option<&str>) -> Result<String, ExchangeError> {
        Ok(format!("Bearer {}", self.token(query)?))
    }

    /// HS256 JWT with a fresh nonce
    pub fn token(&self, query: Option<&str>) -> Result<String, ExchangeError> {
        self.token_with_nonce(query, Uuid::new_v4().to_string())
    }

    fn token_with_nonce(&self, query: Option<&str>, nonce: String) -> Result<String, ExchangeError> {
        let query = query.filter(|q| !q.is_empty());
        let claims = Claims {
            access_key: &self.access_key,
            nonce,
            query_hash: query.map(query_hash),
            query_hash_alg: query.map(|_| "SHA512"),
        };

        let payload = serde_json::to_vec(&claims)?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(JWT_HEADER),
            URL_SAFE_NO_PAD.encode(payload)
        );

        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| ExchangeError::Auth(format!("invalid secret key: {}", e)))?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .finish()
    }
}

/// Hex SHA-512 of a `k=v&k=v` query string
pub fn query_hash(query: &str) -> String {
    format!("{:x}", Sha512::digest(query.as_bytes()))
}

/// Joins parameters into a query string in the given order
pub fn query_string<K: AsRef<str>, V: AsRef<str>>(params: &[(K, V)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k.as_ref(), v.as_ref()))
        .collect::<Vec<_>>()
        .join("&")
}
