//! OAuth 1.0a request signing (HMAC-SHA1)

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use rand::{distributions::Alphanumeric, Rng};
use sha1::Sha1;

use crate::config::Credentials;
use crate::error::ConfigError;

type HmacSha1 = Hmac<Sha1>;

/// Consumer + access token pair
#[derive(Clone)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_secret: String,
}

impl OAuthCredentials {
    /// Resolve all four platform credentials from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            consumer_key: Credentials::PlatformConsumerKey.require()?,
            consumer_secret: Credentials::PlatformConsumerSecret.require()?,
            access_token: Credentials::PlatformAccessToken.require()?,
            access_secret: Credentials::PlatformAccessSecret.require()?,
        })
    }
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("access_token", &self.access_token)
            .finish_non_exhaustive()
    }
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

pub fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Signature for one request. `params` holds query and form parameters;
/// JSON bodies are not part of the signature base.
pub fn sign(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    creds: &OAuthCredentials,
    nonce: &str,
    timestamp: i64,
) -> String {
    let timestamp = timestamp.to_string();
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    for (k, v) in oauth_params(creds, nonce, &timestamp) {
        pairs.push((encode(k), encode(&v)));
    }
    pairs.sort();

    let param_string = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let base_string = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(url),
        encode(&param_string)
    );
    let signing_key = format!(
        "{}&{}",
        encode(&creds.consumer_secret),
        encode(&creds.access_secret)
    );

    // HMAC accepts keys of any length
    let mut mac = match HmacSha1::new_from_slice(signing_key.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(base_string.as_bytes());
    general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

/// `Authorization` header value for one request
pub fn authorization_header(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    creds: &OAuthCredentials,
    nonce: &str,
    timestamp: i64,
) -> String {
    let signature = sign(method, url, params, creds, nonce, timestamp);
    let timestamp = timestamp.to_string();
    let mut fields: Vec<(&str, String)> = oauth_params(creds, nonce, &timestamp);
    fields.push(("oauth_signature", signature));
    fields.sort_by(|a, b| a.0.cmp(b.0));

    let rendered = fields
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {}", rendered)
}

fn oauth_params(creds: &OAuthCredentials, nonce: &str, timestamp: &str) -> Vec<(&'static str, String)> {
    vec![
        ("oauth_consumer_key", creds.consumer_key.clone()),
        ("oauth_nonce", nonce.to_string()),
        ("oauth_signature_method", "HMAC-SHA1".to_string()),
        ("oauth_timestamp", timestamp.to_string()),
        ("oauth_token", creds.access_token.clone()),
        ("oauth_version", "1.0".to_string()),
    ]
}
