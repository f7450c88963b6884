use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use jsonwebtoken::{get_current_timestamp, Algorithm};
use serde::Serialize;

use crate::{error::StoreError, ServiceAccountKey};

const TOKEN_AUDIENCE: &str = "https://firestore.googleapis.com/";

/// The token will be valid for 60 minutes.
const VALID_DURATION: u64 = 60 * 60;

/// But we will create a new token after 55 minutes just to be sure.
const EXPIRY_BUFFER: u64 = 5 * 60;

/// Hands out self-signed JWTs for the Firestore API. Clones share one token
/// cache, so every gRPC stub built from the same client reuses the same token
/// until it is about to expire.
#[derive(Clone)]
pub(crate) struct FirestoreTokenProvider {
    inner: Arc<Mutex<TokenCache>>,
}

struct TokenCache {
    key: ServiceAccountKey,
    current_token: Option<Token>,
}

#[derive(Clone)]
struct Token {
    jwt: String,
    /// Seconds since the UNIX epoch after which the token is regenerated.
    refresh_at: u64,
}

impl FirestoreTokenProvider {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TokenCache {
                key,
                current_token: None,
            })),
        }
    }

    pub fn get_token(&self) -> Result<String, StoreError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("Token cache lock was poisoned"))?;
        let cache = &mut *guard;

        match &cache.current_token {
            Some(token) if token.refresh_at > get_current_timestamp() => Ok(token.jwt.clone()),
            _ => {
                tracing::debug!(
                    project_id = %cache.key.project_id,
                    "Signing new Firestore access token"
                );
                let token = create_jwt(&cache.key)?;
                let jwt = token.jwt.clone();
                cache.current_token = Some(token);
                Ok(jwt)
            }
        }
    }
}

fn create_jwt(key: &ServiceAccountKey) -> Result<Token, anyhow::Error> {
    let private_key = key
        .private_key
        .as_deref()
        .context("Service account key has no `private_key` to sign tokens with")?;

    let mut header = jsonwebtoken::Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let issued_at_time = get_current_timestamp();
    let claims = JwtClaims {
        iss: &key.client_email,
        sub: &key.client_email,
        aud: TOKEN_AUDIENCE,
        iat: issued_at_time,
        exp: issued_at_time + VALID_DURATION,
        uid: key.client_id.as_deref(),
    };

    let encoding_key = jsonwebtoken::EncodingKey::from_rsa_pem(private_key.as_bytes())
        .context("Failed to create JWT encoding key from the given private key")?;

    let jwt =
        jsonwebtoken::encode(&header, &claims, &encoding_key).context("Failed to create JWT")?;

    Ok(Token {
        jwt,
        refresh_at: claims.exp - EXPIRY_BUFFER,
    })
}

#[derive(Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    uid: Option<&'a str>,
}
