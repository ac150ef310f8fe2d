use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{AuthError, Identity, IdentityVerifier};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token was issued to.
    pub sub: String,
    pub exp: i64,
}

pub fn create_token(username: &str, secret: &str, expire_hours: i64) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = Utc::now() + Duration::hours(expire_hours);
    let claims = Claims {
        sub: username.to_string(),
        exp: expiration.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

/// Resolves HS256 tokens signed with a shared secret.
pub struct JwtVerifier {
    secret: String,
}

impl JwtVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl IdentityVerifier for JwtVerifier {
    fn resolve(&self, token: &str) -> Result<Identity, AuthError> {
        verify_token(token, &self.secret)
            .map(|claims| claims.sub)
            .filter(|sub| !sub.is_empty())
            .ok_or(AuthError)
    }
}
