//! Identity resolution. Every inbound command is mapped from a bearer token to
//! a username before it reaches the hub; credentials are never stored here.

pub mod jwt;
pub mod middleware;

use std::sync::Arc;

pub type Identity = String;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Not authenticated")]
pub struct AuthError;

pub trait IdentityVerifier: Send + Sync {
    fn resolve(&self, token: &str) -> Result<Identity, AuthError>;
}

pub type SharedVerifier = Arc<dyn IdentityVerifier>;
