//! Token verification.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{AllocationError, Result};
use crate::types::Principal;

/// Resolves a bearer token to the principal it belongs to.
///
/// Object-safe so the server can hold it as `Arc<dyn TokenVerifier>` and
/// tests can substitute their own token tables.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Principal>;
}

/// Fixed token table, populated at startup.
///
/// Each token maps to exactly one principal. Suitable for deployments that
/// provision tokens out of band; tests build one per scenario.
#[derive(Debug, Default, Clone)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Principal>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.tokens.insert(token.into(), principal);
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Principal> {
        self.tokens
            .get(token)
            .copied()
            .ok_or_else(|| AllocationError::Unauthorized("unknown bearer token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, UserId};

    #[tokio::test]
    async fn known_token_resolves_to_principal() {
        let principal = Principal {
            id: UserId::new(),
            role: Role::Warden,
        };
        let verifier = StaticTokenVerifier::new().with_token("warden-token", principal);

        let resolved = verifier.verify("warden-token").await.unwrap();
        assert_eq!(resolved, principal);
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let verifier = StaticTokenVerifier::new();
        let err = verifier.verify("nope").await.unwrap_err();
        assert!(matches!(err, AllocationError::Unauthorized(_)));
    }
}
