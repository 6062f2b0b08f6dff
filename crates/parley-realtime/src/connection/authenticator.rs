//! Identity resolution for incoming connections.

use std::sync::Arc;

use tracing::debug;

use parley_core::error::AppError;
use parley_core::model::Identity;
use parley_core::result::AppResult;
use parley_core::traits::TokenValidator;

/// What a client presented when opening a connection.
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    /// Token passed in the handshake's auth field. Wins over the header.
    pub auth_token: Option<String>,
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
}

impl Handshake {
    /// Pick the bearer token out of the handshake.
    pub fn bearer_token(&self) -> AppResult<&str> {
        if let Some(token) = self.auth_token.as_deref() {
            debug!("Token found in handshake auth field");
            return Ok(token);
        }

        match self.authorization.as_deref() {
            Some(header) => parse_bearer(header),
            None => Err(AppError::authentication("Missing bearer token")),
        }
    }
}

/// Parse `Bearer <token>`. The scheme is case-sensitive and the header must
/// split into exactly two space-separated parts.
pub fn parse_bearer(header: &str) -> AppResult<&str> {
    let parts: Vec<&str> = header.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] => Ok(*token),
        [_, _] => Err(AppError::authentication("Invalid authorization header scheme")),
        _ => Err(AppError::authentication("Malformed authorization header")),
    }
}

/// Turns a connection handshake into an identity.
#[derive(Clone)]
pub struct IdentityResolver {
    validator: Arc<dyn TokenValidator>,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver").finish()
    }
}

impl IdentityResolver {
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self { validator }
    }

    /// Resolve the handshake to an identity carrying its relationship list.
    pub async fn resolve(&self, handshake: &Handshake) -> AppResult<Identity> {
        let token = handshake.bearer_token()?;
        self.validator.validate_token(token, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parley_core::error::ErrorKind;
    use parley_core::types::{SessionId, UserId};

    #[derive(Default)]
    struct CountingValidator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenValidator for CountingValidator {
        async fn validate_token(&self, token: &str, include_profile: bool) -> AppResult<Identity> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(include_profile);
            Ok(Identity {
                id: UserId::new(),
                username: token.to_string(),
                session_id: SessionId::new(),
                relations: Some(Vec::new()),
            })
        }
    }

    fn header(value: &str) -> Handshake {
        Handshake {
            auth_token: None,
            authorization: Some(value.to_string()),
        }
    }

    #[test]
    fn test_auth_field_wins_over_header() {
        let hs = Handshake {
            auth_token: Some("from-auth".into()),
            authorization: Some("Bearer from-header".into()),
        };
        assert_eq!(hs.bearer_token().unwrap(), "from-auth");
    }

    #[test]
    fn test_header_rules() {
        assert_eq!(header("Bearer abc").bearer_token().unwrap(), "abc");
        for bad in ["Token abc", "bearer abc", "Bearer", "Bearer a b", ""] {
            let err = header(bad).bearer_token().unwrap_err();
            assert_eq!(err.kind, ErrorKind::Authentication, "{bad:?}");
        }
        let err = Handshake::default().bearer_token().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_malformed_header_makes_no_collaborator_call() {
        let validator = Arc::new(CountingValidator::default());
        let resolver = IdentityResolver::new(validator.clone());
        assert!(resolver.resolve(&header("Token abc")).await.is_err());
        assert_eq!(validator.calls.load(Ordering::SeqCst), 0);

        let identity = resolver.resolve(&header("Bearer alice")).await.unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(validator.calls.load(Ordering::SeqCst), 1);
    }
}
