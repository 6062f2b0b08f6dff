//! Auth collaborator contract.

use async_trait::async_trait;

use crate::model::Identity;
use crate::result::AppResult;

/// Resolves bearer tokens to identities.
#[async_trait]
pub trait TokenValidator: Send + Sync + 'static {
    /// Validate `token`, refresh the session it belongs to, and return the identity.
    ///
    /// With `include_profile` the identity carries the relationship list.
    /// Fails with `Authentication` for a bad token and `NotFound` when the
    /// session or user behind a good token is gone.
    async fn validate_token(&self, token: &str, include_profile: bool) -> AppResult<Identity>;
}
