//! Session lifecycle manager: registration, login, token validation, logout.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use parley_core::config::auth::AuthConfig;
use parley_core::error::AppError;
use parley_core::model::{Identity, Session, User};
use parley_core::result::AppResult;
use parley_core::traits::TokenValidator;
use parley_core::types::{SessionId, UserId};
use parley_database::repositories::{SessionRepository, UserRepository};

use crate::jwt::{JwtDecoder, JwtEncoder};
use crate::password::PasswordHasher;

const INVALID_CREDENTIALS: &str = "Invalid username or password.";

/// Result of a successful login.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LoginResult {
    /// Signed token naming the new session.
    pub token: String,
    /// Created session.
    pub session: Session,
}

/// Manages the complete session lifecycle.
#[derive(Clone)]
pub struct SessionManager {
    /// JWT encoder for token generation.
    jwt_encoder: Arc<JwtEncoder>,
    /// JWT decoder for token validation.
    jwt_decoder: Arc<JwtDecoder>,
    /// Session persistence.
    session_repo: Arc<SessionRepository>,
    /// User repository.
    user_repo: Arc<UserRepository>,
    /// Password hasher.
    password_hasher: Arc<PasswordHasher>,
    /// Auth configuration.
    auth_config: AuthConfig,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("session_ttl_days", &self.auth_config.session_ttl_days)
            .finish()
    }
}

impl SessionManager {
    /// Creates a new session manager with all required dependencies.
    pub fn new(
        jwt_encoder: Arc<JwtEncoder>,
        jwt_decoder: Arc<JwtDecoder>,
        session_repo: Arc<SessionRepository>,
        user_repo: Arc<UserRepository>,
        password_hasher: Arc<PasswordHasher>,
        auth_config: AuthConfig,
    ) -> Self {
        Self {
            jwt_encoder,
            jwt_decoder,
            session_repo,
            user_repo,
            password_hasher,
            auth_config,
        }
    }

    fn session_ttl(&self) -> Duration {
        Duration::days(self.auth_config.session_ttl_days)
    }

    /// Creates an account. Input shape is checked by the caller.
    pub async fn register_user(&self, username: &str, password: &str) -> AppResult<User> {
        if self.auth_config.disable_signup {
            warn!(username = %username, "Registration refused: signup disabled");
            return Err(AppError::forbidden("User registration is currently turned off."));
        }

        let user = User {
            id: UserId::new(),
            username: username.to_string(),
            password_hash: self.password_hasher.hash_password(password)?,
            relations: Vec::new(),
            created_at: Utc::now(),
        };
        let user = self.user_repo.create(user).await?;
        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Checks a username/password pair.
    ///
    /// Unknown users and wrong passwords fail identically.
    pub async fn validate_credentials(&self, username: &str, password: &str) -> AppResult<User> {
        let Some(user) = self.user_repo.find_by_username(username).await? else {
            warn!(username = %username, "Login failed: unknown user");
            return Err(AppError::authentication(INVALID_CREDENTIALS));
        };

        if !self
            .password_hasher
            .verify_password(password, &user.password_hash)?
        {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AppError::authentication(INVALID_CREDENTIALS));
        }

        Ok(user)
    }

    /// Opens a new session for `user_id` and signs a token for it.
    pub async fn issue_session(&self, user_id: UserId) -> AppResult<LoginResult> {
        let session = self
            .session_repo
            .create(user_id, Utc::now() + self.session_ttl())
            .await?;
        let token = self.jwt_encoder.generate_token(user_id, session.id)?;
        info!(user_id = %user_id, session_id = %session.id, "Session issued");
        Ok(LoginResult { token, session })
    }

    /// Credentials check followed by session issue.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginResult> {
        let user = self.validate_credentials(username, password).await?;
        self.issue_session(user.id).await
    }

    /// Ends a session. Live connections opened with it are closed separately.
    pub async fn delete_session(&self, session_id: SessionId) -> AppResult<()> {
        if !self.session_repo.delete(session_id).await? {
            return Err(AppError::not_found("Session not found."));
        }
        info!(session_id = %session_id, "Session deleted");
        Ok(())
    }

    /// Pushes a session's expiry out by the configured TTL.
    pub async fn touch_session(&self, session_id: SessionId) -> AppResult<()> {
        if !self
            .session_repo
            .touch(session_id, Utc::now() + self.session_ttl())
            .await?
        {
            return Err(AppError::not_found("Session not found."));
        }
        debug!(session_id = %session_id, "Session touched");
        Ok(())
    }
}

#[async_trait]
impl TokenValidator for SessionManager {
    async fn validate_token(&self, token: &str, include_profile: bool) -> AppResult<Identity> {
        let claims = self.jwt_decoder.decode_token(token)?;

        let session = self
            .session_repo
            .find_by_id(claims.sid)
            .await?
            .filter(|s| !s.is_expired() && s.user_id == claims.sub)
            .ok_or_else(|| AppError::not_found("Session not found."))?;

        let user = self
            .user_repo
            .find_by_id(session.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found."))?;

        self.touch_session(session.id).await?;

        Ok(Identity {
            id: user.id,
            username: user.username,
            session_id: session.id,
            relations: include_profile.then_some(user.relations),
        })
    }
}
