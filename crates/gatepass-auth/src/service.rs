//! Authentication service — login, registration, password reset and
//! bearer-token authentication.

use chrono::Utc;
use gatepass_core::error::{GatepassError, GatepassResult};
use gatepass_core::models::user::{CreateUser, Region, Role, UpdateUser, User};
use gatepass_core::repository::UserRepository;
use gatepass_core::validation;
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password::{self, PasswordCheck};
use crate::token;

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed JWT access token.
    pub token: String,
    /// The user as stored after login bookkeeping.
    pub user: User,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Self-registration input. The resulting account is always an observer.
#[derive(Debug)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub regions: Option<Vec<Region>>,
}

#[derive(Debug)]
pub struct ResetPasswordInput {
    pub username: String,
    pub old_password: String,
    pub new_password: String,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<U: UserRepository> {
    user_repo: U,
    config: AuthConfig,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(user_repo: U, config: AuthConfig) -> Self {
        Self { user_repo, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Look up `username` and check `password`, treating an unknown user
    /// and a wrong password identically.
    async fn check_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> GatepassResult<(User, PasswordCheck)> {
        let user = match self.user_repo.get_by_username(username.trim()).await {
            Ok(u) => u,
            Err(e) if e.is_not_found() => return Err(AuthError::InvalidCredentials.into()),
            Err(e) => return Err(e),
        };

        let check = password::verify_stored_password(
            password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !check.is_valid() {
            return Err(AuthError::InvalidCredentials.into());
        }
        Ok((user, check))
    }

    /// Authenticate with username + password and issue an access token.
    ///
    /// A legacy plaintext credential is upgraded to Argon2id in the same
    /// write that records `last_login`. That write is best-effort: a
    /// failure is logged and the login still succeeds.
    pub async fn login(&self, input: LoginInput) -> GatepassResult<LoginOutput> {
        let (user, check) = self.check_credentials(&input.username, &input.password).await?;

        let upgrade = check == PasswordCheck::LegacyPlaintext;
        let bookkeeping = UpdateUser {
            last_login: Some(Utc::now()),
            password: upgrade.then(|| input.password.clone()),
            ..Default::default()
        };
        let user = match self.user_repo.update(user.id, bookkeeping).await {
            Ok(updated) => {
                if upgrade {
                    info!(user_id = %updated.id, "Upgraded legacy plaintext password");
                }
                updated
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Failed to record login");
                user
            }
        };

        let token = token::issue_access_token(&user, &self.config)?;
        info!(user_id = %user.id, username = %user.username, "User logged in");

        Ok(LoginOutput {
            token,
            user,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Create a self-registered account with role `observer`.
    pub async fn register(&self, input: RegisterInput) -> GatepassResult<User> {
        let username = validation::username(&input.username)?;
        validation::password(&input.password, self.config.min_password_length)?;
        let email = validation::email(&input.email)?;
        let first_name = validation::non_empty(&input.first_name, "firstName")?;
        let last_name = validation::non_empty(&input.last_name, "lastName")?;
        let regions = validation::regions(input.regions);

        // Fast path; the unique indexes remain authoritative.
        if found(self.user_repo.get_by_username(&username).await)?
            || found(self.user_repo.get_by_email(&email).await)?
        {
            return Err(GatepassError::already_exists("user"));
        }

        let user = self
            .user_repo
            .create(CreateUser {
                username,
                email,
                password: input.password,
                first_name,
                last_name,
                regions,
                role: Role::Observer,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Replace a password after re-checking the current one.
    pub async fn reset_password(&self, input: ResetPasswordInput) -> GatepassResult<User> {
        validation::password(&input.new_password, self.config.min_password_length)?;
        let (user, _) = self
            .check_credentials(&input.username, &input.old_password)
            .await?;

        let user = self
            .user_repo
            .update(
                user.id,
                UpdateUser {
                    password: Some(input.new_password),
                    ..Default::default()
                },
            )
            .await?;

        info!(user_id = %user.id, "Password reset");
        Ok(user)
    }

    /// Resolve the actor behind a bearer token.
    ///
    /// The user is re-read from the store on every call, so role and
    /// region changes apply immediately and deleted accounts are
    /// rejected even while their tokens are unexpired.
    pub async fn authenticate(&self, bearer: Option<&str>) -> GatepassResult<User> {
        let raw = bearer.ok_or(AuthError::MissingToken)?;

        let claims = token::decode_access_token(raw, &self.config)
            .inspect_err(|e| debug!(error = %e, "Rejected access token"))?;
        let user_id = claims.user_id()?;

        match self.user_repo.get_by_id(user_id).await {
            Ok(user) => Ok(user),
            Err(e) if e.is_not_found() => Err(AuthError::UserGone.into()),
            Err(e) => Err(e),
        }
    }
}

fn found(lookup: GatepassResult<User>) -> GatepassResult<bool> {
    match lookup {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}
