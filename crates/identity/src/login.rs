use std::sync::{Arc, OnceLock};

use sqlx::SqlitePool;
use time::Duration;
use tracing::{error, info, warn};
use ulid::Ulid;
use validator::Validate;

use crate::account::{Account, AccountStore, Role};
use crate::password::{CredentialHasher, verify_password};
use crate::token::{SessionAuthority, SessionClaims, now, strip_bearer};
use crate::{AuthError, Result};

pub struct LoginInput {
    pub role: Role,
    pub email: String,
    pub password: String,
}

#[derive(Validate)]
pub struct NewAccount {
    pub role: Role,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub speciality: Option<String>,
}

#[derive(Validate)]
struct PasswordInput {
    #[validate(length(min = 8))]
    password: String,
}

/// Outcome of a successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub expires_at: i64,
    pub account: Account,
}

/// Who is behind a verified session token.
#[derive(Debug, Clone)]
pub struct Identity {
    pub account: Account,
    pub claims: SessionClaims,
}

/// Ties the account store, the credential verifier and the session authority
/// into the login and per-request authentication flows.
#[derive(Clone)]
pub struct Authenticator {
    store: AccountStore,
    hasher: CredentialHasher,
    authority: SessionAuthority,
    ttl: Duration,
    // verified against on unknown emails so every rejection costs one argon2 run
    decoy: Arc<OnceLock<String>>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn session_claims(account: &Account) -> SessionClaims {
    let claims = SessionClaims::new(&account.email)
        .with("account_id", account.id.to_owned())
        .with("role", account.role.to_string())
        .with("first_name", account.first_name.to_owned())
        .with("last_name", account.last_name.to_owned());

    match &account.speciality {
        Some(speciality) => claims.with("speciality", speciality.to_owned()),
        None => claims,
    }
}

impl Authenticator {
    pub fn new(pool: SqlitePool, authority: SessionAuthority, ttl: Duration) -> Self {
        Self {
            store: AccountStore::new(pool),
            hasher: CredentialHasher::default(),
            authority,
            ttl,
            decoy: Arc::default(),
        }
    }

    pub fn with_hasher(mut self, hasher: CredentialHasher) -> Self {
        self.hasher = hasher;
        self.decoy = Arc::default();
        self
    }

    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    pub fn authority(&self) -> &SessionAuthority {
        &self.authority
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Check credentials and mint a session token.
    ///
    /// An unknown email and a wrong password both surface as
    /// `InvalidCredentials`; only the log line tells them apart.
    pub async fn login(&self, input: LoginInput) -> Result<Session> {
        let email = normalize_email(&input.email);
        let role = input.role;

        let Some(account) = self.store.find_by_email(role, &email).await? else {
            verify_password(&input.password, self.decoy_credential());
            warn!(%role, %email, reason = "unknown_account", "login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(&input.password, &account.password_hash) {
            warn!(%role, %email, reason = "wrong_password", "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        if !account.is_active {
            warn!(%role, %email, reason = "inactive_account", "login rejected");
            return Err(AuthError::InactiveAccount);
        }

        let now = now();
        let token = self
            .authority
            .issue_at(session_claims(&account), self.ttl, now)?;

        if let Err(e) = self.store.update_last_login(&account.id, now).await {
            error!(error = %e, account_id = %account.id, "failed to record last login");
        }

        info!(account_id = %account.id, %role, "login succeeded");

        Ok(Session {
            token,
            expires_at: now.saturating_add(self.ttl.whole_seconds()),
            account: Account {
                last_login: Some(now),
                ..account
            },
        })
    }

    /// Resolve the identity behind a presented token for `role`.
    ///
    /// Accepts the raw token or the `Bearer <token>` cookie form. The account
    /// is reloaded so a disabled account stops authenticating immediately.
    pub async fn authenticate(&self, role: Role, token: &str) -> Result<Identity> {
        let claims = self.authority.verify(strip_bearer(token))?;

        if claims.get_str("role") != Some(role.as_ref()) {
            warn!(expected = %role, sub = %claims.sub, "session token role mismatch");
            return Err(AuthError::Malformed);
        }

        let Some(account) = self.store.find_by_email(role, &claims.sub).await? else {
            warn!(%role, sub = %claims.sub, "session token for unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        if !account.is_active {
            warn!(%role, account_id = %account.id, "session token for inactive account");
            return Err(AuthError::InactiveAccount);
        }

        Ok(Identity { account, claims })
    }

    pub async fn register(&self, input: NewAccount) -> Result<Account> {
        let input = NewAccount {
            email: normalize_email(&input.email),
            first_name: input.first_name.trim().to_owned(),
            last_name: input.last_name.trim().to_owned(),
            ..input
        };
        input.validate()?;

        let speciality = match input.role {
            Role::Doctor => input.speciality.filter(|s| !s.trim().is_empty()),
            Role::Patient => None,
        };

        let account = Account {
            id: Ulid::new().to_string(),
            role: input.role,
            email: input.email,
            password_hash: self.hasher.hash(&input.password)?,
            first_name: input.first_name,
            last_name: input.last_name,
            speciality,
            is_active: true,
            last_login: None,
            created_at: now(),
        };

        self.store.create(&account).await?;

        info!(account_id = %account.id, role = %account.role, "account registered");

        Ok(account)
    }

    /// Replace the stored credential wholesale.
    pub async fn set_password(&self, role: Role, email: &str, password: &str) -> Result<()> {
        PasswordInput {
            password: password.to_owned(),
        }
        .validate()?;

        let account = self.require(role, email).await?;
        let password_hash = self.hasher.hash(password)?;
        self.store
            .update_password_hash(&account.id, password_hash)
            .await?;

        info!(account_id = %account.id, %role, "password changed");

        Ok(())
    }

    pub async fn set_active(&self, role: Role, email: &str, is_active: bool) -> Result<()> {
        let account = self.require(role, email).await?;
        self.store.update_active(&account.id, is_active).await?;

        info!(account_id = %account.id, %role, is_active, "account status changed");

        Ok(())
    }

    fn decoy_credential(&self) -> &str {
        self.decoy.get_or_init(|| {
            self.hasher
                .hash(&Ulid::new().to_string())
                .unwrap_or_else(|e| {
                    error!(error = %e, "failed to build decoy credential");
                    String::new()
                })
        })
    }

    async fn require(&self, role: Role, email: &str) -> Result<Account> {
        self.store
            .find_by_email(role, &normalize_email(email))
            .await?
            .ok_or(AuthError::NotFound)
    }
}
