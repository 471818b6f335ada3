use thiserror::Error;

/// Every way authentication can refuse a request.
///
/// The first five variants only deny the request at hand.
/// `InvalidCredentials` covers both an unknown account and a wrong password.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Your account has been disabled. Contact support.")]
    InactiveAccount,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("malformed token")]
    Malformed,

    #[error("An account with this email already exists")]
    EmailAlreadyExists,

    #[error("account not found")]
    NotFound,

    #[error("{0}")]
    Validate(#[from] validator::ValidationErrors),

    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    Unknown(#[from] anyhow::Error),
}

impl AuthError {
    /// True for the rejections that mean "treat the caller as anonymous".
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::InactiveAccount
                | AuthError::InvalidSignature
                | AuthError::Expired
                | AuthError::Malformed
        )
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

impl From<sqlx::Error> for AuthError {
    fn from(value: sqlx::Error) -> Self {
        Self::Unknown(value.into())
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::Server(format!("password hashing failed: {value}"))
    }
}

#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::AuthError::Server(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::AuthError::Server(format!($fmt, $($arg)*)))
    };
}
