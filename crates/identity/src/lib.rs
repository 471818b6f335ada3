//! Credential verification and session tokens for doctor and patient
//! accounts.

pub mod account;
mod error;
pub mod login;
pub mod password;
pub mod token;

pub use account::{Account, AccountStore, Role};
pub use error::{AuthError, Result};
pub use login::{Authenticator, Identity, LoginInput, NewAccount, Session, normalize_email};
pub use password::{CredentialHasher, hash_password, verify_password};
pub use token::{SessionAuthority, SessionClaims, strip_bearer};
