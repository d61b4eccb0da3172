//! User accounts consumed by the sign-in flow.
//!
//! The gateway only needs to look users up and check their passwords; the
//! account database itself lives behind the [`UserStore`] trait.

mod store;
mod user;

pub use store::{MemoryUserStore, UserStore};
pub use user::{hash_password, Credentials, NewUser, User, UserSeed, PHOTO_BASE_URL};

use thiserror::Error;

/// User store and credential errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserError {
    /// No user matches the lookup.
    #[error("user not found")]
    NotFound,

    /// Email or password is wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// New user data failed validation.
    #[error("invalid user: {0}")]
    Invalid(String),

    /// Password hashing or hash parsing failed.
    #[error("password hash error: {0}")]
    PasswordHash(String),

    /// Another account already uses the email.
    #[error("email already registered")]
    EmailTaken,

    /// The user backend failed.
    #[error("user store failure: {0}")]
    Backend(String),
}
