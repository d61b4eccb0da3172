//! User account types and password handling.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::UserError;

/// Base URL for avatar images; the hashed email is appended.
pub const PHOTO_BASE_URL: &str = "https://www.gravatar.com/avatar/";

const MIN_PASSWORD_LEN: usize = 6;

/// A user account.
///
/// `email` and `pass_hash` are never written to JSON, so they do not leak
/// into API responses or serialized session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(skip)]
    pub email: String,
    #[serde(skip)]
    pub pass_hash: String,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: String,
}

impl User {
    /// Hash `password` and store the hash on the user.
    pub fn set_password(&mut self, password: &str) -> Result<(), UserError> {
        self.pass_hash = hash_password(password)?;
        Ok(())
    }

    /// Check `password` against the stored hash.
    pub fn authenticate(&self, password: &str) -> Result<(), UserError> {
        let parsed =
            PasswordHash::new(&self.pass_hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| UserError::InvalidCredentials)
    }
}

/// Hash a password into a PHC string with Argon2 and a random salt.
pub fn hash_password(password: &str) -> Result<String, UserError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| UserError::PasswordHash(e.to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| UserError::PasswordHash(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

fn photo_url(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    format!(
        "{}{}",
        PHOTO_BASE_URL,
        hex::encode(Sha256::digest(normalized.as_bytes()))
    )
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Sign-in credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// A user signing up for an account.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub password_conf: String,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), UserError> {
        if !is_valid_email(&self.email) {
            return Err(UserError::Invalid(format!(
                "invalid email address: '{}'",
                self.email
            )));
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(UserError::Invalid(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.password != self.password_conf {
            return Err(UserError::Invalid("passwords do not match".into()));
        }
        if self.user_name.is_empty() {
            return Err(UserError::Invalid("user name may not be empty".into()));
        }
        if self.user_name.contains(' ') {
            return Err(UserError::Invalid("user name may not contain spaces".into()));
        }
        Ok(())
    }

    /// Validate and convert into a [`User`] with the given id.
    pub fn to_user(&self, id: i64) -> Result<User, UserError> {
        self.validate()?;

        let mut user = User {
            id,
            email: self.email.clone(),
            pass_hash: String::new(),
            user_name: self.user_name.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            photo_url: photo_url(&self.email),
        };
        user.set_password(&self.password)?;
        Ok(user)
    }
}

/// A user entry in the configuration file, with an already hashed password.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSeed {
    pub id: i64,
    pub email: String,
    pub pass_hash: String,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<UserSeed> for User {
    fn from(seed: UserSeed) -> Self {
        let photo_url = photo_url(&seed.email);
        Self {
            id: seed.id,
            email: seed.email,
            pass_hash: seed.pass_hash,
            user_name: seed.user_name,
            first_name: seed.first_name,
            last_name: seed.last_name,
            photo_url,
        }
    }
}
