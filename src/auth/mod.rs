use argon2::{
    password_hash::{rand_core::{OsRng, RngCore}, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::{NewToken, User};
use crate::database::store::{Store, StoreError};

/// Raw tokens are 20 random bytes rendered as 40 lowercase hex characters
pub const TOKEN_BYTES: usize = 20;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unable to authenticate with provided credentials")]
    InvalidCredentials,

    #[error("invalid token")]
    InvalidToken,

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Identity of an authenticated request.
///
/// Only [`resolve`] builds one, so holding a `Caller` proves the request
/// presented a live token.
#[derive(Debug, Clone)]
pub struct Caller {
    user: User,
    token_digest: String,
}

impl Caller {
    pub(crate) fn new(user: User, token_digest: String) -> Self {
        Self { user, token_digest }
    }

    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Digest of the token this request authenticated with
    pub fn token_digest(&self) -> &str {
        &self.token_digest
    }
}

/// Hash a password using argon2id
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Hash checked when the email is unknown so both rejections cost one argon2 verify
static UNKNOWN_USER_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("unknown-user-placeholder").ok());

/// Verify a password against a stored hash; an unparsable hash never matches
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

/// A freshly generated token: the raw value goes to the client, the digest to the store
pub struct IssuedToken {
    pub raw: String,
    pub digest: String,
}

pub fn generate_token() -> IssuedToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let raw: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    let digest = digest_token(&raw);
    IssuedToken { raw, digest }
}

/// SHA-256 of the raw token, hex encoded
pub fn digest_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Structural check done before touching the store
pub fn is_well_formed(raw: &str) -> bool {
    raw.len() == TOKEN_BYTES * 2 && raw.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Exchange credentials for a new opaque token
pub async fn issue_token(
    store: &dyn Store,
    security: &SecurityConfig,
    email: &str,
    password: &str,
) -> Result<String, AuthError> {
    let user = match store.find_user_by_email(email).await? {
        Some(user) if verify_password(password, &user.password_hash) && user.is_active => user,
        Some(_) => {
            tracing::warn!("Rejected credentials for '{}'", email);
            return Err(AuthError::InvalidCredentials);
        }
        None => {
            if let Some(hash) = UNKNOWN_USER_HASH.as_deref() {
                let _ = verify_password(password, hash);
            }
            tracing::warn!("Rejected credentials for '{}'", email);
            return Err(AuthError::InvalidCredentials);
        }
    };

    let issued = generate_token();
    let expires_at = match security.token_ttl_hours {
        Some(hours) => {
            let expiry = expiry_after(hours);
            if expiry.is_none() {
                tracing::warn!("Token lifetime of {} hours is out of range; issuing a non-expiring token", hours);
            }
            expiry
        }
        None => None,
    };

    store
        .insert_token(NewToken {
            digest: issued.digest,
            user_id: user.id,
            expires_at,
        })
        .await?;

    tracing::info!("Issued token for user {}", user.id);
    Ok(issued.raw)
}

/// Expiry `hours` from now, or `None` when that instant is not representable
pub fn expiry_after(hours: u64) -> Option<DateTime<Utc>> {
    let hours = i64::try_from(hours).ok()?;
    Utc::now().checked_add_signed(Duration::try_hours(hours)?)
}

/// Resolve a raw bearer token to the calling user
pub async fn resolve(store: &dyn Store, raw: &str) -> Result<Caller, AuthError> {
    if !is_well_formed(raw) {
        return Err(AuthError::InvalidToken);
    }

    let digest = digest_token(raw);
    match store.user_for_token(&digest, Utc::now()).await? {
        Some(user) if user.is_active => Ok(Caller::new(user, digest)),
        _ => Err(AuthError::InvalidToken),
    }
}
