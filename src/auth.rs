//! Credential checks for the seeded local accounts.
//!
//! This is deliberately a stub tier: SHA-256 digests over seeded passwords,
//! no sessions, no tokens. Real identity lives outside the core.

use sha2::{Digest, Sha256};

use crate::db::repos::users;
use crate::db::models::User;
use crate::db::DbPool;
use crate::error::AppError;

pub(crate) fn digest(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

fn invalid_credentials() -> AppError {
    // Uniform message: never reveal whether the email or the password failed
    AppError::Validation("invalid credentials".into())
}

/// Check an email/password pair and stamp `last_login` on success.
pub fn login(pool: &DbPool, email: &str, password: &str) -> Result<User, AppError> {
    let user = users::get_by_email(pool, email).map_err(|e| match e {
        AppError::NotFound(_) => invalid_credentials(),
        other => other,
    })?;

    if user.password_digest != digest(password) {
        tracing::debug!(email, "rejected login attempt");
        return Err(invalid_credentials());
    }

    users::touch_last_login(pool, &user.id)?;
    users::get_by_id(pool, &user.id)
}
