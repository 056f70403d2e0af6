//! User entity and requests.
//!
//! Users are immutable once created; there is no update path. Passwords are
//! hashed with argon2 at registration and only the hash and salt are kept,
//! as opaque byte sequences.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};

use stockroom_core::{CacheKey, KeyEncoder, UserId};

use crate::domain::clamp_page;
use crate::error::{Error, Result};

/// Minimum password length accepted at registration.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum age a user must have.
const MIN_AGE: i32 = 18;

/// A registered user.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub is_married: bool,
    /// Argon2 PHC string, stored as opaque bytes.
    pub password_hash: Vec<u8>,
    pub salt: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// First and last name joined with a space.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }

    /// Verify a plaintext password against the stored hash.
    ///
    /// Any parse failure of the stored hash counts as a mismatch.
    #[must_use]
    pub fn verify_password(&self, password: &str) -> bool {
        let Ok(encoded) = std::str::from_utf8(&self.password_hash) else {
            return false;
        };
        let Ok(parsed) = PasswordHash::new(encoded) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Request to register a new user.
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub is_married: bool,
    pub password: String,
}

impl CreateUserRequest {
    /// Validate the request without constructing anything.
    ///
    /// # Errors
    ///
    /// Returns `Error::UserValidation` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.first_name.trim().is_empty() {
            return Err(Error::UserValidation("first name is required".into()));
        }
        if self.last_name.trim().is_empty() {
            return Err(Error::UserValidation("last name is required".into()));
        }
        if self.age < MIN_AGE {
            return Err(Error::UserValidation(format!(
                "user must be at least {MIN_AGE} years old"
            )));
        }
        if self.password.len() < MIN_PASSWORD_LENGTH {
            return Err(Error::UserValidation(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters long"
            )));
        }
        Ok(())
    }

    /// Validate and build the [`User`], assigning identity, creation time,
    /// and the password hash.
    ///
    /// # Errors
    ///
    /// Returns `Error::UserValidation` on invalid input or a hashing failure.
    pub fn into_user(self) -> Result<User> {
        self.validate()?;
        let (password_hash, salt) = hash_password(&self.password)?;
        Ok(User {
            id: UserId::generate(),
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            age: self.age,
            is_married: self.is_married,
            password_hash,
            salt,
            created_at: Utc::now(),
        })
    }
}

/// Hash a password with a fresh random salt.
///
/// Returns the PHC-encoded hash and the salt, both as opaque bytes. The PHC
/// string embeds the salt as well; the separate copy satisfies the stored
/// schema.
fn hash_password(password: &str) -> Result<(Vec<u8>, Vec<u8>)> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::UserValidation(format!("failed to hash password: {e}")))?;
    Ok((
        hash.to_string().into_bytes(),
        salt.as_str().as_bytes().to_vec(),
    ))
}

/// Filter for listing/counting users.
#[derive(Debug, Clone, Default)]
pub struct ListUsersRequest {
    pub ids: Vec<UserId>,
    pub limit: i64,
    pub offset: i64,
}

impl ListUsersRequest {
    /// Copy of the request with pagination clamped.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let (limit, offset) = clamp_page(self.limit, self.offset);
        Self {
            ids: self.ids.clone(),
            limit,
            offset,
        }
    }

    /// Content digest of all filter fields. Call on a normalized request.
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        let mut enc = KeyEncoder::new();
        enc.uuids(self.ids.iter().map(UserId::as_uuid));
        enc.u32(u32::try_from(self.limit).unwrap_or(u32::MAX));
        enc.u32(u32::try_from(self.offset).unwrap_or(u32::MAX));
        enc.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_request() -> CreateUserRequest {
        CreateUserRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            age: 28,
            is_married: true,
            password: "correct horse battery".into(),
        }
    }

    #[test]
    fn builds_user_from_valid_request() {
        let user = valid_request().into_user().unwrap();
        assert_eq!(user.full_name(), "Ada Lovelace");
        assert!(!user.password_hash.is_empty());
        assert!(!user.salt.is_empty());
    }

    #[test]
    fn rejects_blank_names() {
        let mut req = valid_request();
        req.first_name = "   ".into();
        assert!(matches!(req.validate(), Err(Error::UserValidation(_))));

        let mut req = valid_request();
        req.last_name = String::new();
        assert!(matches!(req.validate(), Err(Error::UserValidation(_))));
    }

    #[test]
    fn rejects_minors() {
        let mut req = valid_request();
        req.age = 17;
        assert!(matches!(req.validate(), Err(Error::UserValidation(_))));
    }

    #[test]
    fn rejects_short_password() {
        let mut req = valid_request();
        req.password = "short".into();
        assert!(matches!(req.validate(), Err(Error::UserValidation(_))));
    }

    #[test]
    fn password_verifies_after_hashing() {
        let user = valid_request().into_user().unwrap();
        assert!(user.verify_password("correct horse battery"));
        assert!(!user.verify_password("wrong password"));
    }

    #[test]
    fn names_are_trimmed() {
        let mut req = valid_request();
        req.first_name = "  Ada ".into();
        let user = req.into_user().unwrap();
        assert_eq!(user.first_name, "Ada");
    }

    #[test]
    fn cache_key_ignores_nothing() {
        let base = ListUsersRequest {
            ids: vec![UserId::generate()],
            limit: 10,
            offset: 0,
        };
        assert_eq!(base.cache_key(), base.cache_key());

        let mut shifted = base.clone();
        shifted.offset = 10;
        assert_ne!(base.cache_key(), shifted.cache_key());
    }

    #[test]
    fn normalization_makes_equivalent_requests_equal() {
        // limit 0 defaults to 10; an explicit 10 must hash identically
        let implicit = ListUsersRequest::default().normalized();
        let explicit = ListUsersRequest {
            ids: vec![],
            limit: 10,
            offset: -3,
        }
        .normalized();
        assert_eq!(implicit.cache_key(), explicit.cache_key());
    }
}
