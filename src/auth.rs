use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};
use argon2::password_hash::rand_core::OsRng;
use argon2::Argon2;
use sha1::{Digest, Sha1};
use sha2::Sha256;
use thiserror::Error;

use crate::database::{Database, DatabaseError};
use crate::models::ActivityEntry;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Password hashing error: {0}")]
    HashError(String),
}

/// The authenticated context for one user, created by [`authenticate`] and
/// dropped when the caller is done with it. Passed to every operation that
/// acts on behalf of a user.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub role: String,
    pub email: String,
}

/// Hash a password with Argon2id, returning a PHC-format string
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::HashError(e.to_string()))
}

/// Check a password against a stored hash. Accepts Argon2 PHC strings as
/// well as the two legacy digest formats that predate them (hex SHA-1 and
/// hex SHA-256); see [`is_legacy_hash`].
pub fn verify_password(password: &str, stored: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(stored) {
        return Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();
    }
    legacy_digest_matches(password, stored)
}

/// Whether a stored hash is one of the legacy unsalted digests (40 hex
/// chars = SHA-1, 64 hex chars = SHA-256). PHC strings start with '$' so
/// the two shapes cannot be confused.
pub fn is_legacy_hash(stored: &str) -> bool {
    matches!(stored.len(), 40 | 64) && stored.chars().all(|c| c.is_ascii_hexdigit())
}

fn legacy_digest_matches(password: &str, stored: &str) -> bool {
    let digest = match stored.len() {
        40 => hex_string(&Sha1::digest(password.as_bytes())),
        64 => hex_string(&Sha256::digest(password.as_bytes())),
        _ => return false,
    };
    digest.eq_ignore_ascii_case(stored)
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Verify credentials against the user store.
///
/// Returns `Ok(None)` on unknown username or wrong password alike, so a
/// caller cannot tell the two apart. On success the login is recorded in
/// the activity log, and a stored legacy digest is replaced with a fresh
/// Argon2id hash of the password that just verified.
pub fn authenticate(
    db: &Database,
    username: &str,
    password: &str,
) -> Result<Option<Session>, AuthError> {
    let Some(user) = db.get_user(username)? else {
        return Ok(None);
    };

    if !verify_password(password, &user.password_hash) {
        return Ok(None);
    }

    if is_legacy_hash(&user.password_hash) {
        let upgraded = hash_password(password)?;
        db.update_password_hash(username, &upgraded)?;
    }

    db.insert_activity(&ActivityEntry::new(
        user.username.clone(),
        "login".to_string(),
    ))?;

    Ok(Some(Session {
        username: user.username,
        role: user.role,
        email: user.email,
    }))
}

/// Provision a user with an Argon2id-hashed password. Fails if the
/// username is already taken.
pub fn create_user(
    db: &Database,
    username: &str,
    password: &str,
    role: &str,
    email: &str,
) -> Result<(), AuthError> {
    let user = crate::models::User {
        username: username.to_string(),
        password_hash: hash_password(password)?,
        role: role.to_string(),
        email: email.to_string(),
    };
    db.insert_user(&user)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    #[test]
    fn authenticate_succeeds_only_with_the_right_password() {
        let db = Database::open_in_memory().unwrap();
        create_user(&db, "alice", "pw1", "manager", "alice@example.com").unwrap();

        let session = authenticate(&db, "alice", "pw1").unwrap().unwrap();
        assert_eq!(session.username, "alice");
        assert_eq!(session.role, "manager");
        assert_eq!(session.email, "alice@example.com");

        assert!(authenticate(&db, "alice", "wrong").unwrap().is_none());
        assert!(authenticate(&db, "nobody", "pw1").unwrap().is_none());
    }

    #[test]
    fn login_is_recorded_in_the_activity_log() {
        let db = Database::open_in_memory().unwrap();
        create_user(&db, "alice", "pw1", "member", "alice@example.com").unwrap();

        authenticate(&db, "alice", "pw1").unwrap().unwrap();

        let recent = db.recent_activity(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].username, "alice");
        assert_eq!(recent[0].action, "login");
    }

    #[test]
    fn legacy_sha256_hashes_are_migrated_on_login() {
        let db = Database::open_in_memory().unwrap();
        let legacy = hex_string(&Sha256::digest(b"pw1"));
        assert!(is_legacy_hash(&legacy));
        db.insert_user(&User {
            username: "bob".to_string(),
            password_hash: legacy,
            role: "member".to_string(),
            email: "bob@example.com".to_string(),
        })
        .unwrap();

        assert!(authenticate(&db, "bob", "pw1").unwrap().is_some());

        let stored = db.get_user("bob").unwrap().unwrap().password_hash;
        assert!(stored.starts_with("$argon2"));
        // Same password still works against the upgraded hash
        assert!(authenticate(&db, "bob", "pw1").unwrap().is_some());
        assert!(authenticate(&db, "bob", "pw2").unwrap().is_none());
    }

    #[test]
    fn legacy_sha1_hashes_are_migrated_on_login() {
        let db = Database::open_in_memory().unwrap();
        let legacy = hex_string(&Sha1::digest(b"pw1"));
        assert!(is_legacy_hash(&legacy));
        db.insert_user(&User {
            username: "carol".to_string(),
            password_hash: legacy,
            role: "member".to_string(),
            email: "carol@example.com".to_string(),
        })
        .unwrap();

        assert!(authenticate(&db, "carol", "wrong").unwrap().is_none());
        assert!(authenticate(&db, "carol", "pw1").unwrap().is_some());
        let stored = db.get_user("carol").unwrap().unwrap().password_hash;
        assert!(stored.starts_with("$argon2"));
    }

    #[test]
    fn duplicate_provisioning_fails() {
        let db = Database::open_in_memory().unwrap();
        create_user(&db, "alice", "pw1", "member", "alice@example.com").unwrap();
        assert!(create_user(&db, "alice", "pw2", "member", "alice@example.com").is_err());
    }
}
