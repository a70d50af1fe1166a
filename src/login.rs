#![cfg(feature = "web")]

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use lazy_static::lazy_static;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Name of the cookie that carries the admin session id
pub const SESSION_COOKIE: &str = "session";

// How long an admin stays logged in
const SESSION_DURATION: u64 = 24 * 60 * 60; // 24 hours in seconds

/// An admin session
///
/// The site has a single shared admin account, so a session only needs to
/// remember when it stops being valid.
#[derive(Debug, Clone)]
pub struct Session {
    /// Time when the session expires
    pub expires_at: SystemTime,
}

/// Global sessions storage
///
/// Stores all active admin sessions in a thread-safe map.
lazy_static! {
    static ref SESSIONS: RwLock<HashMap<String, Session>> = RwLock::new(HashMap::new());
}

/// Login form data: the shared admin password
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// Hash a password using Argon2
///
/// Creates a cryptographically secure hash of a password using Argon2id.
/// The server hashes the configured admin password once at startup and only
/// keeps the hash in memory.
///
/// # Arguments
/// * `password` - The plaintext password to hash
///
/// # Returns
/// * `Result<String, String>` - The password hash or an error
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    match argon2.hash_password(password.as_bytes(), &salt) {
        Ok(hash) => Ok(hash.to_string()),
        Err(_) => Err("Password hashing failed".to_string()),
    }
}

/// Verify a password against a stored hash
///
/// Checks if a plaintext password matches a stored Argon2 hash.
///
/// # Arguments
/// * `password` - The plaintext password to verify
/// * `hash` - The stored password hash to check against
///
/// # Returns
/// * `Result<bool, String>` - True if the password matches, false if not, or an error
///
/// # Errors
/// * Returns an error if the hash is in an invalid format
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(hash) => hash,
        Err(_) => return Err("Invalid password hash format".to_string()),
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(_) => Ok(false), // Password didn't match
    }
}

/// Create a new admin session
///
/// # Returns
/// * `String` - A unique session ID to hand back as a cookie
pub fn create_session() -> String {
    let session_id = Uuid::new_v4().to_string();
    let expires_at = SystemTime::now() + Duration::from_secs(SESSION_DURATION);

    let mut sessions = SESSIONS.write().unwrap();
    sessions.insert(session_id.clone(), Session { expires_at });

    session_id
}

/// Validate a session
///
/// Checks if a session exists and has not expired.
///
/// # Arguments
/// * `session_id` - The session ID to validate
///
/// # Returns
/// * `bool` - Whether the session grants admin access
pub fn validate_session(session_id: &str) -> bool {
    let sessions = SESSIONS.read().unwrap();

    if let Some(session) = sessions.get(session_id) {
        return session.expires_at > SystemTime::now();
    }

    false
}

/// Remove a session, logging its holder out
pub fn destroy_session(session_id: &str) {
    let mut sessions = SESSIONS.write().unwrap();
    sessions.remove(session_id);
}

/// Authentication middleware for the admin API
///
/// Lets a request through when the session cookie names a live admin
/// session, otherwise answers 401 without touching the handler.
///
/// # Arguments
/// * `jar` - Cookie jar containing session information
/// * `request` - The incoming request
/// * `next` - Next middleware in the chain
///
/// # Returns
/// * `Response` - Either the handler's response or a 401 error
pub async fn require_admin(
    jar: CookieJar,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        if validate_session(session_cookie.value()) {
            return next.run(request).await;
        }
    }

    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "Unauthorized" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("suisui2025").unwrap();
        assert!(verify_password("suisui2025", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[test]
    fn sessions_validate_until_destroyed() {
        let id = create_session();
        assert!(validate_session(&id));

        destroy_session(&id);
        assert!(!validate_session(&id));
        assert!(!validate_session("never-issued"));
    }

    #[test]
    fn expired_sessions_are_rejected() {
        let id = Uuid::new_v4().to_string();
        {
            let mut sessions = SESSIONS.write().unwrap();
            sessions.insert(
                id.clone(),
                Session {
                    expires_at: SystemTime::now() - Duration::from_secs(1),
                },
            );
        }
        assert!(!validate_session(&id));
    }
}
