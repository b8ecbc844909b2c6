use lazy_static::lazy_static;
use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use regex::Regex;
use sha2::Sha256;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::db::Database;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").unwrap();
}

const SALT_BYTES: usize = 32;
const HASH_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("all fields are required")]
    MissingFields,
    #[error("invalid email format")]
    InvalidEmail,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("password must be at least {0} characters long")]
    PasswordTooShort(usize),
    #[error("username already exists")]
    UsernameTaken,
    #[error("email already exists")]
    EmailTaken,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub struct Registration<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

pub fn generate_salt() -> String {
    let mut salt = [0u8; SALT_BYTES];
    rand::rng().fill(&mut salt);
    hex::encode(salt)
}

/// PBKDF2-HMAC-SHA256 over the hex salt string, hex encoded.
pub fn hash_password(password: &str, salt: &str, iterations: u32) -> String {
    let mut key = [0u8; HASH_BYTES];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
    hex::encode(key)
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub struct Authenticator {
    iterations: u32,
    min_password_len: usize,
}

impl Authenticator {
    pub fn new(iterations: u32, min_password_len: usize) -> Self {
        Self {
            iterations,
            min_password_len,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.pbkdf2_iterations, config.min_password_len)
    }

    pub fn register(&self, db: &Database, form: &Registration<'_>) -> Result<(), AuthError> {
        let username = form.username.trim();
        let email = form.email.trim();

        if username.is_empty()
            || email.is_empty()
            || form.password.is_empty()
            || form.confirm_password.is_empty()
        {
            return Err(AuthError::MissingFields);
        }
        if !validate_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        if form.password != form.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        if form.password.chars().count() < self.min_password_len {
            return Err(AuthError::PasswordTooShort(self.min_password_len));
        }

        let salt = generate_salt();
        let password_hash = hash_password(form.password, &salt, self.iterations);

        match db.create_user(username, email, &password_hash, &salt) {
            Ok(()) => {
                info!("Registered user {}", username);
                Ok(())
            }
            Err(e) if e.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) => {
                let message = e.to_string();
                if message.contains("users.username") {
                    Err(AuthError::UsernameTaken)
                } else if message.contains("users.email") {
                    Err(AuthError::EmailTaken)
                } else {
                    Err(AuthError::Storage(e))
                }
            }
            Err(e) => Err(AuthError::Storage(e)),
        }
    }

    /// Returns the trimmed username on success.
    pub fn login(&self, db: &Database, username: &str, password: &str) -> Result<String, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let Some((stored_hash, salt)) = db.get_credentials(username)? else {
            warn!("Login attempt for unknown user {}", username);
            return Err(AuthError::InvalidCredentials);
        };

        if hash_password(password, &salt, self.iterations) == stored_hash {
            info!("User {} logged in", username);
            Ok(username.to_string())
        } else {
            warn!("Failed login for {}", username);
            Err(AuthError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> Authenticator {
        Authenticator::new(1_000, 8)
    }

    fn form<'a>(username: &'a str, email: &'a str, password: &'a str) -> Registration<'a> {
        Registration {
            username,
            email,
            password,
            confirm_password: password,
        }
    }

    #[test]
    fn pbkdf2_sha256_reference_vector() {
        assert_eq!(
            hash_password("password", "salt", 1),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
    }

    #[test]
    fn salts_are_random_hex() {
        let a = generate_salt();
        let b = generate_salt();
        assert_eq!(a.len(), SALT_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("ana.b+fit@example.co.uk"));
        assert!(!validate_email("ana@"));
        assert!(!validate_email("not an email"));
    }

    #[test]
    fn register_then_login() {
        let db = Database::open_in_memory().unwrap();
        auth()
            .register(&db, &form("ana", "ana@example.com", "correct horse"))
            .unwrap();

        assert_eq!(auth().login(&db, " ana ", "correct horse").unwrap(), "ana");
        assert!(matches!(
            auth().login(&db, "ana", "wrong horse"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth().login(&db, "ben", "correct horse"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth().login(&db, "", "x"),
            Err(AuthError::MissingFields)
        ));
    }

    #[test]
    fn registration_validation() {
        let db = Database::open_in_memory().unwrap();
        let a = auth();

        assert!(matches!(
            a.register(&db, &form("", "ana@example.com", "password1")),
            Err(AuthError::MissingFields)
        ));
        assert!(matches!(
            a.register(&db, &form("ana", "nope", "password1")),
            Err(AuthError::InvalidEmail)
        ));
        assert!(matches!(
            a.register(&db, &form("ana", "ana@example.com", "short")),
            Err(AuthError::PasswordTooShort(8))
        ));

        let mismatch = Registration {
            username: "ana",
            email: "ana@example.com",
            password: "password1",
            confirm_password: "password2",
        };
        assert!(matches!(
            a.register(&db, &mismatch),
            Err(AuthError::PasswordMismatch)
        ));
    }

    #[test]
    fn duplicates_are_reported_distinctly() {
        let db = Database::open_in_memory().unwrap();
        let a = auth();
        a.register(&db, &form("ana", "ana@example.com", "password1"))
            .unwrap();

        assert!(matches!(
            a.register(&db, &form("ana", "other@example.com", "password1")),
            Err(AuthError::UsernameTaken)
        ));
        assert!(matches!(
            a.register(&db, &form("ben", "ana@example.com", "password1")),
            Err(AuthError::EmailTaken)
        ));
    }
}
