//! Sign-up, sign-in and the signed-in session handle.
//!
//! Accounts live in the `users` table next to the rest of the data. Passwords are stored as
//! Argon2 PHC strings. The session handle, [`AuthSession`], is passed explicitly into every
//! operation that needs to know who is asking.

use crate::error::{Error, Result};
use crate::models::{NewProfile, NewUser, User};
use crate::schema::{profiles, users};
use crate::store::{self, DEFAULT_TIMEZONE, Store};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// The shortest password accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

const INVALID_CREDENTIALS: &str = "Invalid login credentials";

/// A hash that no password is checked against for real, used when a sign-in names an unknown
/// email.
static PLACEHOLDER_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("bunkr-placeholder-password").ok());

/// Proof that a user has signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

impl From<User> for AuthSession {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(Error::Validation(format!("'{email}' is not a valid email address"))),
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

impl Store {
    /// Registers a new account and its default profile, and signs it in.
    pub fn sign_up(&mut self, email: &str, password: &str) -> Result<AuthSession> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Auth(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password_hash = hash_password(password)?;
        let id = store::new_id();
        let created_at = store::now();

        let user = self.connection().transaction::<_, Error, _>(|conn| {
            let taken = users::table
                .filter(users::email.eq(&email))
                .count()
                .get_result::<i64>(conn)?
                > 0;
            if taken {
                return Err(Error::Auth("User already registered".into()));
            }

            let user = diesel::insert_into(users::table)
                .values(NewUser {
                    id: &id,
                    email: &email,
                    password_hash: &password_hash,
                    created_at,
                })
                .returning(User::as_returning())
                .get_result(conn)?;

            diesel::insert_into(profiles::table)
                .values(NewProfile {
                    id: &id,
                    full_name: None,
                    roll_no: None,
                    timezone: DEFAULT_TIMEZONE,
                    created_at,
                    updated_at: created_at,
                })
                .execute(conn)?;

            Ok(user)
        })?;

        tracing::info!(user = %user.id, "signed up");
        Ok(user.into())
    }

    /// Checks an email and password pair and returns a session for the matching account.
    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthSession> {
        let email = email.trim().to_lowercase();

        let found = users::table
            .filter(users::email.eq(&email))
            .select((User::as_select(), users::password_hash))
            .first::<(User, String)>(self.connection())
            .optional()?;

        let user = match found {
            Some((user, stored)) => verify_password(password, &stored)?.then_some(user),
            None => {
                // Unknown emails pay for a verification too.
                if let Some(placeholder) = PLACEHOLDER_HASH.as_deref() {
                    verify_password(password, placeholder)?;
                }
                None
            }
        };

        match user {
            Some(user) => {
                tracing::info!(user = %user.id, "signed in");
                Ok(user.into())
            }
            None => {
                tracing::warn!("rejected sign-in attempt");
                Err(Error::Auth(INVALID_CREDENTIALS.into()))
            }
        }
    }

    /// Looks up an account by id.
    pub fn user(&mut self, user_id: &str) -> Result<Option<User>> {
        Ok(users::table
            .find(user_id)
            .select(User::as_select())
            .first(self.connection())
            .optional()?)
    }

    /// Checks that a previously saved session still refers to an existing account, returning
    /// a refreshed session if so.
    pub fn current_user(&mut self, saved: &AuthSession) -> Result<Option<AuthSession>> {
        Ok(self.user(&saved.user_id)?.map(AuthSession::from))
    }
}

/// Keeps the signed-in session between invocations as a JSON file.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// The session file inside `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("session.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the saved session, if there is one.
    pub fn load(&self) -> Result<Option<AuthSession>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, session: &AuthSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
        Ok(())
    }

    /// Forgets the saved session. Returns whether there was one.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
