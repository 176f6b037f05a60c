//! Username/password directory backing the login endpoint.
//!
//! Account management itself lives in the business service; this directory
//! only answers "do these credentials name an account, and with which role".

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use thiserror::Error;

use atelier_core::Username;

use crate::{Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// Unknown user or wrong password. Deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

pub trait CredentialDirectory: Send + Sync {
    fn authenticate(&self, username: &Username, password: &str) -> Result<Principal, LoginError>;
}

/// Produce an Argon2 PHC string for `password` with a random salt.
pub fn hash_password(password: &str) -> Result<String, LoginError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| LoginError::Hashing(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| LoginError::Hashing(e.to_string()))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| LoginError::Hashing(e.to_string()))?
        .to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[derive(Debug, Clone)]
struct Account {
    password_hash: String,
    role: Role,
}

/// In-memory directory seeded at startup (or per test).
#[derive(Debug, Default)]
pub struct InMemoryCredentialDirectory {
    accounts: RwLock<HashMap<Username, Account>>,
}

impl InMemoryCredentialDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an account, hashing the password.
    pub fn register(
        &self,
        username: Username,
        password: &str,
        role: Role,
    ) -> Result<(), LoginError> {
        let password_hash = hash_password(password)?;
        tracing::debug!(%username, %role, "account registered");
        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(username, Account { password_hash, role });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.accounts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialDirectory for InMemoryCredentialDirectory {
    fn authenticate(&self, username: &Username, password: &str) -> Result<Principal, LoginError> {
        let account = self
            .accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(username)
            .cloned()
            .ok_or(LoginError::InvalidCredentials)?;

        if verify_password(&account.password_hash, password) {
            Ok(Principal::new(username.clone(), account.role))
        } else {
            Err(LoginError::InvalidCredentials)
        }
    }
}
