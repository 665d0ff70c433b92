//! Staff login, bearer token verification and logout.

use crate::server::database::store::{Store, StoreError};
use crate::server::model::staff::{AuthUser, Session, StaffAccount};
use crate::server::util::time::helper::get_utc_now;
use chrono::Duration;
use derive_more::{Display, Error};
use log::{info, warn};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;

#[derive(Debug, Display, Error)]
pub enum AuthError {
    #[display("invalid email or password")]
    InvalidCredentials,
    #[display("missing authorization header")]
    MissingToken,
    #[display("invalid token")]
    InvalidToken,
    #[display("{_0}")]
    Store(#[error(source)] StoreError),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{b:02x}")).collect()
}

pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Builds credentials for a new account.
pub fn new_credentials(password: &str) -> (String, String) {
    let salt = random_hex(16);
    let hash = hash_password(&salt, password);
    (hash, salt)
}

pub struct Authenticator {
    store: Arc<dyn Store>,
    session_ttl: Duration,
}

impl Authenticator {
    pub fn new(store: Arc<dyn Store>, session_ttl_hours: i64) -> Self {
        Self {
            store,
            session_ttl: Duration::hours(session_ttl_hours),
        }
    }

    /// Returns a fresh bearer token for valid credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, AuthUser), AuthError> {
        let account = self
            .store
            .find_staff_by_email(email.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let StaffAccount {
            user,
            password_hash,
            salt,
        } = account;
        if hash_password(&salt, password) != password_hash {
            warn!("failed login for staff={}", user.id);
            return Err(AuthError::InvalidCredentials);
        }
        let token = random_hex(32);
        self.store
            .insert_session(Session {
                token_hash: hash_token(&token),
                staff_id: user.id,
                expires_at: get_utc_now() + self.session_ttl,
            })
            .await?;
        info!("staff={} logged in to hotel={}", user.id, user.hotel_id);
        Ok((token, user))
    }

    pub async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        let token_hash = hash_token(token);
        let session = self
            .store
            .find_session(&token_hash)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        if session.expires_at <= get_utc_now() {
            self.store.delete_session(&token_hash).await?;
            return Err(AuthError::InvalidToken);
        }
        self.store
            .get_staff(session.staff_id)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        if !self.store.delete_session(&hash_token(token)).await? {
            return Err(AuthError::InvalidToken);
        }
        Ok(())
    }

    /// Drops every expired session, returns how many were removed.
    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        Ok(self.store.purge_expired_sessions(get_utc_now()).await?)
    }
}
