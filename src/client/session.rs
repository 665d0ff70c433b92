//! Session context: the staff member this client acts for.
//!
//! A context is built explicitly and shared by reference. Its persisted token
//! is checked against `/auth/me` at most once, no matter how many callers
//! race on [`SessionContext::initialize`].

use crate::client::token::TokenStore;
use crate::client::{Backend, ClientError};
use crate::server::model::staff::{AuthUser, LoginResponse};
use log::{info, warn};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::OnceCell;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Verified(AuthUser),
    Anonymous,
    /// the server was unreachable; the token is kept and a new context
    /// checks it again
    Offline,
    Disposed,
}

pub struct SessionContext {
    backend: Arc<dyn Backend>,
    tokens: Arc<dyn TokenStore>,
    init: OnceCell<()>,
    state: RwLock<SessionState>,
}

impl SessionContext {
    pub fn new(backend: Arc<dyn Backend>, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            backend,
            tokens,
            init: OnceCell::new(),
            state: RwLock::new(SessionState::Uninitialized),
        }
    }

    pub async fn initialize(&self) -> SessionState {
        self.init.get_or_init(|| self.verify_persisted()).await;
        self.state()
    }

    async fn verify_persisted(&self) {
        let next = match self.tokens.load() {
            None => SessionState::Anonymous,
            Some(token) => match self.backend.me(&token).await {
                // a login or logout replaced the token while it was checked
                _ if self.tokens.load().as_deref() != Some(token.as_str()) => return,
                Ok(user) => {
                    info!("session restored for staff={}", user.id);
                    SessionState::Verified(user)
                }
                Err(ClientError::Unauthorized) => {
                    self.tokens.clear();
                    SessionState::Anonymous
                }
                Err(e) => {
                    warn!("could not verify the stored session, {}", e);
                    SessionState::Offline
                }
            },
        };
        self.transition(next);
    }

    fn transition(&self, next: SessionState) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if *state != SessionState::Disposed {
            *state = next;
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.init.initialized()
    }

    pub fn user(&self) -> Option<AuthUser> {
        match self.state() {
            SessionState::Verified(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.tokens.load()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthUser, ClientError> {
        let LoginResponse { token, user } = self.backend.login(email, password).await?;
        self.tokens.save(&token);
        self.transition(SessionState::Verified(user.clone()));
        // a fresh login needs no verification round trip
        let _ = self.init.set(());
        Ok(user)
    }

    /// Ends the session locally even when the server cannot be told.
    pub async fn logout(&self) {
        if let Some(token) = self.tokens.load() {
            match self.backend.logout(&token).await {
                Ok(()) | Err(ClientError::Unauthorized) => {}
                Err(e) => warn!("server side logout failed, {}", e),
            }
        }
        self.tokens.clear();
        self.transition(SessionState::Anonymous);
    }

    pub fn dispose(&self) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = SessionState::Disposed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{user, FakeBackend};
    use crate::client::token::MemoryTokenStore;
    use crate::tenant::TenantLookup;

    fn context(backend: &Arc<FakeBackend>, tokens: &Arc<MemoryTokenStore>) -> SessionContext {
        SessionContext::new(backend.clone(), tokens.clone())
    }

    #[tokio::test]
    async fn concurrent_initialize_calls_me_once() {
        let backend = Arc::new(FakeBackend::new(Ok(user(1)), Ok(TenantLookup::MainDomain)));
        let tokens = Arc::new(MemoryTokenStore::with_token("t"));
        let session = context(&backend, &tokens);
        assert_eq!(session.state(), SessionState::Uninitialized);

        let (a, b) = tokio::join!(session.initialize(), session.initialize());
        assert_eq!(a, SessionState::Verified(user(1)));
        assert_eq!(b, a);
        assert_eq!(session.initialize().await, a);
        assert_eq!(backend.me_calls(), 1);
        assert!(session.is_initialized());
    }

    #[tokio::test]
    async fn no_token_means_anonymous_without_a_request() {
        let backend = Arc::new(FakeBackend::new(Ok(user(1)), Ok(TenantLookup::MainDomain)));
        let tokens = Arc::new(MemoryTokenStore::default());
        let session = context(&backend, &tokens);
        assert_eq!(session.initialize().await, SessionState::Anonymous);
        assert_eq!(backend.me_calls(), 0);
    }

    #[tokio::test]
    async fn rejected_token_is_cleared() {
        let backend = Arc::new(FakeBackend::new(Err(ClientError::Unauthorized), Ok(TenantLookup::MainDomain)));
        let tokens = Arc::new(MemoryTokenStore::with_token("stale"));
        let session = context(&backend, &tokens);
        assert_eq!(session.initialize().await, SessionState::Anonymous);
        assert_eq!(tokens.load(), None);
    }

    #[tokio::test]
    async fn network_failure_keeps_the_token() {
        let backend = Arc::new(FakeBackend::new(
            Err(ClientError::Network {
                reason: "connection refused".to_string(),
            }),
            Ok(TenantLookup::MainDomain),
        ));
        let tokens = Arc::new(MemoryTokenStore::with_token("t"));
        let session = context(&backend, &tokens);
        assert_eq!(session.initialize().await, SessionState::Offline);
        assert_eq!(tokens.load().as_deref(), Some("t"));
        assert!(!session.is_authenticated());

        // once the server is back a fresh context verifies the kept token
        *backend.me_result.lock().unwrap() = Ok(user(1));
        let session = context(&backend, &tokens);
        assert_eq!(session.initialize().await, SessionState::Verified(user(1)));
    }

    #[tokio::test]
    async fn login_during_initialize_survives_a_rejected_stale_token() {
        let backend = Arc::new(FakeBackend::new(Err(ClientError::Unauthorized), Ok(TenantLookup::MainDomain)));
        let tokens = Arc::new(MemoryTokenStore::with_token("stale"));
        let session = context(&backend, &tokens);

        let (init, login) = tokio::join!(
            session.initialize(),
            session.login("grace@seaside.example", "secret")
        );
        let user = login.unwrap();
        assert_eq!(backend.me_calls(), 1);
        assert_eq!(init, SessionState::Verified(user.clone()));
        assert_eq!(session.state(), SessionState::Verified(user));
        assert_eq!(tokens.load().as_deref(), Some("fresh-token"));
    }

    #[tokio::test]
    async fn login_then_logout() {
        let backend = Arc::new(FakeBackend::new(Err(ClientError::Unauthorized), Ok(TenantLookup::MainDomain)));
        let tokens = Arc::new(MemoryTokenStore::default());
        let session = context(&backend, &tokens);

        assert_eq!(
            session.login("grace@seaside.example", "wrong").await,
            Err(ClientError::Unauthorized)
        );
        let user = session.login("grace@seaside.example", "secret").await.unwrap();
        assert_eq!(session.user(), Some(user));
        assert_eq!(tokens.load().as_deref(), Some("fresh-token"));
        // already initialized by the login
        assert!(session.initialize().await != SessionState::Anonymous);
        assert_eq!(backend.me_calls(), 0);

        session.logout().await;
        assert_eq!(session.state(), SessionState::Anonymous);
        assert_eq!(tokens.load(), None);
        assert_eq!(backend.logouts.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disposed_context_ignores_late_results() {
        let backend = Arc::new(FakeBackend::new(Ok(user(1)), Ok(TenantLookup::MainDomain)));
        let tokens = Arc::new(MemoryTokenStore::with_token("t"));
        let session = context(&backend, &tokens);
        let init = session.initialize();
        session.dispose();
        assert_eq!(init.await, SessionState::Disposed);
    }
}
