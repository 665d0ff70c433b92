//! Staff-side client: session context, tenant gating, room entry and the
//! ticket subscription handle, all talking to the server over http.

pub mod api;
pub mod guard;
pub mod notifications;
pub mod room;
pub mod session;
pub mod tenant;
pub mod token;
#[cfg(feature = "build-client")]
pub mod transport;

use crate::server::model::staff::{AuthUser, LoginResponse};
use crate::tenant::TenantLookup;
use async_trait::async_trait;
use derive_more::{Display, Error};

#[derive(Debug, Clone, Display, Error, PartialEq, Eq)]
pub enum ClientError {
    #[display("unauthorized")]
    Unauthorized,
    #[display("not found")]
    NotFound,
    /// the server could not be reached; callers keep their state
    #[display("network error: {reason}")]
    Network { reason: String },
    #[display("unexpected response {status}: {reason}")]
    Unexpected { status: u16, reason: String },
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ClientError::Unexpected {
                status: status.as_u16(),
                reason: e.to_string(),
            },
            None if e.is_decode() => ClientError::Unexpected {
                status: 0,
                reason: e.to_string(),
            },
            None => ClientError::Network {
                reason: e.to_string(),
            },
        }
    }
}

/// Server calls the session context and the tenant resolver depend on.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn me(&self, token: &str) -> Result<AuthUser, ClientError>;
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError>;
    async fn logout(&self, token: &str) -> Result<(), ClientError>;
    async fn resolve_tenant(&self, host: &str) -> Result<TenantLookup, ClientError>;
}
