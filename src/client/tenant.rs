use crate::client::{Backend, ClientError};
use crate::tenant::{DomainRules, HostKind, TenantLookup};
use log::debug;
use std::sync::Arc;

/// Resolves the host the client is served from.
///
/// Main domains are recognized locally; tenant hosts need one server lookup.
pub struct TenantResolver {
    rules: DomainRules,
    backend: Arc<dyn Backend>,
}

impl TenantResolver {
    pub fn new(rules: DomainRules, backend: Arc<dyn Backend>) -> Self {
        Self { rules, backend }
    }

    pub async fn resolve(&self, host: &str) -> Result<TenantLookup, ClientError> {
        if self.rules.classify(host) == HostKind::Main {
            return Ok(TenantLookup::MainDomain);
        }
        let lookup = self.backend.resolve_tenant(host).await?;
        debug!("host {} resolved to {:?}", host, lookup.hotel().map(|h| h.id));
        Ok(lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{hotel, user, FakeBackend};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn main_domain_needs_no_lookup() {
        let backend = Arc::new(FakeBackend::new(Ok(user(1)), Ok(TenantLookup::Hotel(hotel(1, "seaside")))));
        let resolver = TenantResolver::new(DomainRules::new(["hotelier.example"]), backend.clone());

        assert_eq!(resolver.resolve("www.hotelier.example").await, Ok(TenantLookup::MainDomain));
        assert_eq!(backend.tenant_calls.load(Ordering::SeqCst), 0);

        assert_eq!(
            resolver.resolve("seaside.hotelier.example").await,
            Ok(TenantLookup::Hotel(hotel(1, "seaside")))
        );
        assert_eq!(backend.tenant_calls.load(Ordering::SeqCst), 1);
    }
}
