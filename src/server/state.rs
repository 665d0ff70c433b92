use crate::server::auth::Authenticator;
use crate::server::database::store::Store;
use crate::server::ledger::Ledger;
use crate::server::mailer::MailRelay;
use crate::server::model::config::ServerConfig;
use crate::server::notify::NotificationHub;
use crate::tenant::DomainRules;
use std::sync::Arc;

/// Shared handles every handler reaches through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    domains: Arc<DomainRules>,
    store: Arc<dyn Store>,
    ledger: Arc<Ledger>,
    auth: Arc<Authenticator>,
    hub: Arc<NotificationHub>,
    mailer: Arc<dyn MailRelay>,
}

impl AppState {
    pub fn new(config: ServerConfig, store: Arc<dyn Store>, mailer: Arc<dyn MailRelay>) -> Self {
        Self {
            domains: Arc::new(DomainRules::new(&config.main_domains)),
            ledger: Arc::new(Ledger::new(store.clone())),
            auth: Arc::new(Authenticator::new(store.clone(), config.session_ttl_hours)),
            hub: Arc::new(NotificationHub::new()),
            config: Arc::new(config),
            store,
            mailer,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn domains(&self) -> &DomainRules {
        &self.domains
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn auth(&self) -> &Authenticator {
        &self.auth
    }

    pub fn auth_handle(&self) -> Arc<Authenticator> {
        self.auth.clone()
    }

    pub fn hub(&self) -> Arc<NotificationHub> {
        self.hub.clone()
    }

    pub fn mailer(&self) -> &dyn MailRelay {
        self.mailer.as_ref()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::server::database::memory::MemoryStore;
    use crate::server::mailer::tests::RecordingRelay;

    #[actix_web::test]
    async fn app_state() {
        let store = Arc::new(MemoryStore::new());
        let hotel = store.add_hotel("Seaside Inn", "seaside", None).await;
        let state = AppState::new(ServerConfig::default(), store, Arc::new(RecordingRelay::default()));
        assert_eq!(state.store().get_hotel(hotel.id).await.unwrap(), Some(hotel));
        assert_eq!(state.domains().main_domains(), ["localhost", "127.0.0.1"]);
        assert_eq!(state.hub().subscriber_count(1), 0);
    }
}
