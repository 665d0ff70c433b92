use crate::server::database::store::{Store, StoreResult};
use crate::tenant::{DomainRules, HostKind, TenantLookup};
use log::debug;

/// Maps a request host to the hotel serving it.
pub async fn resolve_host(rules: &DomainRules, store: &dyn Store, host: &str) -> StoreResult<TenantLookup> {
    let hotel = match rules.classify(host) {
        HostKind::Main => return Ok(TenantLookup::MainDomain),
        HostKind::Subdomain(label) => store.find_hotel_by_subdomain(&label).await?,
        HostKind::CustomDomain(domain) => store.find_hotel_by_custom_domain(&domain).await?,
    };
    debug!("host {} resolved to hotel {:?}", host, hotel.as_ref().map(|h| h.id));
    Ok(hotel.map_or(TenantLookup::NoHotel, TenantLookup::Hotel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::database::memory::MemoryStore;

    #[tokio::test]
    async fn resolves_subdomain_custom_domain_and_main() {
        let store = MemoryStore::new();
        let seaside = store.add_hotel("Seaside Inn", "seaside", Some("stay.seaside.example")).await;
        let rules = DomainRules::new(["hotelier.example"]);

        assert_eq!(
            resolve_host(&rules, &store, "hotelier.example").await.unwrap(),
            TenantLookup::MainDomain
        );
        assert_eq!(
            resolve_host(&rules, &store, "seaside.hotelier.example:8080").await.unwrap(),
            TenantLookup::Hotel(seaside.clone())
        );
        assert_eq!(
            resolve_host(&rules, &store, "Stay.Seaside.example").await.unwrap(),
            TenantLookup::Hotel(seaside)
        );
        assert_eq!(
            resolve_host(&rules, &store, "ghost.hotelier.example").await.unwrap(),
            TenantLookup::NoHotel
        );
    }
}
