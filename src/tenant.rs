//! Hostname classification shared by the server and the staff client.

use crate::server::model::hotel::Hotel;

/// What a hostname points at before any hotel lookup happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKind {
    /// the shared marketing domain
    Main,
    /// `<label>.<main domain>`
    Subdomain(String),
    /// any other host, looked up as a hotel's custom domain
    CustomDomain(String),
}

/// Outcome of resolving a host to a tenant.
#[derive(Debug, Clone, PartialEq)]
pub enum TenantLookup {
    MainDomain,
    Hotel(Hotel),
    NoHotel,
}

impl TenantLookup {
    pub fn hotel(&self) -> Option<&Hotel> {
        match self {
            TenantLookup::Hotel(hotel) => Some(hotel),
            _ => None,
        }
    }
}

/// The set of hosts that serve the marketing site.
#[derive(Debug, Clone)]
pub struct DomainRules {
    main_domains: Vec<String>,
}

impl DomainRules {
    pub fn new<I, S>(main_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            main_domains: main_domains
                .into_iter()
                .map(|d| normalize_host(d.as_ref()))
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    pub fn main_domains(&self) -> &[String] {
        &self.main_domains
    }

    pub fn classify(&self, host: &str) -> HostKind {
        let host = normalize_host(host);
        if host.is_empty() {
            return HostKind::Main;
        }
        for main in &self.main_domains {
            if host == *main || host.strip_prefix("www.") == Some(main.as_str()) {
                return HostKind::Main;
            }
            let prefix = host
                .strip_suffix(main.as_str())
                .and_then(|p| p.strip_suffix('.'));
            if let Some(prefix) = prefix {
                // the label closest to the main domain names the tenant
                let label = prefix.rsplit('.').next().unwrap_or(prefix);
                return HostKind::Subdomain(label.to_string());
            }
        }
        HostKind::CustomDomain(host)
    }
}

/// Lowercases a host and strips the port and any trailing dot.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let without_port = if let Some(rest) = host.strip_prefix('[') {
        // [::1]:8080
        match rest.split_once(']') {
            Some((addr, _)) => addr,
            None => rest,
        }
    } else {
        match host.rsplit_once(':') {
            Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
            _ => host,
        }
    };
    without_port.trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> DomainRules {
        DomainRules::new(["example.com", "localhost"])
    }

    #[test]
    fn main_domain_variants() {
        let rules = rules();
        assert_eq!(rules.classify("example.com"), HostKind::Main);
        assert_eq!(rules.classify("WWW.Example.com:443"), HostKind::Main);
        assert_eq!(rules.classify("localhost:8080"), HostKind::Main);
        assert_eq!(rules.classify("example.com."), HostKind::Main);
        assert_eq!(rules.classify(""), HostKind::Main);
    }

    #[test]
    fn subdomain_names_the_tenant() {
        let rules = rules();
        assert_eq!(
            rules.classify("grand.example.com"),
            HostKind::Subdomain("grand".to_string())
        );
        assert_eq!(
            rules.classify("www.grand.example.com"),
            HostKind::Subdomain("grand".to_string())
        );
        assert_eq!(
            rules.classify("seaside.localhost:3000"),
            HostKind::Subdomain("seaside".to_string())
        );
    }

    #[test]
    fn unrelated_host_is_custom_domain() {
        let rules = rules();
        assert_eq!(
            rules.classify("Book.SeasideInn.net"),
            HostKind::CustomDomain("book.seasideinn.net".to_string())
        );
        // suffix match must sit on a label boundary
        assert_eq!(
            rules.classify("notexample.com"),
            HostKind::CustomDomain("notexample.com".to_string())
        );
    }

    #[test]
    fn normalize_handles_ipv6() {
        assert_eq!(normalize_host("[::1]:8080"), "::1");
        assert_eq!(normalize_host("127.0.0.1:80"), "127.0.0.1");
    }
}
