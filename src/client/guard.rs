//! Route guard: decides whether a protected page renders or redirects.

use crate::client::session::{SessionContext, SessionState};
use crate::client::tenant::TenantResolver;
use crate::server::model::hotel::Hotel;
use crate::tenant::TenantLookup;
use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    NotFound,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::NotFound => "/not-found",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TenantState {
    Loading,
    MainDomain,
    TenantDomain(Hotel),
    TenantDomainNoHotel,
    /// the lookup failed on the network
    Unreachable,
}

impl From<TenantLookup> for TenantState {
    fn from(lookup: TenantLookup) -> Self {
        match lookup {
            TenantLookup::MainDomain => TenantState::MainDomain,
            TenantLookup::Hotel(hotel) => TenantState::TenantDomain(hotel),
            TenantLookup::NoHotel => TenantState::TenantDomainNoHotel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// show a spinner
    Loading,
    Render,
    Redirect(Route),
    /// server unreachable, show an offline notice
    Unavailable,
    /// render nothing; a redirect is already under way
    Nothing,
}

/// One guard per mounted page. Redirects are issued at most once.
#[derive(Debug)]
pub struct RouteGuard {
    tenant: TenantState,
    redirected: bool,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteGuard {
    pub fn new() -> Self {
        Self {
            tenant: TenantState::Loading,
            redirected: false,
        }
    }

    pub fn tenant(&self) -> &TenantState {
        &self.tenant
    }

    fn redirect(&mut self, route: Route) -> GuardDecision {
        if self.redirected {
            return GuardDecision::Nothing;
        }
        self.redirected = true;
        info!("redirecting to {}", route.path());
        GuardDecision::Redirect(route)
    }

    pub fn evaluate(&mut self, tenant: &TenantState, session: &SessionState) -> GuardDecision {
        if *tenant == TenantState::Loading || *session == SessionState::Uninitialized {
            return GuardDecision::Loading;
        }
        // a missing hotel wins over any session state
        if *tenant == TenantState::TenantDomainNoHotel {
            return self.redirect(Route::NotFound);
        }
        if *tenant == TenantState::Unreachable || *session == SessionState::Offline {
            return GuardDecision::Unavailable;
        }
        let user = match session {
            SessionState::Verified(user) => user,
            _ => return self.redirect(Route::Login),
        };
        match tenant {
            TenantState::TenantDomain(hotel) if user.hotel_id != hotel.id => {
                warn!("staff={} does not belong to hotel={}", user.id, hotel.id);
                self.redirect(Route::Login)
            }
            _ => GuardDecision::Render,
        }
    }

    /// Resolves the tenant and the session together, then evaluates.
    ///
    /// The tenant is looked up once per guard and the session context
    /// initializes at most once, so repeated checks only re-evaluate.
    pub async fn check(&mut self, resolver: &TenantResolver, session: &SessionContext, host: &str) -> GuardDecision {
        if self.tenant == TenantState::Loading {
            let (tenant, _) = tokio::join!(resolver.resolve(host), session.initialize());
            self.tenant = match tenant {
                Ok(lookup) => lookup.into(),
                Err(e) => {
                    warn!("tenant lookup for {} failed, {}", host, e);
                    TenantState::Unreachable
                }
            };
        } else {
            session.initialize().await;
        }
        let tenant = self.tenant.clone();
        self.evaluate(&tenant, &session.state())
    }
}
