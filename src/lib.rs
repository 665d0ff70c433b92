//! hotelier: a multi-tenant hotel back office.
//!
//! The `server` module is the actix-web service (ledger, auth, tenants,
//! notifications, contact mailer). The `client` module holds the staff-side
//! counterparts: session context, route guard, room entry and the ticket
//! subscription handle.

pub mod client;
pub mod server;
pub mod tenant;
