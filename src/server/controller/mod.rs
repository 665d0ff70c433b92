//! HTTP handlers.

pub(crate) mod auth;
pub(crate) mod bill;
pub(crate) mod contact;
pub(crate) mod error;
pub(crate) mod guest;
pub(crate) mod notifications;
pub(crate) mod order;
pub(crate) mod room;
pub(crate) mod tenant;

use crate::server::controller::error::CustomError;
use crate::server::model::guest::{Guest, GuestId};
use crate::server::model::hotel::Hotel;
use crate::server::model::staff::AuthUser;
use crate::server::state::AppState;
use crate::server::tenant::resolve_host;
use crate::tenant::TenantLookup;
use actix_web::HttpRequest;

/// Upper bound for acquiring a pooled connection and running one statement.
pub const DB_TIMEOUT_SECONDS: u64 = 5;

/// Hotel addressed by the request host; guest pages only exist on tenant hosts.
pub(crate) async fn tenant_hotel(req: &HttpRequest, data: &AppState) -> Result<Hotel, CustomError> {
    let host = req.connection_info().host().to_string();
    match resolve_host(data.domains(), data.store(), &host).await? {
        TenantLookup::Hotel(hotel) => Ok(hotel),
        TenantLookup::MainDomain | TenantLookup::NoHotel => {
            Err(CustomError::ResourceNotFound { entity: "hotel" })
        }
    }
}

/// Guest of the staff member's own hotel; other hotels' guests look absent.
pub(crate) async fn staff_guest(data: &AppState, staff: &AuthUser, id: GuestId) -> Result<Guest, CustomError> {
    data.store()
        .get_guest(id)
        .await?
        .filter(|guest| guest.hotel_id == staff.hotel_id)
        .ok_or(CustomError::ResourceNotFound { entity: "guest" })
}
