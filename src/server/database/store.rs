//! Persistence seam for every record the service keeps.

use crate::server::model::bill::Bill;
use crate::server::model::guest::{Guest, GuestId, NewGuest};
use crate::server::model::hotel::{Hotel, HotelId};
use crate::server::model::order::{NewOrder, Order, OrderId, OrderStatus};
use crate::server::model::staff::{AuthUser, Session, StaffAccount, StaffId};
use crate::server::model::ticket::{NewTicket, Ticket};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum StoreError {
    #[display("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[display("database error: {_0}")]
    Database(#[error(source)] tokio_postgres::Error),
    #[display("malformed {entity} record: {reason}")]
    Corrupt { entity: &'static str, reason: String },
    #[display("server is busy")]
    Busy,
    #[display("timeout occurred")]
    Timeout,
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(e: tokio_postgres::Error) -> Self {
        Self::Database(e)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn get_hotel(&self, id: HotelId) -> StoreResult<Option<Hotel>>;
    async fn find_hotel_by_subdomain(&self, subdomain: &str) -> StoreResult<Option<Hotel>>;
    async fn find_hotel_by_custom_domain(&self, domain: &str) -> StoreResult<Option<Hotel>>;

    async fn insert_guest(&self, guest: NewGuest) -> StoreResult<Guest>;
    async fn get_guest(&self, id: GuestId) -> StoreResult<Option<Guest>>;
    async fn list_guests(&self, hotel_id: HotelId, offset: i64, limit: i64) -> StoreResult<Vec<Guest>>;
    async fn find_active_guest_by_room(&self, hotel_id: HotelId, room_number: &str) -> StoreResult<Option<Guest>>;
    /// Marks the guest checked out; `None` when the guest does not exist.
    async fn check_out_guest(&self, id: GuestId, at: DateTime<Utc>) -> StoreResult<Option<Guest>>;

    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order>;
    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>>;
    async fn list_orders(&self, guest_id: GuestId) -> StoreResult<Vec<Order>>;
    async fn update_order_status(&self, id: OrderId, status: OrderStatus, at: DateTime<Utc>) -> StoreResult<Option<Order>>;
    async fn delete_order(&self, id: OrderId) -> StoreResult<bool>;

    async fn find_bill_by_guest(&self, guest_id: GuestId) -> StoreResult<Option<Bill>>;
    async fn create_bill(&self, guest_id: GuestId, at: DateTime<Utc>) -> StoreResult<Bill>;
    /// Overwrites totals, order ids and payments of an existing bill.
    async fn save_bill(&self, bill: &Bill) -> StoreResult<()>;

    async fn find_staff_by_email(&self, email: &str) -> StoreResult<Option<StaffAccount>>;
    async fn get_staff(&self, id: StaffId) -> StoreResult<Option<AuthUser>>;
    async fn insert_session(&self, session: Session) -> StoreResult<()>;
    async fn find_session(&self, token_hash: &str) -> StoreResult<Option<Session>>;
    async fn delete_session(&self, token_hash: &str) -> StoreResult<bool>;
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64>;

    async fn insert_ticket(&self, ticket: NewTicket) -> StoreResult<Ticket>;
}
