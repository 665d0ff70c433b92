//! In-memory store used by tests and local demos.

use crate::server::database::store::{Store, StoreError, StoreResult};
use crate::server::model::bill::Bill;
use crate::server::model::guest::{Guest, GuestId, NewGuest};
use crate::server::model::hotel::{Hotel, HotelId};
use crate::server::model::order::{NewOrder, Order, OrderId, OrderStatus};
use crate::server::model::staff::{AuthUser, Session, StaffAccount, StaffId};
use crate::server::model::ticket::{NewTicket, Ticket};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: AtomicI64,
    hotels: RwLock<BTreeMap<HotelId, Hotel>>,
    guests: RwLock<BTreeMap<GuestId, Guest>>,
    orders: RwLock<BTreeMap<OrderId, Order>>,
    bills: RwLock<HashMap<GuestId, Bill>>,
    staff: RwLock<BTreeMap<StaffId, StaffAccount>>,
    sessions: RwLock<HashMap<String, Session>>,
    tickets: RwLock<Vec<Ticket>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Hotels are provisioned outside the api.
    pub async fn add_hotel(&self, name: &str, subdomain: &str, custom_domain: Option<&str>) -> Hotel {
        let hotel = Hotel {
            id: self.id(),
            name: name.to_string(),
            subdomain: subdomain.to_string(),
            custom_domain: custom_domain.map(str::to_string),
            created_at: Utc::now(),
        };
        self.hotels.write().await.insert(hotel.id, hotel.clone());
        hotel
    }

    /// Staff accounts are provisioned outside the api.
    pub async fn add_staff(&self, account: StaffAccount) -> AuthUser {
        let mut account = account;
        account.user.id = self.id();
        let user = account.user.clone();
        self.staff.write().await.insert(user.id, account);
        user
    }

    pub async fn tickets(&self) -> Vec<Ticket> {
        self.tickets.read().await.clone()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_hotel(&self, id: HotelId) -> StoreResult<Option<Hotel>> {
        Ok(self.hotels.read().await.get(&id).cloned())
    }

    async fn find_hotel_by_subdomain(&self, subdomain: &str) -> StoreResult<Option<Hotel>> {
        let hotels = self.hotels.read().await;
        Ok(hotels.values().find(|h| h.subdomain == subdomain).cloned())
    }

    async fn find_hotel_by_custom_domain(&self, domain: &str) -> StoreResult<Option<Hotel>> {
        let hotels = self.hotels.read().await;
        Ok(hotels
            .values()
            .find(|h| h.custom_domain.as_deref() == Some(domain))
            .cloned())
    }

    async fn insert_guest(&self, guest: NewGuest) -> StoreResult<Guest> {
        let guest = Guest {
            id: self.id(),
            hotel_id: guest.hotel_id,
            name: guest.name,
            email: guest.email,
            phone: guest.phone,
            room_number: guest.room_number,
            checked_in_at: guest.checked_in_at,
            checked_out: false,
            checked_out_at: None,
        };
        self.guests.write().await.insert(guest.id, guest.clone());
        Ok(guest)
    }

    async fn get_guest(&self, id: GuestId) -> StoreResult<Option<Guest>> {
        Ok(self.guests.read().await.get(&id).cloned())
    }

    async fn list_guests(&self, hotel_id: HotelId, offset: i64, limit: i64) -> StoreResult<Vec<Guest>> {
        let guests = self.guests.read().await;
        Ok(guests
            .values()
            .filter(|g| g.hotel_id == hotel_id)
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn find_active_guest_by_room(&self, hotel_id: HotelId, room_number: &str) -> StoreResult<Option<Guest>> {
        let guests = self.guests.read().await;
        Ok(guests
            .values()
            .rev()
            .find(|g| g.hotel_id == hotel_id && g.room_number == room_number && !g.checked_out)
            .cloned())
    }

    async fn check_out_guest(&self, id: GuestId, at: DateTime<Utc>) -> StoreResult<Option<Guest>> {
        let mut guests = self.guests.write().await;
        Ok(guests.get_mut(&id).map(|guest| {
            guest.checked_out = true;
            guest.checked_out_at = Some(at);
            guest.clone()
        }))
    }

    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
        let order = Order {
            id: self.id(),
            guest_id: order.guest_id,
            items: order.items,
            total_amount: order.total_amount,
            status: OrderStatus::Pending,
            created_at: order.created_at,
            updated_at: None,
        };
        self.orders.write().await.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_orders(&self, guest_id: GuestId) -> StoreResult<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.values().filter(|o| o.guest_id == guest_id).cloned().collect())
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus, at: DateTime<Utc>) -> StoreResult<Option<Order>> {
        let mut orders = self.orders.write().await;
        Ok(orders.get_mut(&id).map(|order| {
            order.status = status;
            order.updated_at = Some(at);
            order.clone()
        }))
    }

    async fn delete_order(&self, id: OrderId) -> StoreResult<bool> {
        Ok(self.orders.write().await.remove(&id).is_some())
    }

    async fn find_bill_by_guest(&self, guest_id: GuestId) -> StoreResult<Option<Bill>> {
        Ok(self.bills.read().await.get(&guest_id).cloned())
    }

    async fn create_bill(&self, guest_id: GuestId, at: DateTime<Utc>) -> StoreResult<Bill> {
        let mut bills = self.bills.write().await;
        let bill = bills
            .entry(guest_id)
            .or_insert_with(|| Bill::new(self.id(), guest_id, at));
        Ok(bill.clone())
    }

    async fn save_bill(&self, bill: &Bill) -> StoreResult<()> {
        let mut bills = self.bills.write().await;
        match bills.get_mut(&bill.guest_id) {
            Some(stored) if stored.id == bill.id => {
                *stored = bill.clone();
                Ok(())
            }
            _ => Err(StoreError::not_found("bill", bill.id)),
        }
    }

    async fn find_staff_by_email(&self, email: &str) -> StoreResult<Option<StaffAccount>> {
        let staff = self.staff.read().await;
        Ok(staff
            .values()
            .find(|s| s.user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_staff(&self, id: StaffId) -> StoreResult<Option<AuthUser>> {
        Ok(self.staff.read().await.get(&id).map(|s| s.user.clone()))
    }

    async fn insert_session(&self, session: Session) -> StoreResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.token_hash.clone(), session);
        Ok(())
    }

    async fn find_session(&self, token_hash: &str) -> StoreResult<Option<Session>> {
        Ok(self.sessions.read().await.get(token_hash).cloned())
    }

    async fn delete_session(&self, token_hash: &str) -> StoreResult<bool> {
        Ok(self.sessions.write().await.remove(token_hash).is_some())
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        Ok((before - sessions.len()) as u64)
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> StoreResult<Ticket> {
        let ticket = Ticket {
            id: self.id(),
            hotel_id: ticket.hotel_id,
            room_number: ticket.room_number,
            guest_name: ticket.guest_name,
            message: ticket.message,
            created_at: ticket.created_at,
        };
        self.tickets.write().await.push(ticket.clone());
        Ok(ticket)
    }
}
