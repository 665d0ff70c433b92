use crate::server::database::connection::Connection;
use crate::server::database::pool::Pool;
use crate::server::database::store::{Store, StoreError, StoreResult};
use crate::server::model::bill::{Bill, Payment};
use crate::server::model::guest::{Guest, GuestId, NewGuest};
use crate::server::model::hotel::{Hotel, HotelId};
use crate::server::model::order::{LineItem, NewOrder, Order, OrderId, OrderStatus};
use crate::server::model::staff::{AuthUser, Session, StaffAccount, StaffId, StaffRole};
use crate::server::model::ticket::{NewTicket, Ticket};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use std::future::Future;
use std::time::Duration;
use tokio::time;
use tokio_postgres::types::Json;
use tokio_postgres::{Client, Row};

const GUEST_COLUMNS: &str =
    "id, hotel_id, name, email, phone, room_number, checked_in_at, checked_out, checked_out_at";
const ORDER_COLUMNS: &str = "id, guest_id, items, total_amount, status, created_at, updated_at";
const BILL_COLUMNS: &str =
    "id, guest_id, order_ids, total_amount, paid_amount, payments, created_at, updated_at";
const STAFF_COLUMNS: &str = "id, hotel_id, email, name, role, password_hash, salt";

/// Postgres backed store with split read and write pools.
pub struct PgStore {
    read_pool: Pool<Client>,
    write_pool: Pool<Client>,
    timeout: Duration,
}

impl PgStore {
    pub fn new(read_pool: Pool<Client>, write_pool: Pool<Client>, timeout: Duration) -> Self {
        Self {
            read_pool,
            write_pool,
            timeout,
        }
    }

    async fn reader(&self) -> StoreResult<Connection<Client>> {
        self.read_pool.acquire(self.timeout).await.ok_or(StoreError::Busy)
    }

    async fn writer(&self) -> StoreResult<Connection<Client>> {
        self.write_pool.acquire(self.timeout).await.ok_or(StoreError::Busy)
    }

    /// run a statement, giving up after the store timeout
    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, tokio_postgres::Error>> + Send,
    {
        let sleep = time::sleep(self.timeout);
        tokio::pin!(sleep);
        tokio::select! {
            result = fut => result.map_err(|e| {
                warn!("{} failed, {}", op, e);
                StoreError::from(e)
            }),
            _ = &mut sleep => {
                warn!("timeout running {}", op);
                Err(StoreError::Timeout)
            }
        }
    }
}

fn corrupt(entity: &'static str) -> impl FnOnce(String) -> StoreError {
    move |reason| StoreError::Corrupt { entity, reason }
}

fn hotel_from_row(row: &Row) -> StoreResult<Hotel> {
    Ok(Hotel {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        subdomain: row.try_get("subdomain")?,
        custom_domain: row.try_get("custom_domain")?,
        created_at: row.try_get("created_at")?,
    })
}

fn guest_from_row(row: &Row) -> StoreResult<Guest> {
    Ok(Guest {
        id: row.try_get("id")?,
        hotel_id: row.try_get("hotel_id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        room_number: row.try_get("room_number")?,
        checked_in_at: row.try_get("checked_in_at")?,
        checked_out: row.try_get("checked_out")?,
        checked_out_at: row.try_get("checked_out_at")?,
    })
}

fn order_from_row(row: &Row) -> StoreResult<Order> {
    let Json(items): Json<Vec<LineItem>> = row.try_get("items")?;
    let status: String = row.try_get("status")?;
    Ok(Order {
        id: row.try_get("id")?,
        guest_id: row.try_get("guest_id")?,
        items,
        total_amount: row.try_get("total_amount")?,
        status: status.parse::<OrderStatus>().map_err(corrupt("order"))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn bill_from_row(row: &Row) -> StoreResult<Bill> {
    let Json(order_ids): Json<Vec<OrderId>> = row.try_get("order_ids")?;
    let Json(payments): Json<Vec<Payment>> = row.try_get("payments")?;
    Ok(Bill {
        id: row.try_get("id")?,
        guest_id: row.try_get("guest_id")?,
        order_ids,
        total_amount: row.try_get("total_amount")?,
        paid_amount: row.try_get("paid_amount")?,
        payments,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn staff_from_row(row: &Row) -> StoreResult<StaffAccount> {
    let role: String = row.try_get("role")?;
    Ok(StaffAccount {
        user: AuthUser {
            id: row.try_get("id")?,
            hotel_id: row.try_get("hotel_id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            role: role.parse::<StaffRole>().map_err(corrupt("staff"))?,
        },
        password_hash: row.try_get("password_hash")?,
        salt: row.try_get("salt")?,
    })
}

fn session_from_row(row: &Row) -> StoreResult<Session> {
    Ok(Session {
        token_hash: row.try_get("token_hash")?,
        staff_id: row.try_get("staff_id")?,
        expires_at: row.try_get("expires_at")?,
    })
}

fn ticket_from_row(row: &Row) -> StoreResult<Ticket> {
    Ok(Ticket {
        id: row.try_get("id")?,
        hotel_id: row.try_get("hotel_id")?,
        room_number: row.try_get("room_number")?,
        guest_name: row.try_get("guest_name")?,
        message: row.try_get("message")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl Store for PgStore {
    async fn get_hotel(&self, id: HotelId) -> StoreResult<Option<Hotel>> {
        let conn = self.reader().await?;
        let row = self
            .bounded("get_hotel", conn.query_opt("SELECT * FROM hotel WHERE id = $1", &[&id]))
            .await?;
        row.as_ref().map(hotel_from_row).transpose()
    }

    async fn find_hotel_by_subdomain(&self, subdomain: &str) -> StoreResult<Option<Hotel>> {
        let conn = self.reader().await?;
        let row = self
            .bounded(
                "find_hotel_by_subdomain",
                conn.query_opt("SELECT * FROM hotel WHERE subdomain = $1", &[&subdomain]),
            )
            .await?;
        row.as_ref().map(hotel_from_row).transpose()
    }

    async fn find_hotel_by_custom_domain(&self, domain: &str) -> StoreResult<Option<Hotel>> {
        let conn = self.reader().await?;
        let row = self
            .bounded(
                "find_hotel_by_custom_domain",
                conn.query_opt("SELECT * FROM hotel WHERE custom_domain = $1", &[&domain]),
            )
            .await?;
        row.as_ref().map(hotel_from_row).transpose()
    }

    async fn insert_guest(&self, guest: NewGuest) -> StoreResult<Guest> {
        let conn = self.writer().await?;
        let stmt = format!(
            r#"
            INSERT INTO guest(hotel_id, name, email, phone, room_number, checked_in_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {GUEST_COLUMNS}
            "#
        );
        let row = self
            .bounded(
                "insert_guest",
                conn.query_one(
                    stmt.as_str(),
                    &[
                        &guest.hotel_id,
                        &guest.name,
                        &guest.email,
                        &guest.phone,
                        &guest.room_number,
                        &guest.checked_in_at,
                    ],
                ),
            )
            .await?;
        guest_from_row(&row)
    }

    async fn get_guest(&self, id: GuestId) -> StoreResult<Option<Guest>> {
        let conn = self.reader().await?;
        let stmt = format!("SELECT {GUEST_COLUMNS} FROM guest WHERE id = $1");
        let row = self.bounded("get_guest", conn.query_opt(stmt.as_str(), &[&id])).await?;
        row.as_ref().map(guest_from_row).transpose()
    }

    async fn list_guests(&self, hotel_id: HotelId, offset: i64, limit: i64) -> StoreResult<Vec<Guest>> {
        let conn = self.reader().await?;
        let stmt = format!(
            "SELECT {GUEST_COLUMNS} FROM guest WHERE hotel_id = $1 ORDER BY id OFFSET $2 LIMIT $3"
        );
        let rows = self
            .bounded("list_guests", conn.query(stmt.as_str(), &[&hotel_id, &offset, &limit]))
            .await?;
        rows.iter().map(guest_from_row).collect()
    }

    async fn find_active_guest_by_room(&self, hotel_id: HotelId, room_number: &str) -> StoreResult<Option<Guest>> {
        let conn = self.reader().await?;
        let stmt = format!(
            r#"
            SELECT {GUEST_COLUMNS} FROM guest
            WHERE hotel_id = $1 AND room_number = $2 AND NOT checked_out
            ORDER BY checked_in_at DESC
            LIMIT 1
            "#
        );
        let row = self
            .bounded(
                "find_active_guest_by_room",
                conn.query_opt(stmt.as_str(), &[&hotel_id, &room_number]),
            )
            .await?;
        row.as_ref().map(guest_from_row).transpose()
    }

    async fn check_out_guest(&self, id: GuestId, at: DateTime<Utc>) -> StoreResult<Option<Guest>> {
        let conn = self.writer().await?;
        let stmt = format!(
            r#"
            UPDATE guest SET checked_out = TRUE, checked_out_at = $2
            WHERE id = $1
            RETURNING {GUEST_COLUMNS}
            "#
        );
        let row = self
            .bounded("check_out_guest", conn.query_opt(stmt.as_str(), &[&id, &at]))
            .await?;
        row.as_ref().map(guest_from_row).transpose()
    }

    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
        let conn = self.writer().await?;
        let stmt = format!(
            r#"
            INSERT INTO guest_order(guest_id, items, total_amount, status, created_at)
            VALUES ($1, $2, $3, 'pending', $4)
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let items = Json(&order.items);
        let row = self
            .bounded(
                "insert_order",
                conn.query_one(
                    stmt.as_str(),
                    &[&order.guest_id, &items, &order.total_amount, &order.created_at],
                ),
            )
            .await?;
        order_from_row(&row)
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let conn = self.reader().await?;
        let stmt = format!("SELECT {ORDER_COLUMNS} FROM guest_order WHERE id = $1");
        let row = self.bounded("get_order", conn.query_opt(stmt.as_str(), &[&id])).await?;
        row.as_ref().map(order_from_row).transpose()
    }

    async fn list_orders(&self, guest_id: GuestId) -> StoreResult<Vec<Order>> {
        let conn = self.reader().await?;
        let stmt = format!("SELECT {ORDER_COLUMNS} FROM guest_order WHERE guest_id = $1 ORDER BY id");
        let rows = self.bounded("list_orders", conn.query(stmt.as_str(), &[&guest_id])).await?;
        rows.iter().map(order_from_row).collect()
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus, at: DateTime<Utc>) -> StoreResult<Option<Order>> {
        let conn = self.writer().await?;
        let stmt = format!(
            r#"
            UPDATE guest_order SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let status = status.to_string();
        let row = self
            .bounded("update_order_status", conn.query_opt(stmt.as_str(), &[&id, &status, &at]))
            .await?;
        row.as_ref().map(order_from_row).transpose()
    }

    async fn delete_order(&self, id: OrderId) -> StoreResult<bool> {
        let conn = self.writer().await?;
        let affected = self
            .bounded(
                "delete_order",
                conn.execute("DELETE FROM guest_order WHERE id = $1", &[&id]),
            )
            .await?;
        Ok(affected > 0)
    }

    async fn find_bill_by_guest(&self, guest_id: GuestId) -> StoreResult<Option<Bill>> {
        let conn = self.reader().await?;
        let stmt = format!("SELECT {BILL_COLUMNS} FROM bill WHERE guest_id = $1");
        let row = self
            .bounded("find_bill_by_guest", conn.query_opt(stmt.as_str(), &[&guest_id]))
            .await?;
        row.as_ref().map(bill_from_row).transpose()
    }

    async fn create_bill(&self, guest_id: GuestId, at: DateTime<Utc>) -> StoreResult<Bill> {
        let conn = self.writer().await?;
        // an existing bill for the stay wins
        let stmt = format!(
            r#"
            INSERT INTO bill(guest_id, created_at) VALUES ($1, $2)
            ON CONFLICT (guest_id) DO UPDATE SET guest_id = EXCLUDED.guest_id
            RETURNING {BILL_COLUMNS}
            "#
        );
        let row = self
            .bounded("create_bill", conn.query_one(stmt.as_str(), &[&guest_id, &at]))
            .await?;
        bill_from_row(&row)
    }

    async fn save_bill(&self, bill: &Bill) -> StoreResult<()> {
        let conn = self.writer().await?;
        let order_ids = Json(&bill.order_ids);
        let payments = Json(&bill.payments);
        let affected = self
            .bounded(
                "save_bill",
                conn.execute(
                    r#"
                    UPDATE bill
                    SET order_ids = $2, total_amount = $3, paid_amount = $4, payments = $5, updated_at = $6
                    WHERE id = $1
                    "#,
                    &[
                        &bill.id,
                        &order_ids,
                        &bill.total_amount,
                        &bill.paid_amount,
                        &payments,
                        &bill.updated_at,
                    ],
                ),
            )
            .await?;
        if affected == 0 {
            return Err(StoreError::not_found("bill", bill.id));
        }
        Ok(())
    }

    async fn find_staff_by_email(&self, email: &str) -> StoreResult<Option<StaffAccount>> {
        let conn = self.reader().await?;
        let stmt = format!("SELECT {STAFF_COLUMNS} FROM staff WHERE lower(email) = lower($1)");
        let row = self
            .bounded("find_staff_by_email", conn.query_opt(stmt.as_str(), &[&email]))
            .await?;
        row.as_ref().map(staff_from_row).transpose()
    }

    async fn get_staff(&self, id: StaffId) -> StoreResult<Option<AuthUser>> {
        let conn = self.reader().await?;
        let stmt = format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = $1");
        let row = self.bounded("get_staff", conn.query_opt(stmt.as_str(), &[&id])).await?;
        Ok(row.as_ref().map(staff_from_row).transpose()?.map(|s| s.user))
    }

    async fn insert_session(&self, session: Session) -> StoreResult<()> {
        let conn = self.writer().await?;
        self.bounded(
            "insert_session",
            conn.execute(
                "INSERT INTO staff_session(token_hash, staff_id, expires_at) VALUES ($1, $2, $3)",
                &[&session.token_hash, &session.staff_id, &session.expires_at],
            ),
        )
        .await?;
        Ok(())
    }

    async fn find_session(&self, token_hash: &str) -> StoreResult<Option<Session>> {
        let conn = self.reader().await?;
        let row = self
            .bounded(
                "find_session",
                conn.query_opt(
                    "SELECT token_hash, staff_id, expires_at FROM staff_session WHERE token_hash = $1",
                    &[&token_hash],
                ),
            )
            .await?;
        row.as_ref().map(session_from_row).transpose()
    }

    async fn delete_session(&self, token_hash: &str) -> StoreResult<bool> {
        let conn = self.writer().await?;
        let affected = self
            .bounded(
                "delete_session",
                conn.execute("DELETE FROM staff_session WHERE token_hash = $1", &[&token_hash]),
            )
            .await?;
        Ok(affected > 0)
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let conn = self.writer().await?;
        self.bounded(
            "purge_expired_sessions",
            conn.execute("DELETE FROM staff_session WHERE expires_at <= $1", &[&now]),
        )
        .await
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> StoreResult<Ticket> {
        let conn = self.writer().await?;
        let row = self
            .bounded(
                "insert_ticket",
                conn.query_one(
                    r#"
                    INSERT INTO ticket(hotel_id, room_number, guest_name, message, created_at)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id, hotel_id, room_number, guest_name, message, created_at
                    "#,
                    &[
                        &ticket.hotel_id,
                        &ticket.room_number,
                        &ticket.guest_name,
                        &ticket.message,
                        &ticket.created_at,
                    ],
                ),
            )
            .await?;
        ticket_from_row(&row)
    }
}
