use crate::server::model::guest::GuestId;
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub type OrderId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: i64,
    /// quantity * unit price
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[display("pending")]
    Pending,
    #[display("delivered")]
    Delivered,
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "delivered" => Ok(Self::Delivered),
            s => Err(format!("Invalid OrderStatus: {s}")),
        }
    }
}

impl OrderStatus {
    /// Delivered orders are final.
    pub fn can_become(self, next: OrderStatus) -> bool {
        matches!((self, next), (OrderStatus::Pending, OrderStatus::Delivered))
    }
}

/// A guest's purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub guest_id: GuestId,
    pub items: Vec<LineItem>,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub guest_id: GuestId,
    pub items: Vec<LineItem>,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub name: String,
    pub quantity: u32,
    pub unit_price: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostOrderRequest {
    pub items: Vec<OrderItemRequest>,
}

impl PostOrderRequest {
    /// Prices each line and sums the order, rejecting empty or malformed lines.
    pub fn price(self) -> Result<(Vec<LineItem>, i64), String> {
        if self.items.is_empty() {
            return Err("order has no items".to_string());
        }
        let mut total: i64 = 0;
        let mut lines = Vec::with_capacity(self.items.len());
        for item in self.items {
            let name = item.name.trim();
            if name.is_empty() {
                return Err("item name is required".to_string());
            }
            if item.quantity == 0 {
                return Err(format!("quantity of {name} must be positive"));
            }
            if item.unit_price < 0 {
                return Err(format!("price of {name} must not be negative"));
            }
            let line_total = item
                .unit_price
                .checked_mul(i64::from(item.quantity))
                .ok_or_else(|| format!("line total of {name} is too large"))?;
            total = total
                .checked_add(line_total)
                .ok_or_else(|| "order total is too large".to_string())?;
            lines.push(LineItem {
                name: name.to_string(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                total: line_total,
            });
        }
        if total <= 0 {
            return Err("order total must be positive".to_string());
        }
        Ok((lines, total))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PatchOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetOrdersResponse {
    pub orders: Vec<Order>,
}
