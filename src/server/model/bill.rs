//! Bill aggregate: one per guest stay.
//!
//! Only the running totals, the order ids and the payment history are
//! stored. Balance and status are always derived from them, so they cannot
//! drift apart.

use crate::server::model::guest::GuestId;
use crate::server::model::order::{Order, OrderId};
use chrono::{DateTime, Utc};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub type BillId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    #[display("pending")]
    Pending,
    #[display("partially_paid")]
    PartiallyPaid,
    #[display("paid")]
    Paid,
}

impl BillStatus {
    pub fn derive(total: i64, paid: i64, order_count: usize) -> Self {
        if order_count > 0 && total - paid == 0 {
            BillStatus::Paid
        } else if paid > 0 && paid < total {
            BillStatus::PartiallyPaid
        } else {
            BillStatus::Pending
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[display("cash")]
    Cash,
    #[display("card")]
    Card,
    #[display("bank_transfer")]
    BankTransfer,
    #[display("other")]
    Other,
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "bank_transfer" => Ok(Self::BankTransfer),
            "other" => Ok(Self::Other),
            s => Err(format!("Invalid PaymentMethod: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub amount: i64,
    pub method: PaymentMethod,
    pub paid_by: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPaymentRequest {
    pub amount: i64,
    pub method: PaymentMethod,
    pub paid_by: String,
}

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum BillError {
    #[display("order total must be positive")]
    NonPositiveOrderTotal,
    #[display("order {order_id} belongs to another guest")]
    ForeignOrder { order_id: OrderId },
    #[display("payment amount must be positive")]
    NonPositivePayment,
    #[display("payer is required")]
    MissingPayer,
    #[display("payment of {amount} exceeds outstanding balance {balance}")]
    Overpayment { amount: i64, balance: i64 },
    #[display("bill amount overflow")]
    AmountOverflow,
}

/// Stored bill record.
#[derive(Debug, Clone, PartialEq)]
pub struct Bill {
    pub id: BillId,
    pub guest_id: GuestId,
    pub order_ids: Vec<OrderId>,
    pub total_amount: i64,
    pub paid_amount: i64,
    pub payments: Vec<Payment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Bill {
    pub fn new(id: BillId, guest_id: GuestId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            guest_id,
            order_ids: Vec::new(),
            total_amount: 0,
            paid_amount: 0,
            payments: Vec::new(),
            created_at,
            updated_at: None,
        }
    }

    pub fn balance_amount(&self) -> i64 {
        self.total_amount - self.paid_amount
    }

    pub fn status(&self) -> BillStatus {
        BillStatus::derive(self.total_amount, self.paid_amount, self.order_ids.len())
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.order_ids.contains(&order_id)
    }

    /// Whether an order of `amount` still fits on the bill.
    pub fn check_order_total(&self, amount: i64) -> Result<(), BillError> {
        if amount <= 0 {
            return Err(BillError::NonPositiveOrderTotal);
        }
        self.total_amount
            .checked_add(amount)
            .map(|_| ())
            .ok_or(BillError::AmountOverflow)
    }

    /// Folds an order into the bill. Returns `false` when the order is
    /// already on the bill, leaving it untouched.
    ///
    /// A paid bill is reopened: the total grows and the status falls back to
    /// partially paid.
    pub fn add_order(&mut self, order: &Order, now: DateTime<Utc>) -> Result<bool, BillError> {
        if order.guest_id != self.guest_id {
            return Err(BillError::ForeignOrder { order_id: order.id });
        }
        if order.total_amount <= 0 {
            return Err(BillError::NonPositiveOrderTotal);
        }
        if self.contains(order.id) {
            return Ok(false);
        }
        self.total_amount = self
            .total_amount
            .checked_add(order.total_amount)
            .ok_or(BillError::AmountOverflow)?;
        self.order_ids.push(order.id);
        self.updated_at = Some(now);
        Ok(true)
    }

    pub fn record_payment(&mut self, payment: Payment) -> Result<(), BillError> {
        if payment.amount <= 0 {
            return Err(BillError::NonPositivePayment);
        }
        if payment.paid_by.trim().is_empty() {
            return Err(BillError::MissingPayer);
        }
        let balance = self.balance_amount();
        if payment.amount > balance {
            return Err(BillError::Overpayment {
                amount: payment.amount,
                balance,
            });
        }
        self.paid_amount += payment.amount;
        self.updated_at = Some(payment.paid_at);
        self.payments.push(payment);
        Ok(())
    }

    pub fn view(&self) -> BillView {
        BillView {
            id: self.id,
            guest_id: self.guest_id,
            orders: self.order_ids.clone(),
            total_amount: self.total_amount,
            paid_amount: self.paid_amount,
            balance_amount: self.balance_amount(),
            status: self.status(),
            payments: self.payments.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Wire view of a bill with the derived fields filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillView {
    pub id: BillId,
    pub guest_id: GuestId,
    pub orders: Vec<OrderId>,
    pub total_amount: i64,
    pub paid_amount: i64,
    pub balance_amount: i64,
    pub status: BillStatus,
    pub payments: Vec<Payment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetBillResponse {
    pub bill: BillView,
}

/// Result of placing an order: the stored order and the bill it landed on.
#[derive(Debug, Serialize, Deserialize)]
pub struct PostOrderResponse {
    pub order: Order,
    pub bill: BillView,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::model::order::OrderStatus;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
    }

    fn order(id: OrderId, guest_id: GuestId, total: i64) -> Order {
        Order {
            id,
            guest_id,
            items: vec![],
            total_amount: total,
            status: OrderStatus::Pending,
            created_at: at(0),
            updated_at: None,
        }
    }

    fn pay(amount: i64) -> Payment {
        Payment {
            amount,
            method: PaymentMethod::Cash,
            paid_by: "Front desk".to_string(),
            paid_at: at(10),
        }
    }

    fn assert_balanced(bill: &Bill) {
        assert_eq!(bill.paid_amount + bill.balance_amount(), bill.total_amount);
    }

    #[test]
    fn status_derivation() {
        assert_eq!(BillStatus::derive(0, 0, 0), BillStatus::Pending);
        assert_eq!(BillStatus::derive(500, 0, 1), BillStatus::Pending);
        assert_eq!(BillStatus::derive(500, 200, 1), BillStatus::PartiallyPaid);
        assert_eq!(BillStatus::derive(500, 500, 1), BillStatus::Paid);
    }

    #[test]
    fn first_order_opens_pending_bill() {
        let mut bill = Bill::new(1, 7, at(0));
        assert!(bill.add_order(&order(1, 7, 500), at(1)).unwrap());
        assert_eq!(bill.total_amount, 500);
        assert_eq!(bill.status(), BillStatus::Pending);
        assert_balanced(&bill);
    }

    #[test]
    fn paying_exact_balance_marks_paid() {
        let mut bill = Bill::new(1, 7, at(0));
        bill.add_order(&order(1, 7, 500), at(1)).unwrap();
        bill.record_payment(pay(200)).unwrap();
        assert_eq!(bill.status(), BillStatus::PartiallyPaid);
        assert_balanced(&bill);
        bill.record_payment(pay(300)).unwrap();
        assert_eq!(bill.status(), BillStatus::Paid);
        assert_eq!(bill.balance_amount(), 0);
        assert_eq!(bill.payments.len(), 2);
    }

    #[test]
    fn new_order_reopens_paid_bill() {
        let mut bill = Bill::new(1, 7, at(0));
        bill.add_order(&order(1, 7, 500), at(1)).unwrap();
        bill.record_payment(pay(500)).unwrap();
        assert_eq!(bill.status(), BillStatus::Paid);

        assert!(bill.add_order(&order(2, 7, 800), at(2)).unwrap());
        assert_eq!(bill.total_amount, 1300);
        assert_eq!(bill.status(), BillStatus::PartiallyPaid);
        assert_eq!(bill.order_ids, vec![1, 2]);
        assert_balanced(&bill);
    }

    #[test]
    fn duplicate_order_is_ignored() {
        let mut bill = Bill::new(1, 7, at(0));
        bill.add_order(&order(1, 7, 500), at(1)).unwrap();
        assert!(!bill.add_order(&order(1, 7, 500), at(2)).unwrap());
        assert_eq!(bill.total_amount, 500);
    }

    #[test]
    fn rejects_bad_orders_and_payments() {
        let mut bill = Bill::new(1, 7, at(0));
        assert_eq!(
            bill.add_order(&order(1, 7, 0), at(1)),
            Err(BillError::NonPositiveOrderTotal)
        );
        assert_eq!(
            bill.add_order(&order(1, 8, 100), at(1)),
            Err(BillError::ForeignOrder { order_id: 1 })
        );
        bill.add_order(&order(2, 7, 100), at(1)).unwrap();
        assert_eq!(bill.record_payment(pay(0)), Err(BillError::NonPositivePayment));
        assert_eq!(
            bill.record_payment(pay(101)),
            Err(BillError::Overpayment { amount: 101, balance: 100 })
        );
        let mut anonymous = pay(50);
        anonymous.paid_by = "  ".to_string();
        assert_eq!(bill.record_payment(anonymous), Err(BillError::MissingPayer));
        assert_eq!(bill.paid_amount, 0);
    }

    #[test]
    fn view_carries_derived_fields() {
        let mut bill = Bill::new(3, 7, at(0));
        bill.add_order(&order(1, 7, 900), at(1)).unwrap();
        bill.record_payment(pay(400)).unwrap();
        let view = bill.view();
        assert_eq!(view.balance_amount, 500);
        assert_eq!(view.status, BillStatus::PartiallyPaid);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "partially_paid");
        assert_eq!(json["balanceAmount"], 500);
    }
}
