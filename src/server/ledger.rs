//! Billing ledger: folds orders and payments into the guest's bill.

use crate::server::database::store::{Store, StoreError};
use crate::server::model::bill::{Bill, BillError, Payment, PostPaymentRequest};
use crate::server::model::guest::{Guest, GuestId};
use crate::server::model::order::{NewOrder, Order};
use crate::server::util::time::helper::get_utc_now;
use derive_more::{Display, Error};
use log::{error, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

#[derive(Debug, Display, Error)]
pub enum LedgerError {
    #[display("guest not found: {guest_id}")]
    GuestNotFound { guest_id: GuestId },
    #[display("no bill for guest: {guest_id}")]
    BillNotFound { guest_id: GuestId },
    #[display("guest has already checked out")]
    CheckedOut { guest_id: GuestId },
    #[display("bill has an outstanding balance of {balance}")]
    OutstandingBalance { balance: i64 },
    #[display("{_0}")]
    Invalid(#[error(source)] BillError),
    #[display("{_0}")]
    Store(#[error(source)] StoreError),
}

impl From<BillError> for LedgerError {
    fn from(e: BillError) -> Self {
        Self::Invalid(e)
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// Operations on one guest's bill run one at a time.
pub struct Ledger {
    store: Arc<dyn Store>,
    locks: Mutex<HashMap<GuestId, Arc<tokio::sync::Mutex<()>>>>,
}

impl Ledger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_guest(&self, guest_id: GuestId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // drop locks nobody holds or waits on
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(guest_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Appends `order` to the guest's bill, opening the bill on the first order.
    pub async fn add_order_to_bill(&self, guest_id: GuestId, order: &Order) -> Result<Bill, LedgerError> {
        if order.guest_id != guest_id {
            return Err(BillError::ForeignOrder { order_id: order.id }.into());
        }
        if order.total_amount <= 0 {
            return Err(BillError::NonPositiveOrderTotal.into());
        }
        let _guard = self.lock_guest(guest_id).await;
        if self.store.get_guest(guest_id).await?.is_none() {
            return Err(LedgerError::GuestNotFound { guest_id });
        }
        self.fold_order(guest_id, order).await
    }

    /// Stores a new order and bills it under one guest lock. An order that
    /// cannot be billed is not kept.
    pub async fn place_order(&self, new: NewOrder) -> Result<(Order, Bill), LedgerError> {
        let guest_id = new.guest_id;
        if new.total_amount <= 0 {
            return Err(BillError::NonPositiveOrderTotal.into());
        }
        let _guard = self.lock_guest(guest_id).await;
        let guest = self
            .store
            .get_guest(guest_id)
            .await?
            .ok_or(LedgerError::GuestNotFound { guest_id })?;
        if guest.checked_out {
            return Err(LedgerError::CheckedOut { guest_id });
        }
        if let Some(bill) = self.store.find_bill_by_guest(guest_id).await? {
            bill.check_order_total(new.total_amount)?;
        }
        let order = self.store.insert_order(new).await?;
        match self.fold_order(guest_id, &order).await {
            Ok(bill) => Ok((order, bill)),
            Err(e) => {
                match self.store.delete_order(order.id).await {
                    Ok(_) => warn!("dropped order={} that could not be billed, {}", order.id, e),
                    Err(cleanup) => error!(
                        "order={} was stored but not billed, {}, removing it failed, {}",
                        order.id, e, cleanup
                    ),
                }
                Err(e)
            }
        }
    }

    /// Closes the stay once the bill is settled. A closed stay is returned as is.
    pub async fn check_out(&self, guest_id: GuestId) -> Result<Guest, LedgerError> {
        let _guard = self.lock_guest(guest_id).await;
        let guest = self
            .store
            .get_guest(guest_id)
            .await?
            .ok_or(LedgerError::GuestNotFound { guest_id })?;
        if guest.checked_out {
            return Ok(guest);
        }
        if let Some(bill) = self.store.find_bill_by_guest(guest_id).await? {
            let balance = bill.balance_amount();
            if balance > 0 {
                return Err(LedgerError::OutstandingBalance { balance });
            }
        }
        self.store
            .check_out_guest(guest_id, get_utc_now())
            .await?
            .ok_or(LedgerError::GuestNotFound { guest_id })
    }

    /// Caller holds the guest lock.
    async fn fold_order(&self, guest_id: GuestId, order: &Order) -> Result<Bill, LedgerError> {
        let now = get_utc_now();
        let mut bill = match self.store.find_bill_by_guest(guest_id).await? {
            Some(bill) => bill,
            None => {
                let bill = self.store.create_bill(guest_id, now).await?;
                info!("opened bill={} for guest={}", bill.id, guest_id);
                bill
            }
        };
        let before = bill.status();
        if !bill.add_order(order, now)? {
            warn!("order={} is already on bill={}, skipping", order.id, bill.id);
            return Ok(bill);
        }
        self.store.save_bill(&bill).await?;
        info!(
            "added order={} to bill={}, total={} status {} -> {}",
            order.id,
            bill.id,
            bill.total_amount,
            before,
            bill.status()
        );
        Ok(bill)
    }

    pub async fn record_payment(&self, guest_id: GuestId, req: PostPaymentRequest) -> Result<Bill, LedgerError> {
        let _guard = self.lock_guest(guest_id).await;
        let mut bill = self
            .store
            .find_bill_by_guest(guest_id)
            .await?
            .ok_or(LedgerError::BillNotFound { guest_id })?;
        bill.record_payment(Payment {
            amount: req.amount,
            method: req.method,
            paid_by: req.paid_by.trim().to_string(),
            paid_at: get_utc_now(),
        })?;
        self.store.save_bill(&bill).await?;
        info!(
            "recorded payment of {} on bill={}, balance={} status={}",
            req.amount,
            bill.id,
            bill.balance_amount(),
            bill.status()
        );
        Ok(bill)
    }

    pub async fn get_bill(&self, guest_id: GuestId) -> Result<Bill, LedgerError> {
        self.store
            .find_bill_by_guest(guest_id)
            .await?
            .ok_or(LedgerError::BillNotFound { guest_id })
    }
}
