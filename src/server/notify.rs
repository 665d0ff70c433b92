//! Fan-out of ticket notifications to connected staff dashboards.

use crate::server::model::hotel::HotelId;
use crate::server::model::ticket::TicketNotification;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;

/// Capacity of each hotel's broadcast channel
const CHANNEL_CAPACITY: usize = 256;

/// One `managers` group per hotel.
#[derive(Debug, Default)]
pub struct NotificationHub {
    senders: RwLock<HashMap<HotelId, broadcast::Sender<TicketNotification>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the managers group of a hotel.
    pub fn subscribe(&self, hotel_id: HotelId) -> broadcast::Receiver<TicketNotification> {
        let mut senders = self.senders.write().unwrap_or_else(PoisonError::into_inner);
        senders
            .entry(hotel_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Returns how many dashboards received the notification.
    pub fn publish(&self, hotel_id: HotelId, notification: TicketNotification) -> usize {
        let senders = self.senders.read().unwrap_or_else(PoisonError::into_inner);
        match senders.get(&hotel_id) {
            // no receivers left is not an error
            Some(sender) => sender.send(notification).unwrap_or(0),
            None => 0,
        }
    }

    pub fn subscriber_count(&self, hotel_id: HotelId) -> usize {
        let senders = self.senders.read().unwrap_or_else(PoisonError::into_inner);
        senders.get(&hotel_id).map_or(0, broadcast::Sender::receiver_count)
    }

    /// Forget groups nobody listens to anymore.
    pub fn cleanup_empty_groups(&self) {
        let mut senders = self.senders.write().unwrap_or_else(PoisonError::into_inner);
        senders.retain(|_, sender| sender.receiver_count() > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::model::ticket::{GuestInfo, TicketSummary};

    fn notification(room: &str) -> TicketNotification {
        TicketNotification {
            ticket: TicketSummary {
                guest_info: GuestInfo {
                    name: "Ada".to_string(),
                },
                room_number: room.to_string(),
            },
            message: "Late checkout?".to_string(),
        }
    }

    #[test]
    fn subscribers_of_a_hotel_receive_its_tickets() {
        let hub = NotificationHub::new();
        let mut rx1 = hub.subscribe(1);
        let mut rx2 = hub.subscribe(1);
        assert_eq!(hub.subscriber_count(1), 2);

        assert_eq!(hub.publish(1, notification("101")), 2);
        assert_eq!(rx1.try_recv().unwrap().ticket.room_number, "101");
        assert_eq!(rx2.try_recv().unwrap().ticket.room_number, "101");
    }

    #[test]
    fn no_cross_hotel_delivery() {
        let hub = NotificationHub::new();
        let mut rx1 = hub.subscribe(1);
        let _rx2 = hub.subscribe(2);

        hub.publish(2, notification("202"));
        assert!(rx1.try_recv().is_err());
        assert_eq!(hub.publish(3, notification("303")), 0);
    }

    #[test]
    fn cleanup_drops_abandoned_groups() {
        let hub = NotificationHub::new();
        drop(hub.subscribe(1));
        let _kept = hub.subscribe(2);
        hub.cleanup_empty_groups();
        assert_eq!(hub.subscriber_count(1), 0);
        assert_eq!(hub.publish(1, notification("101")), 0);
        assert_eq!(hub.subscriber_count(2), 1);
    }
}
