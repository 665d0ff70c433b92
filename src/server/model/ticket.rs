//! Guest service requests and the notification channel frames that carry them.

use crate::server::model::hotel::HotelId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type TicketId = i64;

/// Group every staff dashboard of a hotel joins.
pub const MANAGERS_ROOM: &str = "managers";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    pub hotel_id: HotelId,
    pub room_number: String,
    pub guest_name: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub hotel_id: HotelId,
    pub room_number: String,
    pub guest_name: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostTicketRequest {
    pub message: String,
}

/// Browsers cannot set headers on a websocket upgrade, so the token rides in the query.
#[derive(Debug, Deserialize)]
pub struct NotificationsQuery {
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestInfo {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    pub guest_info: GuestInfo,
    pub room_number: String,
}

/// Payload of the `newTicket` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketNotification {
    pub ticket: TicketSummary,
    pub message: String,
}

impl From<&Ticket> for TicketNotification {
    fn from(ticket: &Ticket) -> Self {
        Self {
            ticket: TicketSummary {
                guest_info: GuestInfo {
                    name: ticket.guest_name.clone().unwrap_or_else(|| "Guest".to_string()),
                },
                room_number: ticket.room_number.clone(),
            },
            message: ticket.message.clone(),
        }
    }
}

/// Frames sent by a dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ClientFrame {
    #[serde(rename = "joinManagersRoom")]
    JoinManagersRoom,
}

/// Frames pushed to a dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerFrame {
    #[serde(rename = "newTicket")]
    NewTicket(TicketNotification),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn frames_match_the_wire_names() {
        let join = serde_json::to_value(ClientFrame::JoinManagersRoom).unwrap();
        assert_eq!(join, json!({ "event": "joinManagersRoom" }));

        let frame: ServerFrame = serde_json::from_value(json!({
            "event": "newTicket",
            "data": {
                "ticket": { "guestInfo": { "name": "Ada" }, "roomNumber": "204" },
                "message": "Extra towels please"
            }
        }))
        .unwrap();
        let ServerFrame::NewTicket(n) = frame;
        assert_eq!(n.ticket.guest_info.name, "Ada");
        assert_eq!(n.ticket.room_number, "204");
    }
}
