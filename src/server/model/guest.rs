use crate::server::model::hotel::HotelId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type GuestId = i64;

/// A guest stay, created at check-in and closed at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: GuestId,
    pub hotel_id: HotelId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub room_number: String,
    pub checked_in_at: DateTime<Utc>,
    pub checked_out: bool,
    pub checked_out_at: Option<DateTime<Utc>>,
}

impl Guest {
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Guest fields known at check-in, before an id is assigned.
#[derive(Debug, Clone)]
pub struct NewGuest {
    pub hotel_id: HotelId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub room_number: String,
    pub checked_in_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostGuestRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub room_number: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetGuestsResponse {
    pub guests: Vec<Guest>,
}
