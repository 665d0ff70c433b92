use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// Allowed shape of a room number: all digits, length within bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomNumberRule {
    pub min_digits: usize,
    pub max_digits: usize,
}

impl Default for RoomNumberRule {
    fn default() -> Self {
        Self {
            min_digits: 3,
            max_digits: 4,
        }
    }
}

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum RoomNumberError {
    #[display("Please enter your room number")]
    Empty,
    #[display("Room number must be {min}-{max} digits")]
    Format { min: usize, max: usize },
}

impl RoomNumberRule {
    /// Returns the trimmed room number if it satisfies the rule.
    pub fn validate<'a>(&self, input: &'a str) -> Result<&'a str, RoomNumberError> {
        let room = input.trim();
        if room.is_empty() {
            return Err(RoomNumberError::Empty);
        }
        let digits_only = room.chars().all(|c| c.is_ascii_digit());
        if !digits_only || room.len() < self.min_digits || room.len() > self.max_digits {
            return Err(RoomNumberError::Format {
                min: self.min_digits,
                max: self.max_digits,
            });
        }
        Ok(room)
    }
}

/// Public view of a room for the guest chat entry page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub room_number: String,
    pub hotel_name: String,
    /// first name of the guest currently staying in the room
    pub guest_name: Option<String>,
}
