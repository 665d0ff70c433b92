use crate::server::model::hotel::HotelId;
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub type StaffId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    #[display("manager")]
    Manager,
    #[display("staff")]
    Staff,
}

impl FromStr for StaffRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manager" => Ok(Self::Manager),
            "staff" => Ok(Self::Staff),
            s => Err(format!("Invalid StaffRole: {s}")),
        }
    }
}

/// The authenticated staff member as seen by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: StaffId,
    pub hotel_id: HotelId,
    pub email: String,
    pub name: String,
    pub role: StaffRole,
}

/// Stored staff record with credentials.
#[derive(Debug, Clone)]
pub struct StaffAccount {
    pub user: AuthUser,
    /// hex sha256 of salt + password
    pub password_hash: String,
    pub salt: String,
}

/// Server side session, keyed by the hash of the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token_hash: String,
    pub staff_id: StaffId,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AuthUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: AuthUser,
}
