use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type HotelId = i64;

/// A tenant account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub id: HotelId,
    pub name: String,
    pub subdomain: String,
    pub custom_domain: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveTenantQuery {
    pub host: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResolveTenantResponse {
    Main,
    Tenant { hotel: Hotel },
}
