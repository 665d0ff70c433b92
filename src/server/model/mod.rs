use serde::{Deserialize, Serialize};

pub mod bill;
pub mod config;
pub mod contact;
pub mod guest;
pub mod hotel;
pub mod order;
pub mod room;
pub mod staff;
pub mod ticket;

#[derive(Debug, Deserialize)]
pub(crate) struct CommonRequestParams {
    pub page: Option<u8>,
    pub page_size: Option<u8>,
}

impl CommonRequestParams {
    const DEFAULT_PAGE_SIZE: u8 = 20;

    /// (offset, limit) for the requested page
    pub fn window(&self) -> (i64, i64) {
        let page = i64::from(self.page.unwrap_or(0));
        let size = i64::from(self.page_size.unwrap_or(Self::DEFAULT_PAGE_SIZE).max(1));
        (page * size, size)
    }
}

/// Error payload returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Plain acknowledgement payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}
