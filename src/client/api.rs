//! Http client for the hotelier server.

use crate::client::{Backend, ClientError};
use crate::server::model::bill::{BillView, GetBillResponse, PaymentMethod, PostOrderResponse};
use crate::server::model::guest::{GetGuestsResponse, Guest};
use crate::server::model::hotel::ResolveTenantResponse;
use crate::server::model::order::{GetOrdersResponse, Order, OrderItemRequest, OrderStatus};
use crate::server::model::room::RoomInfo;
use crate::server::model::staff::{AuthUser, LoginResponse, MeResponse};
use crate::server::model::ticket::Ticket;
use crate::server::model::ErrorBody;
use crate::tenant::TenantLookup;
use async_trait::async_trait;
use reqwest::header::HOST;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Maps a non-success response to a [`ClientError`].
async fn error_for(res: Response) -> ClientError {
    let status = res.status();
    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::NOT_FOUND => ClientError::NotFound,
        status => {
            let text = res.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or(text);
            ClientError::Unexpected {
                status: status.as_u16(),
                reason,
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token.or(self.token.as_deref()) {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let res = req.send().await?;
        if !res.status().is_success() {
            return Err(error_for(res).await);
        }
        Ok(res.json::<T>().await?)
    }

    pub async fn check_in(&self, name: &str, room_number: &str, email: Option<&str>, phone: Option<&str>) -> Result<Guest, ClientError> {
        let req = self.http.post(self.url("/v1/guests")).json(&json!({
            "name": name,
            "roomNumber": room_number,
            "email": email,
            "phone": phone,
        }));
        self.send(self.authorized(req, None)).await
    }

    pub async fn guests(&self, page: u8, page_size: u8) -> Result<Vec<Guest>, ClientError> {
        let req = self
            .http
            .get(self.url("/v1/guests"))
            .query(&[("page", page), ("page_size", page_size)]);
        let res: GetGuestsResponse = self.send(self.authorized(req, None)).await?;
        Ok(res.guests)
    }

    pub async fn check_out(&self, guest_id: i64) -> Result<Guest, ClientError> {
        let req = self.http.post(self.url(&format!("/v1/guests/{guest_id}/checkout")));
        self.send(self.authorized(req, None)).await
    }

    pub async fn place_order(&self, guest_id: i64, items: &[OrderItemRequest]) -> Result<PostOrderResponse, ClientError> {
        let req = self
            .http
            .post(self.url(&format!("/v1/guests/{guest_id}/orders")))
            .json(&json!({ "items": items }));
        self.send(self.authorized(req, None)).await
    }

    pub async fn orders(&self, guest_id: i64) -> Result<Vec<Order>, ClientError> {
        let req = self.http.get(self.url(&format!("/v1/guests/{guest_id}/orders")));
        let res: GetOrdersResponse = self.send(self.authorized(req, None)).await?;
        Ok(res.orders)
    }

    pub async fn set_order_status(&self, order_id: i64, status: OrderStatus) -> Result<Order, ClientError> {
        let req = self
            .http
            .patch(self.url(&format!("/v1/orders/{order_id}/status")))
            .json(&json!({ "status": status }));
        self.send(self.authorized(req, None)).await
    }

    pub async fn bill(&self, guest_id: i64) -> Result<BillView, ClientError> {
        let req = self.http.get(self.url(&format!("/v1/guests/{guest_id}/bill")));
        let res: GetBillResponse = self.send(self.authorized(req, None)).await?;
        Ok(res.bill)
    }

    pub async fn pay(&self, guest_id: i64, amount: i64, method: PaymentMethod, paid_by: &str) -> Result<BillView, ClientError> {
        let req = self
            .http
            .post(self.url(&format!("/v1/guests/{guest_id}/payments")))
            .json(&json!({ "amount": amount, "method": method, "paidBy": paid_by }));
        let res: GetBillResponse = self.send(self.authorized(req, None)).await?;
        Ok(res.bill)
    }

    /// Room pages are public and tenant scoped by the host.
    pub async fn room(&self, tenant_host: &str, room_number: &str) -> Result<RoomInfo, ClientError> {
        let req = self
            .http
            .get(self.url(&format!("/v1/rooms/{room_number}")))
            .header(HOST, tenant_host);
        self.send(req).await
    }

    pub async fn create_ticket(&self, tenant_host: &str, room_number: &str, message: &str) -> Result<Ticket, ClientError> {
        let req = self
            .http
            .post(self.url(&format!("/v1/rooms/{room_number}/tickets")))
            .header(HOST, tenant_host)
            .json(&json!({ "message": message }));
        self.send(req).await
    }

    /// Websocket url of the notification channel for `token`.
    pub fn notifications_url(&self, token: &str) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!("{ws_base}/ws/notifications?token={token}")
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn me(&self, token: &str) -> Result<AuthUser, ClientError> {
        let req = self.http.get(self.url("/auth/me"));
        let res: MeResponse = self.send(self.authorized(req, Some(token))).await?;
        Ok(res.user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let req = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        self.send(req).await
    }

    async fn logout(&self, token: &str) -> Result<(), ClientError> {
        let req = self.http.post(self.url("/auth/logout"));
        let res = self.authorized(req, Some(token)).send().await?;
        if !res.status().is_success() {
            return Err(error_for(res).await);
        }
        Ok(())
    }

    async fn resolve_tenant(&self, host: &str) -> Result<TenantLookup, ClientError> {
        let req = self
            .http
            .get(self.url("/v1/tenants/resolve"))
            .query(&[("host", host)]);
        match self.send::<ResolveTenantResponse>(req).await {
            Ok(ResolveTenantResponse::Main) => Ok(TenantLookup::MainDomain),
            Ok(ResolveTenantResponse::Tenant { hotel }) => Ok(TenantLookup::Hotel(hotel)),
            Err(ClientError::NotFound) => Ok(TenantLookup::NoHotel),
            Err(e) => Err(e),
        }
    }
}
