use crate::server::auth::AuthError;
use crate::server::database::store::StoreError;
use crate::server::ledger::LedgerError;
use crate::server::model::ErrorBody;
use actix_web::http::StatusCode;
use actix_web::{error, HttpResponse};
use derive_more::{Display, Error};
use log::error;

#[derive(Debug, Display, Error)]
pub enum CustomError {
    #[display("server is busy")]
    ServerIsBusy,
    #[display("{reason}")]
    BadRequest { reason: String },
    #[display("unauthorized")]
    Unauthorized,
    #[display("{entity} not found")]
    ResourceNotFound { entity: &'static str },
    #[display("database error")]
    DbError,
    #[display("timeout occurred")]
    Timeout,
    #[display("Failed to send email")]
    MailRelay,
}

impl CustomError {
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::BadRequest {
            reason: reason.into(),
        }
    }
}

impl error::ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        match *self {
            CustomError::ServerIsBusy | CustomError::DbError | CustomError::MailRelay => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            CustomError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            CustomError::Unauthorized => StatusCode::UNAUTHORIZED,
            CustomError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            CustomError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

impl From<StoreError> for CustomError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, .. } => CustomError::ResourceNotFound { entity },
            StoreError::Busy => CustomError::ServerIsBusy,
            StoreError::Timeout => CustomError::Timeout,
            e => {
                error!("store failure, {}", e);
                CustomError::DbError
            }
        }
    }
}

impl From<LedgerError> for CustomError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::GuestNotFound { .. } => CustomError::ResourceNotFound { entity: "guest" },
            LedgerError::BillNotFound { .. } => CustomError::ResourceNotFound { entity: "bill" },
            e @ (LedgerError::CheckedOut { .. } | LedgerError::OutstandingBalance { .. }) => {
                CustomError::bad_request(e.to_string())
            }
            LedgerError::Invalid(e) => CustomError::bad_request(e.to_string()),
            LedgerError::Store(e) => e.into(),
        }
    }
}

impl From<AuthError> for CustomError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials | AuthError::MissingToken | AuthError::InvalidToken => {
                CustomError::Unauthorized
            }
            AuthError::Store(e) => e.into(),
        }
    }
}
