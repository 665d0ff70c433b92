use crate::server::controller::error::CustomError;
use crate::server::model::staff::{AuthUser, LoginRequest, LoginResponse, MeResponse};
use crate::server::model::MessageBody;
use crate::server::state::AppState;
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{get, post, web, FromRequest, HttpRequest, Responder};
use futures_util::future::LocalBoxFuture;
use log::{error, info};

pub(super) fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Staff member behind the request's bearer token.
pub(crate) struct AuthenticatedStaff {
    pub user: AuthUser,
    pub token: String,
}

impl FromRequest for AuthenticatedStaff {
    type Error = CustomError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let data = req.app_data::<web::Data<AppState>>().cloned();
        Box::pin(async move {
            let Some(data) = data else {
                error!("AppState is not registered");
                return Err(CustomError::ServerIsBusy);
            };
            let token = token.ok_or(CustomError::Unauthorized)?;
            let user = data.auth().verify(&token).await?;
            Ok(AuthenticatedStaff { user, token })
        })
    }
}

#[post("/auth/login")]
/// exchange credentials for a bearer token
pub(crate) async fn login(body: web::Json<LoginRequest>, data: web::Data<AppState>) -> Result<impl Responder, CustomError> {
    let LoginRequest { email, password } = body.into_inner();
    let (token, user) = data.auth().login(&email, &password).await?;
    Ok(web::Json(LoginResponse { token, user }))
}

#[get("/auth/me")]
pub(crate) async fn me(staff: AuthenticatedStaff) -> impl Responder {
    web::Json(MeResponse { user: staff.user })
}

#[post("/auth/logout")]
pub(crate) async fn logout(staff: AuthenticatedStaff, data: web::Data<AppState>) -> Result<impl Responder, CustomError> {
    data.auth().logout(&staff.token).await?;
    info!("staff={} logged out", staff.user.id);
    Ok(web::Json(MessageBody {
        message: "Logged out".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::server::auth::tests::seed;
    use crate::server::database::memory::MemoryStore;
    use crate::server::mailer::tests::RecordingRelay;
    use crate::server::model::config::ServerConfig;
    use crate::server::model::staff::{LoginResponse, MeResponse};
    use crate::server::routes;
    use crate::server::state::AppState;
    use actix_web::{test, web, App};
    use serde_json::json;
    use std::sync::Arc;

    #[actix_web::test]
    async fn login_me_logout_roundtrip() {
        let store = Arc::new(MemoryStore::new());
        let user = seed(&store, "seaside").await;
        let state = AppState::new(ServerConfig::default(), store, Arc::new(RecordingRelay::default()));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(routes::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/auth/me").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": user.email, "password": "nope" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": user.email, "password": "secret" }))
            .to_request();
        let LoginResponse { token, .. } = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/auth/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let me: MeResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(me.user, user);

        let req = test::TestRequest::post()
            .uri("/auth/logout")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::get()
            .uri("/auth/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "unauthorized");
    }
}
