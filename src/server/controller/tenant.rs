use crate::server::controller::error::CustomError;
use crate::server::model::hotel::{ResolveTenantQuery, ResolveTenantResponse};
use crate::server::state::AppState;
use crate::server::tenant::resolve_host;
use crate::tenant::TenantLookup;
use actix_web::{get, web, Responder};

#[get("/v1/tenants/resolve")]
/// Classify a host and look up the hotel behind it
pub(crate) async fn resolve_tenant(
    query: web::Query<ResolveTenantQuery>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    let response = match resolve_host(data.domains(), data.store(), &query.host).await? {
        TenantLookup::MainDomain => ResolveTenantResponse::Main,
        TenantLookup::Hotel(hotel) => ResolveTenantResponse::Tenant { hotel },
        TenantLookup::NoHotel => return Err(CustomError::ResourceNotFound { entity: "hotel" }),
    };
    Ok(web::Json(response))
}

#[cfg(test)]
mod tests {
    use crate::server::controller::tests::fixture;
    use crate::server::routes;
    use actix_web::{test, web, App};

    #[actix_web::test]
    async fn resolves_main_tenant_and_missing_hosts() {
        let fx = fixture().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(fx.state.clone()))
                .configure(routes::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/v1/tenants/resolve?host=www.hotelier.example")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["kind"], "main");

        let req = test::TestRequest::get()
            .uri("/v1/tenants/resolve?host=seaside.hotelier.example:443")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["kind"], "tenant");
        assert_eq!(body["hotel"]["id"], fx.staff.hotel_id);
        assert_eq!(body["hotel"]["name"], "Seaside Inn");

        let req = test::TestRequest::get()
            .uri("/v1/tenants/resolve?host=ghost.hotelier.example")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::get().uri("/v1/tenants/resolve").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }
}
