use crate::server::controller::auth::AuthenticatedStaff;
use crate::server::controller::error::CustomError;
use crate::server::controller::staff_guest;
use crate::server::model::bill::PostOrderResponse;
use crate::server::model::order::{GetOrdersResponse, NewOrder, PatchOrderStatusRequest, PostOrderRequest};
use crate::server::state::AppState;
use crate::server::util::time::helper::get_utc_now;
use actix_web::{get, patch, post, web, HttpResponse, Responder};
use log::info;

#[post("/v1/guests/{id}/orders")]
/// Place an order and fold it into the guest's bill
pub(crate) async fn post_order(
    staff: AuthenticatedStaff,
    id: web::Path<i64>,
    body: web::Json<PostOrderRequest>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    let guest = staff_guest(&data, &staff.user, id.into_inner()).await?;
    let (items, total_amount) = body.into_inner().price().map_err(CustomError::bad_request)?;
    let (order, bill) = data
        .ledger()
        .place_order(NewOrder {
            guest_id: guest.id,
            items,
            total_amount,
            created_at: get_utc_now(),
        })
        .await?;
    info!("guest={} placed order={} total={}", guest.id, order.id, order.total_amount);
    Ok(HttpResponse::Created().json(PostOrderResponse {
        order,
        bill: bill.view(),
    }))
}

#[get("/v1/guests/{id}/orders")]
pub(crate) async fn get_orders(
    staff: AuthenticatedStaff,
    id: web::Path<i64>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    let guest = staff_guest(&data, &staff.user, id.into_inner()).await?;
    let orders = data.store().list_orders(guest.id).await?;
    Ok(web::Json(GetOrdersResponse { orders }))
}

#[patch("/v1/orders/{id}/status")]
pub(crate) async fn patch_order_status(
    staff: AuthenticatedStaff,
    id: web::Path<i64>,
    body: web::Json<PatchOrderStatusRequest>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    let not_found = CustomError::ResourceNotFound { entity: "order" };
    let Some(order) = data.store().get_order(id.into_inner()).await? else {
        return Err(not_found);
    };
    // orders of another hotel's guest look absent
    staff_guest(&data, &staff.user, order.guest_id)
        .await
        .map_err(|_| not_found)?;
    let next = body.into_inner().status;
    if !order.status.can_become(next) {
        return Err(CustomError::bad_request(format!(
            "order cannot move from {} to {}",
            order.status, next
        )));
    }
    let order = data
        .store()
        .update_order_status(order.id, next, get_utc_now())
        .await?
        .ok_or(CustomError::ResourceNotFound { entity: "order" })?;
    info!("order={} is now {}", order.id, order.status);
    Ok(web::Json(order))
}
