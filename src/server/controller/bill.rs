use crate::server::controller::auth::AuthenticatedStaff;
use crate::server::controller::error::CustomError;
use crate::server::controller::staff_guest;
use crate::server::model::bill::{GetBillResponse, PostPaymentRequest};
use crate::server::state::AppState;
use actix_web::{get, post, web, Responder};

#[get("/v1/guests/{id}/bill")]
/// get the guest's bill with derived balance and status
pub(crate) async fn get_bill(
    staff: AuthenticatedStaff,
    id: web::Path<i64>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    let guest = staff_guest(&data, &staff.user, id.into_inner()).await?;
    let bill = data.ledger().get_bill(guest.id).await?;
    Ok(web::Json(GetBillResponse { bill: bill.view() }))
}

#[post("/v1/guests/{id}/payments")]
/// record a payment against the guest's bill
pub(crate) async fn post_payment(
    staff: AuthenticatedStaff,
    id: web::Path<i64>,
    body: web::Json<PostPaymentRequest>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    let guest = staff_guest(&data, &staff.user, id.into_inner()).await?;
    let bill = data.ledger().record_payment(guest.id, body.into_inner()).await?;
    Ok(web::Json(GetBillResponse { bill: bill.view() }))
}

#[cfg(test)]
mod tests {
    use crate::server::controller::tests::fixture;
    use crate::server::model::bill::{BillStatus, GetBillResponse};
    use crate::server::model::guest::Guest;
    use crate::server::model::ErrorBody;
    use crate::server::routes;
    use actix_web::{test, web, App};
    use serde_json::json;

    #[actix_web::test]
    async fn paid_bill_reopens_when_a_new_order_arrives() {
        let fx = fixture().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(fx.state.clone()))
                .configure(routes::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/v1/guests")
            .insert_header(fx.bearer())
            .set_json(json!({ "name": "Ada Lovelace", "roomNumber": "204" }))
            .to_request();
        let guest: Guest = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::get()
            .uri(&format!("/v1/guests/{}/bill", guest.id))
            .insert_header(fx.bearer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::post()
            .uri(&format!("/v1/guests/{}/orders", guest.id))
            .insert_header(fx.bearer())
            .set_json(json!({ "items": [{ "name": "Breakfast", "quantity": 1, "unitPrice": 500 }] }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);

        let req = test::TestRequest::post()
            .uri(&format!("/v1/guests/{}/payments", guest.id))
            .insert_header(fx.bearer())
            .set_json(json!({ "amount": 500, "method": "cash", "paidBy": "Ada Lovelace" }))
            .to_request();
        let paid: GetBillResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(paid.bill.status, BillStatus::Paid);
        assert_eq!(paid.bill.balance_amount, 0);

        let req = test::TestRequest::post()
            .uri(&format!("/v1/guests/{}/orders", guest.id))
            .insert_header(fx.bearer())
            .set_json(json!({ "items": [{ "name": "Dinner", "quantity": 1, "unitPrice": 800 }] }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);

        let req = test::TestRequest::get()
            .uri(&format!("/v1/guests/{}/bill", guest.id))
            .insert_header(fx.bearer())
            .to_request();
        let reopened: GetBillResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(reopened.bill.total_amount, 1300);
        assert_eq!(reopened.bill.paid_amount, 500);
        assert_eq!(reopened.bill.balance_amount, 800);
        assert_eq!(reopened.bill.status, BillStatus::PartiallyPaid);
        assert_eq!(reopened.bill.orders.len(), 2);

        // checkout waits for the balance
        let req = test::TestRequest::post()
            .uri(&format!("/v1/guests/{}/checkout", guest.id))
            .insert_header(fx.bearer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::post()
            .uri(&format!("/v1/guests/{}/payments", guest.id))
            .insert_header(fx.bearer())
            .set_json(json!({ "amount": 900, "method": "card", "paidBy": "Ada Lovelace" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error, "payment of 900 exceeds outstanding balance 800");

        let req = test::TestRequest::post()
            .uri(&format!("/v1/guests/{}/payments", guest.id))
            .insert_header(fx.bearer())
            .set_json(json!({ "amount": 800, "method": "card", "paidBy": "Ada Lovelace" }))
            .to_request();
        let settled: GetBillResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(settled.bill.status, BillStatus::Paid);
        assert_eq!(settled.bill.payments.len(), 2);

        let req = test::TestRequest::post()
            .uri(&format!("/v1/guests/{}/checkout", guest.id))
            .insert_header(fx.bearer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
    }

    #[actix_web::test]
    async fn payment_without_bill_is_not_found() {
        let fx = fixture().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(fx.state.clone()))
                .configure(routes::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/v1/guests")
            .insert_header(fx.bearer())
            .set_json(json!({ "name": "Ada Lovelace", "roomNumber": "204" }))
            .to_request();
        let guest: Guest = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri(&format!("/v1/guests/{}/payments", guest.id))
            .insert_header(fx.bearer())
            .set_json(json!({ "amount": 100, "method": "cash", "paidBy": "Ada" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
        let body: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error, "bill not found");
    }
}
