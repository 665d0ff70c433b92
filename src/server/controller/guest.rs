use crate::server::controller::auth::AuthenticatedStaff;
use crate::server::controller::error::CustomError;
use crate::server::controller::staff_guest;
use crate::server::model::guest::{GetGuestsResponse, NewGuest, PostGuestRequest};
use crate::server::model::CommonRequestParams;
use crate::server::state::AppState;
use crate::server::util::time::helper::get_utc_now;
use actix_web::{get, post, web, HttpResponse, Responder};
use log::{info, warn};

fn optional(field: Option<String>) -> Option<String> {
    field.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[post("/v1/guests")]
/// Check a guest into a room of the staff member's hotel
pub(crate) async fn post_guest(
    staff: AuthenticatedStaff,
    body: web::Json<PostGuestRequest>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    let PostGuestRequest {
        name,
        email,
        phone,
        room_number,
    } = body.into_inner();
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(CustomError::bad_request("guest name is required"));
    }
    let room_number = data
        .config()
        .room_number
        .validate(&room_number)
        .map_err(|e| CustomError::bad_request(e.to_string()))?
        .to_string();
    let hotel_id = staff.user.hotel_id;
    if data
        .store()
        .find_active_guest_by_room(hotel_id, &room_number)
        .await?
        .is_some()
    {
        warn!("room {} of hotel={} is already occupied", room_number, hotel_id);
        return Err(CustomError::bad_request(format!("room {room_number} is occupied")));
    }
    let guest = data
        .store()
        .insert_guest(NewGuest {
            hotel_id,
            name,
            email: optional(email),
            phone: optional(phone),
            room_number,
            checked_in_at: get_utc_now(),
        })
        .await?;
    info!("checked in guest={} to room {}", guest.id, guest.room_number);
    Ok(HttpResponse::Created().json(guest))
}

#[get("/v1/guests")]
pub(crate) async fn get_guests(
    staff: AuthenticatedStaff,
    params: web::Query<CommonRequestParams>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    let (offset, limit) = params.window();
    let guests = data
        .store()
        .list_guests(staff.user.hotel_id, offset, limit)
        .await?;
    Ok(web::Json(GetGuestsResponse { guests }))
}

#[get("/v1/guests/{id}")]
pub(crate) async fn get_guest(
    staff: AuthenticatedStaff,
    id: web::Path<i64>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    let guest = staff_guest(&data, &staff.user, id.into_inner()).await?;
    Ok(web::Json(guest))
}

#[post("/v1/guests/{id}/checkout")]
/// Close the stay; the bill has to be settled first
pub(crate) async fn checkout(
    staff: AuthenticatedStaff,
    id: web::Path<i64>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    let guest = staff_guest(&data, &staff.user, id.into_inner()).await?;
    if guest.checked_out {
        return Ok(web::Json(guest));
    }
    let guest = data.ledger().check_out(guest.id).await?;
    info!("checked out guest={} from room {}", guest.id, guest.room_number);
    Ok(web::Json(guest))
}

#[cfg(test)]
mod tests {
    use crate::server::controller::tests::fixture;
    use crate::server::database::store::Store;
    use crate::server::model::guest::{GetGuestsResponse, Guest};
    use crate::server::routes;
    use actix_web::{test, web, App};
    use serde_json::json;

    #[actix_web::test]
    async fn check_in_list_and_check_out() {
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
            .set_json(json!({ "name": " Ada Lovelace ", "email": "", "roomNumber": " 204 " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let guest: Guest = test::read_body_json(resp).await;
        assert_eq!(guest.name, "Ada Lovelace");
        assert_eq!(guest.room_number, "204");
        assert_eq!(guest.email, None);
        assert_eq!(guest.hotel_id, fx.staff.hotel_id);

        let req = test::TestRequest::post()
            .uri("/v1/guests")
            .insert_header(fx.bearer())
            .set_json(json!({ "name": "Bob", "roomNumber": "204" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::get()
            .uri("/v1/guests?page=0&page_size=10")
            .insert_header(fx.bearer())
            .to_request();
        let list: GetGuestsResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list.guests, vec![guest.clone()]);

        let req = test::TestRequest::post()
            .uri(&format!("/v1/guests/{}/checkout", guest.id))
            .insert_header(fx.bearer())
            .to_request();
        let closed: Guest = test::call_and_read_body_json(&app, req).await;
        assert!(closed.checked_out);
        assert!(closed.checked_out_at.is_some());
    }

    #[actix_web::test]
    async fn rejects_bad_room_numbers_and_foreign_guests() {
        let fx = fixture().await;
        let other = fx.store.add_hotel("Mountain Lodge", "mountain", None).await;
        let foreign = fx
            .store
            .insert_guest(crate::server::model::guest::NewGuest {
                hotel_id: other.id,
                name: "Eve".to_string(),
                email: None,
                phone: None,
                room_number: "101".to_string(),
                checked_in_at: chrono::Utc::now(),
            })
            .await
            .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(fx.state.clone()))
                .configure(routes::configure),
        )
        .await;

        for room in ["", "12", "12a4", "12345"] {
            let req = test::TestRequest::post()
                .uri("/v1/guests")
                .insert_header(fx.bearer())
                .set_json(json!({ "name": "Ada", "roomNumber": room }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), 400, "{room}");
        }

        let req = test::TestRequest::get()
            .uri(&format!("/v1/guests/{}", foreign.id))
            .insert_header(fx.bearer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::get().uri("/v1/guests").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);
    }
}
