use crate::server::controller::error::CustomError;
use crate::server::controller::tenant_hotel;
use crate::server::model::room::RoomInfo;
use crate::server::model::ticket::{NewTicket, PostTicketRequest, TicketNotification};
use crate::server::state::AppState;
use crate::server::util::time::helper::get_utc_now;
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use log::{debug, info};

#[get("/v1/rooms/{room}")]
/// Room entry page: the hotel and who is staying
pub(crate) async fn get_room(room: web::Path<String>, req: HttpRequest, data: web::Data<AppState>) -> Result<impl Responder, CustomError> {
    let hotel = tenant_hotel(&req, &data).await?;
    let room_number = data
        .config()
        .room_number
        .validate(&room)
        .map_err(|e| CustomError::bad_request(e.to_string()))?;
    let guest = data
        .store()
        .find_active_guest_by_room(hotel.id, room_number)
        .await?;
    Ok(web::Json(RoomInfo {
        room_number: room_number.to_string(),
        hotel_name: hotel.name,
        guest_name: guest.as_ref().map(|g| g.first_name().to_string()),
    }))
}

#[post("/v1/rooms/{room}/tickets")]
/// Guest request from a room, pushed to the hotel's managers
pub(crate) async fn post_ticket(
    room: web::Path<String>,
    body: web::Json<PostTicketRequest>,
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    let hotel = tenant_hotel(&req, &data).await?;
    let room_number = data
        .config()
        .room_number
        .validate(&room)
        .map_err(|e| CustomError::bad_request(e.to_string()))?;
    let message = body.message.trim();
    if message.is_empty() {
        return Err(CustomError::bad_request("message is required"));
    }
    let guest = data
        .store()
        .find_active_guest_by_room(hotel.id, room_number)
        .await?;
    let ticket = data
        .store()
        .insert_ticket(NewTicket {
            hotel_id: hotel.id,
            room_number: room_number.to_string(),
            guest_name: guest.map(|g| g.name),
            message: message.to_string(),
            created_at: get_utc_now(),
        })
        .await?;
    let delivered = data.hub().publish(hotel.id, TicketNotification::from(&ticket));
    info!("ticket={} from room {} of hotel={}", ticket.id, ticket.room_number, hotel.id);
    debug!("ticket={} reached {} dashboards", ticket.id, delivered);
    Ok(HttpResponse::Created().json(ticket))
}
