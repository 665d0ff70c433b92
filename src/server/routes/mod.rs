use crate::server::controller::error::CustomError;
use crate::server::controller::{auth, bill, contact, guest, notifications, order, room, tenant};
use actix_web::web;

/// Registers every endpoint and maps malformed bodies and queries to `{"error": ...}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|e, _| CustomError::bad_request(e.to_string()).into()))
        .app_data(web::QueryConfig::default().error_handler(|e, _| CustomError::bad_request(e.to_string()).into()))
        .app_data(web::PathConfig::default().error_handler(|e, _| CustomError::bad_request(e.to_string()).into()))
        .service(auth::login)
        .service(auth::me)
        .service(auth::logout)
        .service(tenant::resolve_tenant)
        .service(guest::post_guest)
        .service(guest::get_guests)
        .service(guest::get_guest)
        .service(guest::checkout)
        .service(order::post_order)
        .service(order::get_orders)
        .service(order::patch_order_status)
        .service(bill::get_bill)
        .service(bill::post_payment)
        .service(room::get_room)
        .service(room::post_ticket)
        .service(contact::post_contact)
        .service(notifications::notifications);
}
