use crate::server::controller::error::CustomError;
use crate::server::mailer::contact_mail;
use crate::server::model::contact::ContactRequest;
use crate::server::model::MessageBody;
use crate::server::state::AppState;
use actix_web::{post, web, Responder};
use log::{error, info};

#[post("/api/contact")]
/// Forward a marketing site contact request to the sales inbox
pub(crate) async fn post_contact(body: web::Json<ContactRequest>, data: web::Data<AppState>) -> Result<impl Responder, CustomError> {
    let form = body.validate().map_err(CustomError::bad_request)?;
    let mail = contact_mail(&form, &data.config().mail);
    if let Err(e) = data.mailer().send(&mail).await {
        error!("failed to send contact email for {}, {}", form.hotel_name, e);
        return Err(CustomError::MailRelay);
    }
    info!("contact request from {} forwarded", form.hotel_name);
    Ok(web::Json(MessageBody {
        message: "Email sent successfully".to_string(),
    }))
}
