//! Websocket feed of guest tickets for staff dashboards.

use crate::server::controller::auth::bearer_token;
use crate::server::controller::error::CustomError;
use crate::server::model::staff::AuthUser;
use crate::server::model::ticket::{ClientFrame, NotificationsQuery, ServerFrame, TicketNotification, MANAGERS_ROOM};
use crate::server::notify::NotificationHub;
use crate::server::state::AppState;
use actix_web::{get, web, HttpRequest, HttpResponse};
use actix_ws::{CloseReason, Message, MessageStream, Session};
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;

#[get("/ws/notifications")]
pub(crate) async fn notifications(
    req: HttpRequest,
    body: web::Payload,
    query: web::Query<NotificationsQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let token = query
        .into_inner()
        .token
        .filter(|t| !t.is_empty())
        .or_else(|| bearer_token(&req))
        .ok_or(CustomError::Unauthorized)?;
    let user = data.auth().verify(&token).await.map_err(CustomError::from)?;
    let (response, session, stream) = actix_ws::handle(&req, body)?;
    info!("staff={} opened the notification channel", user.id);
    actix_web::rt::spawn(serve(session, stream, data.hub(), user));
    Ok(response)
}

/// Next ticket of the joined group; never resolves before the dashboard joins.
async fn next_ticket(tickets: &mut Option<Receiver<TicketNotification>>) -> Option<TicketNotification> {
    let Some(rx) = tickets else {
        return std::future::pending().await;
    };
    loop {
        match rx.recv().await {
            Ok(notification) => return Some(notification),
            Err(RecvError::Lagged(skipped)) => warn!("dashboard lagged behind, skipped {} tickets", skipped),
            Err(RecvError::Closed) => return None,
        }
    }
}

async fn serve(mut session: Session, mut stream: MessageStream, hub: Arc<NotificationHub>, user: AuthUser) {
    let mut tickets: Option<Receiver<TicketNotification>> = None;
    let reason: Option<CloseReason> = loop {
        tokio::select! {
            msg = stream.recv() => match msg {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientFrame>(&text) {
                    Ok(ClientFrame::JoinManagersRoom) => {
                        if tickets.is_none() {
                            tickets = Some(hub.subscribe(user.hotel_id));
                            info!("staff={} joined {} of hotel={}", user.id, MANAGERS_ROOM, user.hotel_id);
                        }
                    }
                    Err(e) => debug!("ignoring frame from staff={}, {}", user.id, e),
                },
                Some(Ok(Message::Ping(bytes))) => {
                    if session.pong(&bytes).await.is_err() {
                        break None;
                    }
                }
                Some(Ok(Message::Close(reason))) => break reason,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("notification channel of staff={} failed, {}", user.id, e);
                    break None;
                }
                None => break None,
            },
            notification = next_ticket(&mut tickets) => {
                let Some(notification) = notification else {
                    break None;
                };
                match serde_json::to_string(&ServerFrame::NewTicket(notification)) {
                    Ok(json) => {
                        if session.text(json).await.is_err() {
                            break None;
                        }
                    }
                    Err(e) => error!("failed to encode ticket frame, {}", e),
                }
            }
        }
    };
    let _ = session.close(reason).await;
    drop(tickets);
    hub.cleanup_empty_groups();
    info!("staff={} left the notification channel", user.id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::controller::tests::fixture;
    use crate::server::model::ticket::{GuestInfo, TicketSummary};
    use crate::server::routes;
    use actix_web::{test, App};

    #[tokio::test]
    async fn next_ticket_waits_for_join_and_skips_lag() {
        let hub = NotificationHub::new();
        let mut tickets = None;
        let idle = tokio::time::timeout(std::time::Duration::from_millis(20), next_ticket(&mut tickets)).await;
        assert!(idle.is_err());

        tickets = Some(hub.subscribe(7));
        let notification = TicketNotification {
            ticket: TicketSummary {
                guest_info: GuestInfo {
                    name: "Ada".to_string(),
                },
                room_number: "204".to_string(),
            },
            message: "More pillows".to_string(),
        };
        hub.publish(7, notification.clone());
        assert_eq!(next_ticket(&mut tickets).await, Some(notification));
    }

    #[actix_web::test]
    async fn upgrade_requires_a_valid_token() {
        let fx = fixture().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(fx.state.clone()))
                .configure(routes::configure),
        )
        .await;

        let handshake = || {
            test::TestRequest::get()
                .insert_header(("Upgrade", "websocket"))
                .insert_header(("Connection", "Upgrade"))
                .insert_header(("Sec-WebSocket-Version", "13"))
                .insert_header(("Sec-WebSocket-Key", "dGhlIHNhbXBsZSBub25jZQ=="))
        };

        let req = handshake().uri("/ws/notifications").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);

        let req = handshake().uri("/ws/notifications?token=forged").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);

        let req = handshake()
            .uri(&format!("/ws/notifications?token={}", fx.token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 101);
    }
}
