//! main file for the server

pub mod auth;
mod controller;
pub mod database;
pub mod ledger;
pub mod mailer;
pub mod model;
pub mod notify;
mod routes;
mod scheduler;
pub mod state;
pub mod tenant;
pub(crate) mod util;

use crate::server::controller::DB_TIMEOUT_SECONDS;
use crate::server::database::pool::connect_util;
use crate::server::database::postgres::PgStore;
use crate::server::mailer::HttpMailRelay;
use crate::server::model::config::ServerConfig;
use crate::server::scheduler::job::session_sweeper;
use crate::server::state::AppState;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// Run the server
pub async fn run(config: ServerConfig) -> io::Result<()> {
    let (read_pool, write_pool) = tokio::try_join!(
        connect_util::open("read", &config.db_read_conn_str, config.pool_size),
        connect_util::open("write", &config.db_write_conn_str, config.pool_size),
    )
    .map_err(|e| {
        error!("failed to open database pools, {:#}", e);
        io::Error::other(e)
    })?;
    let store = Arc::new(PgStore::new(
        read_pool,
        write_pool,
        Duration::from_secs(DB_TIMEOUT_SECONDS),
    ));
    let mailer = Arc::new(HttpMailRelay::new(&config.mail));
    let addr = config.addr;
    let state = AppState::new(config, store, mailer);

    let data = web::Data::new(state);
    let app_data = data.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(app_data.clone())
            .configure(routes::configure)
    })
    .bind(addr)?
    .run();

    let cancel_token = CancellationToken::new();
    let sweeper = tokio::spawn(session_sweeper(
        data.auth_handle(),
        data.hub(),
        SWEEP_PERIOD,
        cancel_token.clone(),
    ));

    info!("listening on {}", addr);
    let result = server.await;

    cancel_token.cancel();
    if let Err(e) = sweeper.await {
        error!("session sweeper panicked, {}", e);
    }
    result
}
