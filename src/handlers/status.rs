// src/handlers/status.rs
use actix_web::{ web, HttpResponse };
use log::debug;

use crate::proxy::StatusProxy;
use crate::upstream::StatusSource;

/// `GET /api/server-status`. Always 200; upstream trouble is encoded in the body.
pub async fn get_server_status<S: StatusSource + 'static>(
    proxy: web::Data<StatusProxy<S>>
) -> HttpResponse {
    let snapshot = proxy.snapshot().await;
    debug!(
        "Serving status: online={} players={}/{}",
        snapshot.online,
        snapshot.players.online,
        snapshot.players.max
    );

    HttpResponse::Ok().json(snapshot)
}
