use actix::*;
use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use tracing::info;

use super::{
    client,
    moderator::{ListPeers, Moderator},
};
use crate::authentication::basic_authentication;

#[get("/health_check")]
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().finish()
}

/// Upgrades to the signaling websocket. The display name comes from Basic auth.
#[get("/sign_in")]
async fn sign_in(
    req: HttpRequest,
    stream: web::Payload,
    moderator: web::Data<Addr<Moderator>>,
) -> Result<HttpResponse, Error> {
    let name = basic_authentication(req.headers())?;
    info!("{name} wants to sign in");
    let websocket = client::WsClient::new(name, moderator.get_ref().clone());
    client::start(websocket, &req, stream)
}

/// Current roster as JSON.
#[get("/peers")]
async fn peers(moderator: web::Data<Addr<Moderator>>) -> Result<HttpResponse, Error> {
    let peers = moderator
        .send(ListPeers)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(peers))
}
