use actix::*;
use actix_web::{dev::Server, web, App, HttpServer};
use std::net::TcpListener;
use tracing::info;

use crate::settings::Settings;

use self::moderator::Moderator;

mod client;
mod moderator;
mod services;
use services::{health_check, peers, sign_in};

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();
        info!("Running on port: {port}");

        let server = create_server(listener)?;
        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn create_server(listener: TcpListener) -> Result<Server, anyhow::Error> {
    let moderator = web::Data::new(Moderator::default().start());
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(moderator.clone())
            .service(health_check)
            .service(sign_in)
            .service(peers)
    })
    .listen(listener)?
    .run())
}
