use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web_actors::ws;
use peer_signaling::{message::ClientMessage, PeerId};
use tracing::{debug, error, info, warn};

pub use ws::start;

use super::moderator::{self, Moderator};

/// How often heartbeat pings are sent
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// How long before lack of client response causes a timeout
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// One signed-in peer's websocket.
#[derive(Debug)]
pub struct WsClient {
    name: String,
    id: Option<PeerId>,
    heartbeat: Instant,
    moderator: Addr<Moderator>,
}

impl WsClient {
    pub fn new(name: String, moderator: Addr<Moderator>) -> Self {
        Self {
            name,
            id: None,
            heartbeat: Instant::now(),
            moderator,
        }
    }

    /// Pings the client every HEARTBEAT_INTERVAL and drops it once it stays
    /// silent for longer than CLIENT_TIMEOUT.
    fn heartbeat(&self, ctx: &mut <Self as Actor>::Context) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.heartbeat) > CLIENT_TIMEOUT {
                error!("Websocket Client heartbeat failed, disconnecting!");
                ctx.stop();
                return;
            }

            ctx.ping(b"");
        });
    }

    fn relay(&self, text: &str) {
        let Some(from) = self.id else {
            debug!("Not signed in yet, dropping {text}");
            return;
        };
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(ClientMessage::Relay { to, payload }) => {
                self.moderator
                    .do_send(moderator::Relay { from, to, payload })
            }
            Err(e) => warn!("Unreadable message from {from}: {e}"),
        }
    }
}

impl Handler<moderator::Deliver> for WsClient {
    type Result = ();

    fn handle(&mut self, msg: moderator::Deliver, ctx: &mut Self::Context) -> Self::Result {
        debug!(?msg);
        match serde_json::to_string(&msg.0) {
            Ok(text) => ctx.text(text),
            Err(e) => error!(?e),
        }
    }
}

impl Actor for WsClient {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.heartbeat(ctx);

        let addr = ctx.address();
        info!("WsClient {} started, signing in", self.name);
        self.moderator
            .send(moderator::Connect {
                name: self.name.clone(),
                addr: addr.recipient(),
            })
            .into_actor(self)
            .then(|res, act, ctx| {
                match res {
                    Ok(id) => act.id = Some(id),
                    Err(e) => {
                        error!(?e);
                        ctx.stop();
                    }
                }
                fut::ready(())
            })
            .wait(ctx);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if let Some(id) = self.id.take() {
            self.moderator.do_send(moderator::Disconnect { id });
        }
        Running::Stop
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsClient {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.heartbeat = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.heartbeat = Instant::now();
                self.relay(&text);
            }
            Ok(ws::Message::Close(reason)) => {
                debug!(?reason, "{} closed", self.name);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Binary(_)) => warn!("Binary frames are not supported"),
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                warn!(?e);
                ctx.stop();
            }
        }
    }
}
