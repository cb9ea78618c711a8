use std::time::Duration;

use awc::{ws, BoxedSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::{
    select,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};
use tracing::{debug, error, info, warn};

use crate::{
    config::ClientConfig,
    message::{ClientMessage, ServerMessage},
    transport::{ConnectionToken, EventSink, OutboundMessage, SignalingTransport, TransportEvent},
    PeerId,
};

type Framed = actix_codec::Framed<BoxedSocket, ws::Codec>;

enum Outgoing {
    Text {
        attempt: u64,
        to: PeerId,
        payload: String,
    },
    Close,
}

struct Connection {
    token: ConnectionToken,
    tx: UnboundedSender<Outgoing>,
}

/// [`SignalingTransport`] over a WebSocket to the rendezvous server.
///
/// Each login runs as its own local task on the actix system, so `connect`
/// must be called from within one.
pub struct WsTransport {
    name: String,
    connect_timeout: Duration,
    events: EventSink,
    connection: Option<Connection>,
}

impl std::fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport")
            .field("name", &self.name)
            .field("connect_timeout", &self.connect_timeout)
            .field("token", &self.connection.as_ref().map(|c| c.token))
            .finish()
    }
}

impl WsTransport {
    pub fn new(config: &ClientConfig, events: EventSink) -> Self {
        Self {
            name: config.name.clone(),
            connect_timeout: config.connect_timeout,
            events,
            connection: None,
        }
    }

    fn current(&self, token: ConnectionToken) -> Option<&Connection> {
        self.connection.as_ref().filter(|c| c.token == token)
    }
}

impl SignalingTransport for WsTransport {
    fn connect(&mut self, token: ConnectionToken, address: &str, port: u16) {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(old) = self.connection.replace(Connection { token, tx }) {
            let _ = old.tx.send(Outgoing::Close);
        }
        let url = ClientConfig::sign_in_url(address, port);
        actix_rt::spawn(run_connection(
            url,
            self.name.clone(),
            self.connect_timeout,
            token,
            self.events.clone(),
            rx,
        ));
    }

    fn send_text(&mut self, token: ConnectionToken, message: &OutboundMessage) {
        let outgoing = Outgoing::Text {
            attempt: *message.attempt(),
            to: *message.target_peer_id(),
            payload: message.payload().clone(),
        };
        let queued = self
            .current(token)
            .map(|c| c.tx.send(outgoing).is_ok())
            .unwrap_or(false);
        if !queued {
            self.events.emit(
                token,
                TransportEvent::MessageSent {
                    attempt: *message.attempt(),
                    result: Err("not connected".to_string()),
                },
            );
        }
    }

    fn disconnect(&mut self, token: ConnectionToken) {
        let closing = match self.connection.take() {
            Some(c) if c.token == token => c.tx.send(Outgoing::Close).is_ok(),
            other => {
                self.connection = other;
                false
            }
        };
        if !closing {
            self.events.emit(token, TransportEvent::Disconnected);
        }
    }
}

#[tracing::instrument(skip(name, timeout, events, rx))]
async fn run_connection(
    url: String,
    name: String,
    timeout: Duration,
    token: ConnectionToken,
    events: EventSink,
    mut rx: UnboundedReceiver<Outgoing>,
) {
    let connect = tokio::time::timeout(
        timeout,
        awc::Client::new().ws(url.as_str()).basic_auth(&name, None).connect(),
    );

    let ws = select! {
        res = connect => match res {
            Ok(Ok((_res, ws))) => ws,
            Ok(Err(e)) => {
                warn!("Connecting to {url} failed: {e}");
                events.emit(token, TransportEvent::ConnectionFailure(e.to_string()));
                return;
            }
            Err(_) => {
                warn!("Connecting to {url} timed out");
                events.emit(
                    token,
                    TransportEvent::ConnectionFailure(format!("no answer within {timeout:?}")),
                );
                return;
            }
        },
        // cancelled while still connecting
        _ = rx.recv() => {
            events.emit(token, TransportEvent::Disconnected);
            return;
        }
    };

    info!("Connected to {url}");
    let event = match pump(ws, token, &events, rx).await {
        Ok(event) => event,
        Err(e) => {
            error!(?e);
            TransportEvent::ConnectionFailure(e.to_string())
        }
    };
    events.emit(token, event);
}

/// Shuttles frames until either side closes. Returns the final event to report.
async fn pump(
    mut ws: Framed,
    token: ConnectionToken,
    events: &EventSink,
    mut rx: UnboundedReceiver<Outgoing>,
) -> anyhow::Result<TransportEvent> {
    loop {
        select! {
            outgoing = rx.recv() => match outgoing {
                Some(Outgoing::Text { attempt, to, payload }) => {
                    let text = serde_json::to_string(&ClientMessage::Relay { to, payload })?;
                    let result = ws
                        .send(ws::Message::Text(text.into()))
                        .await
                        .map_err(|e| e.to_string());
                    events.emit(token, TransportEvent::MessageSent { attempt, result });
                }
                Some(Outgoing::Close) | None => {
                    debug!("Closing connection {token}");
                    ws.send(ws::Message::Close(None)).await?;
                    ws.close().await?;
                    return Ok(TransportEvent::Disconnected);
                }
            },
            frame = ws.next() => match frame {
                Some(Ok(ws::Frame::Text(msg))) => match serde_json::from_slice::<ServerMessage>(&msg) {
                    Ok(msg) => events.emit(token, msg.into()),
                    Err(e) => warn!("Unreadable message from server: {e}"),
                },
                Some(Ok(ws::Frame::Ping(msg))) => ws.send(ws::Message::Pong(msg)).await?,
                Some(Ok(ws::Frame::Close(reason))) => {
                    info!(?reason, "Server closed connection {token}");
                    return Ok(TransportEvent::Disconnected);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Err(anyhow::anyhow!("connection reset by server")),
            }
        }
    }
}
