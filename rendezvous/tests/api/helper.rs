use std::time::Duration;

use futures_util::StreamExt as _;
use once_cell::sync::Lazy;
use peer_signaling::{
    message::ServerMessage,
    runtime, ClientConfigBuilder, Conductor, ConductorHandle, GreetingNegotiator, Runtime,
    UiCommand, WsTransport,
};
use rendezvous::{
    application,
    settings::{ApplicationSettings, Settings},
};
use tokio::sync::mpsc::{self, UnboundedReceiver};

static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "debug")
    }
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
});

pub fn enable_tracing() {
    Lazy::force(&TRACING);
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    pub async fn spawn() -> Self {
        enable_tracing();
        let settings = Settings {
            application: ApplicationSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
        };
        let app = application::Application::build(settings)
            .await
            .expect("Failed to build application");
        let port = app.port();
        let _ = tokio::spawn(app.run_until_stopped());
        Self {
            address: "127.0.0.1".to_string(),
            port,
        }
    }

    pub fn base_address(&self) -> String {
        format!("http://{}:{}", &self.address, self.port)
    }

    pub fn path(&self, path: &str) -> String {
        format!("{}/{}", &self.base_address(), path)
    }

    pub fn ws_path(&self, path: &str) -> String {
        format!("ws://{}:{}/{}", &self.address, self.port, path)
    }

    /// Starts a conductor with a websocket transport on the current actix system.
    pub fn client(&self, name: &str) -> TestClient {
        let config = ClientConfigBuilder::new()
            .address(&self.address)
            .port(self.port)
            .name(name)
            .connect_timeout(Duration::from_secs(2))
            .build();
        let (sink, queue) = runtime::channel();
        let transport = WsTransport::new(&config, sink);
        let (ui_tx, ui) = mpsc::unbounded_channel();
        let (runtime, handle) =
            Runtime::new(queue, Conductor::new(transport, GreetingNegotiator), ui_tx);
        actix_rt::spawn(runtime.run());
        TestClient { handle, ui }
    }
}

pub struct TestClient {
    pub handle: ConductorHandle,
    pub ui: UnboundedReceiver<UiCommand>,
}

impl TestClient {
    /// Skips rendered commands until one matches, failing after a few seconds.
    pub async fn until<F>(&mut self, mut pred: F) -> UiCommand
    where
        F: FnMut(&UiCommand) -> bool,
    {
        let wait = async {
            while let Some(command) = self.ui.recv().await {
                if pred(&command) {
                    return command;
                }
            }
            panic!("UI channel closed");
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .expect("Timed out waiting for UI command")
    }
}

pub type RawSocket = actix_codec::Framed<awc::BoxedSocket, awc::ws::Codec>;

/// Signs in with a bare websocket, bypassing the conductor.
pub async fn raw_sign_in(app: &TestApp, name: &str) -> RawSocket {
    let (_res, ws) = awc::Client::new()
        .ws(app.ws_path("sign_in").as_str())
        .basic_auth(name, None)
        .connect()
        .await
        .expect("Failed to sign in");
    ws
}

/// Next server message on a bare websocket, skipping control frames.
pub async fn next_message(ws: &mut RawSocket) -> ServerMessage {
    loop {
        match ws.next().await {
            Some(Ok(awc::ws::Frame::Text(text))) => return serde_json::from_slice(&text).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("Unexpected frame {other:?}"),
        }
    }
}
