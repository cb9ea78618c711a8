use std::thread::{self, JoinHandle};

use actix_rt::System;
use tracing::{debug, info, warn};

use crate::{
    conductor::{Conductor, UiIntent, UiSurface},
    config::ClientConfig,
    error::Error,
    negotiation::GreetingNegotiator,
    runtime::{self, ConductorHandle, Runtime},
    ws::WsTransport,
    PeerId,
};

/// A complete client running on its own thread, driven from synchronous code.
///
/// The conductor and its websocket transport live on a
/// dedicated actix system. Every call blocks until the conductor has applied
/// the intent, results of the asynchronous work land on the [`UiSurface`].
pub struct BlockingClient {
    handle: ConductorHandle,
    thread: Option<JoinHandle<()>>,
}

impl BlockingClient {
    pub fn spawn<U>(config: ClientConfig, ui: U) -> anyhow::Result<Self>
    where
        U: UiSurface + Send + 'static,
    {
        let (sink, queue) = runtime::channel();
        let handle = queue.handle();
        let thread = thread::Builder::new()
            .name("conductor".to_string())
            .spawn(move || {
                let system = System::new();
                system.block_on(async move {
                    let transport = WsTransport::new(&config, sink);
                    let conductor = Conductor::new(transport, GreetingNegotiator);
                    let (runtime, _) = Runtime::new(queue, conductor, ui);
                    let conductor = runtime.run().await;
                    info!(state = ?conductor.ui_state(), "Client closed");
                });
            })?;

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> &ConductorHandle {
        &self.handle
    }

    pub fn login<S: AsRef<str>>(&self, address: S, port: u16) -> Result<(), Error> {
        self.handle.blocking_send(UiIntent::Login {
            address: address.as_ref().to_string(),
            port,
        })
    }

    pub fn logout(&self) -> Result<(), Error> {
        self.handle.blocking_send(UiIntent::Logout)
    }

    pub fn connect_to_peer(&self, id: PeerId) -> Result<(), Error> {
        self.handle.blocking_send(UiIntent::ConnectToPeer(id))
    }

    pub fn disconnect_current_peer(&self) -> Result<(), Error> {
        self.handle.blocking_send(UiIntent::DisconnectCurrentPeer)
    }

    /// Tears the client down and waits for its thread to finish.
    pub fn close(mut self) -> anyhow::Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> anyhow::Result<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        match self.handle.blocking_send(UiIntent::Close) {
            Ok(()) | Err(Error::Closed) => {}
            Err(e) => return Err(e.into()),
        }
        thread
            .join()
            .map_err(|_| anyhow::anyhow!("conductor thread panicked"))
    }
}

impl Drop for BlockingClient {
    fn drop(&mut self) {
        if self.thread.is_none() {
            return;
        }
        // blocking_send panics inside a runtime; let the thread finish detached
        if tokio::runtime::Handle::try_current().is_ok() {
            debug!("Dropped inside a runtime, closing without waiting");
            if let Err(e) = self.handle.post(UiIntent::Close) {
                debug!("Client already closed: {e}");
            }
            return;
        }
        if let Err(e) = self.shutdown() {
            warn!("Closing client failed: {e}");
        }
    }
}
