use std::time::Duration;

use tokio::sync::{
    mpsc::{self, UnboundedReceiver, UnboundedSender},
    oneshot,
};
use tracing::{debug, info, warn};

use crate::{
    conductor::{Conductor, UiIntent, UiSurface},
    error::Error,
    negotiation::Negotiator,
    session::SessionState,
    transport::{EventSink, Inbound, SignalingTransport},
    PeerId,
};

/// How long a closing runtime waits for the server connection to wind down.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Unit of work for the conductor. User intents and transport events share one
/// queue so they are applied strictly in arrival order.
#[derive(Debug)]
pub(crate) enum Task {
    Intent {
        intent: UiIntent,
        reply: oneshot::Sender<Result<(), Error>>,
    },
    Transport(Inbound),
}

/// Receiving end of the conductor queue, waiting to be handed to a [`Runtime`].
#[derive(Debug)]
pub struct TaskQueue {
    tx: UnboundedSender<Task>,
    rx: UnboundedReceiver<Task>,
}

/// Creates the conductor queue. The sink goes to the transport, the queue to
/// [`Runtime::new`].
pub fn channel() -> (EventSink, TaskQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink::new(tx.clone()), TaskQueue { tx, rx })
}

impl TaskQueue {
    pub fn handle(&self) -> ConductorHandle {
        ConductorHandle {
            tx: self.tx.clone(),
        }
    }
}

/// Owns the conductor and applies queued work to it, one task at a time.
pub struct Runtime<T, N, U> {
    conductor: Conductor<T, N>,
    ui: U,
    rx: UnboundedReceiver<Task>,
}

impl<T, N, U> std::fmt::Debug for Runtime<T, N, U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("conductor", &self.conductor)
            .finish()
    }
}

impl<T, N, U> Runtime<T, N, U>
where
    T: SignalingTransport,
    N: Negotiator,
    U: UiSurface,
{
    /// The UI starts at the connect prompt; it is rendered once `run` starts.
    pub fn new(queue: TaskQueue, conductor: Conductor<T, N>, ui: U) -> (Self, ConductorHandle) {
        let handle = queue.handle();
        let runtime = Self {
            conductor,
            ui,
            rx: queue.rx,
        };
        (runtime, handle)
    }

    /// Drains the queue until a `Close` intent has been applied and the
    /// session has signed out. Returns the conductor in its final state.
    pub async fn run(mut self) -> Conductor<T, N> {
        info!("Conductor running");
        self.ui.show_connect_prompt();
        while let Some(task) = self.rx.recv().await {
            match task {
                Task::Intent { intent, reply } => {
                    let closing = intent == UiIntent::Close;
                    self.apply_intent(intent, reply);
                    if closing {
                        self.wind_down().await;
                        break;
                    }
                }
                Task::Transport(inbound) => self.apply_transport(inbound),
            }
        }
        info!("Conductor stopped");
        self.conductor
    }

    fn apply_intent(&mut self, intent: UiIntent, reply: oneshot::Sender<Result<(), Error>>) {
        let result = self.conductor.handle_intent(intent).map(|commands| {
            for command in &commands {
                command.render(&mut self.ui);
            }
        });
        if let Err(e) = &result {
            warn!("Rejected intent: {e}");
        }
        if reply.send(result).is_err() {
            debug!("Intent caller went away before the reply");
        }
    }

    fn apply_transport(&mut self, inbound: Inbound) {
        for command in self.conductor.handle_transport(inbound) {
            command.render(&mut self.ui);
        }
    }

    /// Keeps applying transport events until the sign out went through, so the
    /// last messages to the remote and the close reach the server. Intents
    /// arriving meanwhile are refused.
    async fn wind_down(&mut self) {
        let drain = async {
            while self.conductor.session().state() != SessionState::Idle {
                match self.rx.recv().await {
                    Some(Task::Transport(inbound)) => self.apply_transport(inbound),
                    Some(Task::Intent { reply, .. }) => {
                        let _ = reply.send(Err(Error::Closed));
                    }
                    None => break,
                }
            }
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, drain).await.is_err() {
            warn!(
                state = ?self.conductor.session().state(),
                "Server connection did not close within {SHUTDOWN_TIMEOUT:?}"
            );
        }
    }
}

/// Cheap, cloneable entry point for user intents.
///
/// Every call is queued behind whatever is already pending and answered once the
/// conductor has applied it. Rejections come back as errors; outcomes of the
/// asynchronous work show up on the [`UiSurface`].
#[derive(Debug, Clone)]
pub struct ConductorHandle {
    tx: UnboundedSender<Task>,
}

impl ConductorHandle {
    /// Queues `intent` without waiting for the conductor to apply it.
    pub fn post(&self, intent: UiIntent) -> Result<(), Error> {
        self.enqueue(intent).map(drop)
    }

    fn enqueue(&self, intent: UiIntent) -> Result<oneshot::Receiver<Result<(), Error>>, Error> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Task::Intent { intent, reply })
            .map_err(|_| Error::Closed)?;
        Ok(rx)
    }

    pub async fn send(&self, intent: UiIntent) -> Result<(), Error> {
        self.enqueue(intent)?.await.map_err(|_| Error::Closed)?
    }

    /// Like [`send`](Self::send) for callers outside any async runtime.
    /// Panics when called from within one.
    pub fn blocking_send(&self, intent: UiIntent) -> Result<(), Error> {
        self.enqueue(intent)?
            .blocking_recv()
            .map_err(|_| Error::Closed)?
    }

    pub async fn login<S: AsRef<str>>(&self, address: S, port: u16) -> Result<(), Error> {
        self.send(UiIntent::Login {
            address: address.as_ref().to_string(),
            port,
        })
        .await
    }

    pub async fn logout(&self) -> Result<(), Error> {
        self.send(UiIntent::Logout).await
    }

    pub async fn connect_to_peer(&self, id: PeerId) -> Result<(), Error> {
        self.send(UiIntent::ConnectToPeer(id)).await
    }

    pub async fn disconnect_current_peer(&self) -> Result<(), Error> {
        self.send(UiIntent::DisconnectCurrentPeer).await
    }

    pub async fn close(&self) -> Result<(), Error> {
        self.send(UiIntent::Close).await
    }
}
