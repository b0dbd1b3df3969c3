//! Session task and handle
//!
//! Every session runs as its own tokio task. The task owns the
//! [`PlaybackSession`], its decoder event channel and the backoff timer, so
//! timers cannot outlive the session that armed them. Owners talk to the
//! task through a [`SessionHandle`] and observe it through a `watch` channel
//! of [`SessionSnapshot`]s.

use std::pin::Pin;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use url::Url;

use super::backend::TaggedEvent;
use super::context::SessionContext;
use super::session::PlaybackSession;
use super::state::{SessionSnapshot, SurfaceOptions};
use crate::camera::{CameraDescriptor, CameraId};
use crate::error::{Error, Result};

#[derive(Debug)]
enum Command {
    Retry,
    SetEndpoint(Option<Url>),
    Configure(SurfaceOptions),
    Destroy,
}

/// Armed backoff timer, keyed by ticket id
type BackoffTimer = Option<(u64, Pin<Box<Sleep>>)>;

/// Owner's handle to a running session
///
/// Dropping the handle destroys the session; [`destroy`](Self::destroy)
/// additionally waits until teardown has completed.
pub struct SessionHandle {
    camera_id: CameraId,
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Create the session and spawn its task
    ///
    /// The initial load (or `NoStream`) happens before this returns.
    pub fn spawn(camera: &CameraDescriptor, options: SurfaceOptions, ctx: SessionContext) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let mut session = PlaybackSession::new(camera, options, ctx, events_tx);
        session.start();

        let (snapshots_tx, snapshots_rx) = watch::channel(session.snapshot());
        let task = tokio::spawn(run(session, commands_rx, events_rx, snapshots_tx));

        tracing::debug!(camera = %camera.id, "Session spawned");

        Self {
            camera_id: camera.id.clone(),
            commands: commands_tx,
            snapshots: snapshots_rx,
            task: Some(task),
        }
    }

    pub fn camera_id(&self) -> &CameraId {
        &self.camera_id
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified after every processed input
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a snapshot satisfies `predicate`
    pub async fn wait_for<F>(&self, predicate: F) -> Result<SessionSnapshot>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|_| Error::SessionClosed(self.camera_id.clone()))?;
        Ok(snapshot.clone())
    }

    /// Request a manual retry
    pub fn retry(&self) -> Result<()> {
        self.send(Command::Retry)
    }

    /// Replace the stream endpoint
    pub fn set_endpoint(&self, endpoint: Option<Url>) -> Result<()> {
        self.send(Command::SetEndpoint(endpoint))
    }

    /// Apply new surface options
    pub fn configure(&self, options: SurfaceOptions) -> Result<()> {
        self.send(Command::Configure(options))
    }

    /// Whether the session task has stopped
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Destroy the session and wait for teardown
    pub async fn destroy(mut self) {
        let _ = self.commands.send(Command::Destroy);

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(camera = %self.camera_id, error = %e, "Session task failed");
            }
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| Error::SessionClosed(self.camera_id.clone()))
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.commands.send(Command::Destroy);
        }
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("camera_id", &self.camera_id)
            .field("state", &self.snapshots.borrow().state)
            .finish()
    }
}

async fn run(
    mut session: PlaybackSession,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut events: mpsc::UnboundedReceiver<TaggedEvent>,
    snapshots: watch::Sender<SessionSnapshot>,
) {
    let mut timer: BackoffTimer = None;

    loop {
        sync_timer(&session, &mut timer);

        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(Command::Retry) => session.retry(),
                Some(Command::SetEndpoint(endpoint)) => session.set_endpoint(endpoint),
                Some(Command::Configure(options)) => session.configure(options),
                Some(Command::Destroy) | None => break,
            },
            ticket = backoff_elapsed(&mut timer) => {
                timer = None;
                session.on_backoff_elapsed(ticket);
            }
            Some((generation, event)) = events.recv() => {
                session.handle_event(generation, event);
            }
        }

        snapshots.send_replace(session.snapshot());
    }

    // Cancel the reconnection before the decoder goes away
    drop(timer);
    session.destroy();
    snapshots.send_replace(session.snapshot());
}

/// Arm, re-arm or cancel the timer to match the session's pending ticket
fn sync_timer(session: &PlaybackSession, timer: &mut BackoffTimer) {
    match session.pending_backoff() {
        Some(ticket) => {
            let armed = timer.as_ref().map(|(id, _)| *id);
            if armed != Some(ticket.id) {
                *timer = Some((ticket.id, Box::pin(tokio::time::sleep(ticket.delay))));
            }
        }
        None => *timer = None,
    }
}

/// Resolves with the ticket id once the armed timer fires; never without one
async fn backoff_elapsed(timer: &mut BackoffTimer) -> u64 {
    match timer {
        Some((id, sleep)) => {
            sleep.as_mut().await;
            *id
        }
        None => std::future::pending().await,
    }
}
