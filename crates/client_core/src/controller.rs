use shared::{domain::SessionId, protocol::StartSprint};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    decoder::decode,
    error::{DecodeError, SessionError},
    state::{reduce, Action, Effect, SessionState},
    transport::{SessionTransport, TransportEvent, TransportEvents, TransportFactory},
};

struct ActiveSession<T> {
    session_id: SessionId,
    transport: T,
    events: TransportEvents,
}

/// Owns the sprint state and the one live transport feeding it.
///
/// Observers read snapshots from [`SessionController::subscribe`]; nothing
/// outside this type writes the state.
pub struct SessionController<F: TransportFactory> {
    factory: F,
    state: SessionState,
    snapshots: watch::Sender<SessionState>,
    active: Option<ActiveSession<F::Transport>>,
}

impl<F: TransportFactory> SessionController<F> {
    pub fn new(factory: F) -> Self {
        let state = SessionState::default();
        let (snapshots, _) = watch::channel(state.clone());
        Self {
            factory,
            state,
            snapshots,
            active: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.snapshots.subscribe()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.active.as_ref().map(|active| &active.session_id)
    }

    pub fn has_live_transport(&self) -> bool {
        self.active.is_some()
    }

    pub fn set_goal(&mut self, goal: impl Into<String>) {
        self.dispatch(Action::SetGoal { goal: goal.into() });
    }

    /// Starts a sprint for the goal last set with [`Self::set_goal`].
    pub async fn start_sprint(&mut self) -> Result<SessionId, SessionError> {
        let goal = self.state.goal.clone();
        self.start(&goal).await
    }

    pub async fn start(&mut self, goal: &str) -> Result<SessionId, SessionError> {
        if goal.trim().is_empty() {
            debug!("sprint: ignoring start with empty goal");
            return Err(SessionError::EmptyGoal);
        }

        if let Some(previous) = self.active.take() {
            info!(session_id = %previous.session_id, "sprint: replacing running session");
            Self::teardown(previous);
        }

        self.dispatch(Action::Start {
            goal: goal.to_string(),
        });

        let session_id = SessionId::generate();
        let (mut transport, events) = self.factory.open();
        info!(%session_id, "sprint: opening session");

        let pending = PendingConnect {
            controller: &mut *self,
            armed: true,
        };
        let connected = transport.connect(&session_id).await;
        pending.disarm();

        if let Err(err) = connected {
            warn!(%session_id, error = %err, "sprint: connect failed");
            transport.disconnect();
            self.dispatch(Action::ConnectFailed {
                reason: err.to_string(),
            });
            return Err(SessionError::Connect(err));
        }

        self.dispatch(Action::Connected);
        let command = StartSprint {
            goal: goal.to_string(),
        };
        if let Err(err) = transport.send(&command) {
            // Reported, not terminal: whatever the socket does next decides the outcome.
            warn!(%session_id, error = %err, "sprint: start command not sent");
        }

        self.active = Some(ActiveSession {
            session_id: session_id.clone(),
            transport,
            events,
        });
        Ok(session_id)
    }

    /// Applies the next transport notification. Returns `false` once no
    /// transport is live.
    pub async fn pump(&mut self) -> bool {
        let next = match self.active.as_mut() {
            Some(active) => active.events.recv().await,
            None => return false,
        };

        match next {
            Some(TransportEvent::Message(raw)) => self.handle_frame(&raw),
            Some(TransportEvent::Error(message)) => {
                warn!(error = %message, "sprint: transport error");
                self.dispatch(Action::TransportFailed { message });
            }
            Some(TransportEvent::Closed) | None => {
                if let Some(active) = self.active.take() {
                    info!(session_id = %active.session_id, "sprint: session transport closed");
                    Self::teardown(active);
                }
                self.dispatch(Action::Closed);
            }
        }
        self.active.is_some()
    }

    /// Drives the session until its transport has closed.
    pub async fn run_until_settled(&mut self) -> &SessionState {
        while self.pump().await {}
        &self.state
    }

    /// Tears down the live session, e.g. when the observer goes away.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            info!(session_id = %active.session_id, "sprint: stopping session");
            Self::teardown(active);
        }
        self.dispatch(Action::Stopped);
    }

    fn handle_frame(&mut self, raw: &str) {
        match decode(raw) {
            Ok(event) => {
                debug!(kind = event.kind(), "sprint: frame received");
                self.dispatch(Action::Event(event));
            }
            Err(DecodeError::UnknownEventType(kind)) => {
                warn!(%kind, "sprint: dropping frame with unknown event type");
            }
            Err(err) => {
                warn!(error = %err, "sprint: dropping undecodable frame");
            }
        }
    }

    fn dispatch(&mut self, action: Action) {
        let effect = reduce(&mut self.state, action);
        self.snapshots.send_replace(self.state.clone());

        if let Some(Effect::CloseTransport) = effect {
            if let Some(active) = self.active.as_mut() {
                debug!(session_id = %active.session_id, "sprint: terminal frame, closing transport");
                active.transport.disconnect();
            }
        }
    }

    fn teardown(mut active: ActiveSession<F::Transport>) {
        active.transport.disconnect();
        active.events.close();
    }
}

/// Held across the connect await. If the `start` future is dropped there,
/// the session is recorded as cancelled instead of staying `running`.
struct PendingConnect<'a, F: TransportFactory> {
    controller: &'a mut SessionController<F>,
    armed: bool,
}

impl<F: TransportFactory> PendingConnect<'_, F> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<F: TransportFactory> Drop for PendingConnect<'_, F> {
    fn drop(&mut self) {
        if self.armed {
            info!("sprint: start abandoned while connecting");
            self.controller.dispatch(Action::Stopped);
        }
    }
}

impl<F: TransportFactory> Drop for SessionController<F> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            Self::teardown(active);
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
