//! Canonical sprint view model and the reducer that is its only writer.
//!
//! Every change to [`SessionState`] goes through [`reduce`]: decoded frames
//! arrive as [`Action::Event`], transport lifecycle and UI commands as the
//! other [`Action`] variants. The reducer never performs I/O; when a frame
//! ends the session it returns [`Effect::CloseTransport`] and leaves the
//! teardown to the controller.

use shared::domain::{initial_roster, Agent, Artifact, LogEntry};
use tracing::debug;

use crate::decoder::SessionEvent;

pub const CONNECTION_LOST_MESSAGE: &str =
    "connection lost before the sprint reported an outcome";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Connect,
    Protocol,
    Transport,
}

/// Why a session stopped running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Completed,
    Failed(FailureKind),
    ConnectionLost,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Running,
    Complete,
    Failed,
    Disconnected,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub goal: String,
    pub running: bool,
    pub connected: bool,
    pub error: Option<String>,
    pub terminal: Option<Terminal>,
    pub agents: Vec<Agent>,
    pub artifacts: Vec<Artifact>,
    pub logs: Vec<LogEntry>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::with_goal(String::new())
    }
}

impl SessionState {
    pub fn with_goal(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            running: false,
            connected: false,
            error: None,
            terminal: None,
            agents: initial_roster(),
            artifacts: Vec::new(),
            logs: Vec::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.running {
            return SessionPhase::Running;
        }
        match self.terminal {
            None => SessionPhase::Idle,
            Some(Terminal::Completed) => SessionPhase::Complete,
            Some(Terminal::Failed(_)) => SessionPhase::Failed,
            Some(Terminal::ConnectionLost) => SessionPhase::Disconnected,
            Some(Terminal::Cancelled) => SessionPhase::Cancelled,
        }
    }

    pub fn agent(&self, id: &str) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id == id)
    }

    /// Records the first terminal condition only; later ones never overwrite it.
    fn finish(&mut self, terminal: Terminal, error: Option<String>) {
        self.running = false;
        if self.terminal.is_none() {
            self.terminal = Some(terminal);
        }
        if self.error.is_none() {
            self.error = error;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetGoal { goal: String },
    Start { goal: String },
    Connected,
    ConnectFailed { reason: String },
    Event(SessionEvent),
    TransportFailed { message: String },
    Closed,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    CloseTransport,
}

pub fn reduce(state: &mut SessionState, action: Action) -> Option<Effect> {
    match action {
        Action::SetGoal { goal } => {
            state.goal = goal;
            None
        }
        Action::Start { goal } => {
            *state = SessionState::with_goal(goal);
            state.running = true;
            None
        }
        Action::Connected => {
            state.connected = true;
            None
        }
        Action::ConnectFailed { reason } => {
            state.connected = false;
            state.finish(
                Terminal::Failed(FailureKind::Connect),
                Some(format!("failed to connect to coordinator: {reason}")),
            );
            None
        }
        Action::Event(event) => apply(state, event),
        Action::TransportFailed { message } => {
            if state.terminal.is_none() {
                state.finish(Terminal::Failed(FailureKind::Transport), Some(message));
            }
            None
        }
        Action::Closed => {
            state.connected = false;
            if state.running {
                state.finish(
                    Terminal::ConnectionLost,
                    Some(CONNECTION_LOST_MESSAGE.to_string()),
                );
            }
            None
        }
        Action::Stopped => {
            state.connected = false;
            if state.running {
                state.finish(Terminal::Cancelled, None);
            }
            None
        }
    }
}

/// Folds one decoded frame into the state.
pub fn apply(state: &mut SessionState, event: SessionEvent) -> Option<Effect> {
    match event {
        SessionEvent::AgentUpdate(update) => {
            match state
                .agents
                .iter_mut()
                .find(|agent| agent.id == update.agent_id)
            {
                Some(agent) => {
                    agent.status = update.status;
                    agent.thought = update.thought;
                }
                None => {
                    debug!(agent_id = %update.agent_id, "sprint: update for unknown agent ignored");
                }
            }
            None
        }
        SessionEvent::Artifact(artifact) => {
            state.artifacts.push(artifact);
            None
        }
        SessionEvent::Log(entry) => {
            state.logs.push(entry);
            None
        }
        SessionEvent::Complete => {
            state.finish(Terminal::Completed, None);
            Some(Effect::CloseTransport)
        }
        SessionEvent::Error { message } => {
            state.finish(Terminal::Failed(FailureKind::Protocol), Some(message));
            Some(Effect::CloseTransport)
        }
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
