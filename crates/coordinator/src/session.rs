use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use axum::extract::ws::{Message, WebSocket};
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use serde::Serialize;
use shared::{domain::SessionId, error::RejectionFrame, protocol::StartSprint};
use tracing::{debug, info, warn};

use crate::script::{sprint_script, Pacing, Step};

pub(crate) const GOAL_REQUIRED: &str = "Sprint goal is required";

/// Session ids with a sprint currently in flight.
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionRegistry {
    live: Arc<Mutex<HashSet<SessionId>>>,
}

impl SessionRegistry {
    /// `None` when the id is already running.
    pub(crate) fn claim(&self, session_id: &SessionId) -> Option<SessionClaim> {
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        if !live.insert(session_id.clone()) {
            return None;
        }
        Some(SessionClaim {
            registry: self.clone(),
            session_id: session_id.clone(),
        })
    }
}

pub(crate) struct SessionClaim {
    registry: SessionRegistry,
    session_id: SessionId,
}

impl Drop for SessionClaim {
    fn drop(&mut self) {
        self.registry
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session_id);
    }
}

type Outbound = SplitSink<WebSocket, Message>;

pub(crate) async fn run_session(
    socket: WebSocket,
    session_id: SessionId,
    registry: SessionRegistry,
    pacing: Pacing,
) {
    let (mut sender, mut receiver) = socket.split();

    let Some(_claim) = registry.claim(&session_id) else {
        warn!(%session_id, "sprint: duplicate session rejected");
        let rejection = RejectionFrame::new(format!("session {session_id} is already active"));
        reject(&mut sender, &rejection).await;
        return;
    };

    let goal = match receiver.next().await {
        Some(Ok(Message::Text(text))) => serde_json::from_str::<StartSprint>(&text)
            .ok()
            .map(|start| start.goal.trim().to_string())
            .filter(|goal| !goal.is_empty()),
        Some(Ok(Message::Close(_))) | None => {
            debug!(%session_id, "sprint: client left before sending a goal");
            return;
        }
        Some(Ok(_)) => None,
        Some(Err(err)) => {
            debug!(%session_id, error = %err, "sprint: socket failed before goal");
            return;
        }
    };

    let Some(goal) = goal else {
        warn!(%session_id, "sprint: start command without a goal");
        reject(&mut sender, &RejectionFrame::new(GOAL_REQUIRED)).await;
        return;
    };

    info!(%session_id, %goal, "sprint: started");

    let script = sprint_script(&goal, pacing);
    let finished = tokio::select! {
        finished = play(&mut sender, &script) => Some(finished),
        _ = client_gone(&mut receiver) => None,
    };

    match finished {
        Some(true) => {
            info!(%session_id, "sprint: complete");
            let _ = sender.send(Message::Close(None)).await;
        }
        Some(false) => debug!(%session_id, "sprint: client stopped reading"),
        None => info!(%session_id, "sprint: client disconnected mid-sprint"),
    }
}

/// Returns `false` if the socket refused a frame.
async fn play(sender: &mut Outbound, script: &[Step]) -> bool {
    for step in script {
        if let Step::Pause(delay) = step {
            if !delay.is_zero() {
                tokio::time::sleep(*delay).await;
            }
            continue;
        }
        let Some(frame) = step.to_frame() else {
            continue;
        };
        if !send_json(sender, &frame).await {
            return false;
        }
    }
    true
}

async fn client_gone(receiver: &mut SplitStream<WebSocket>) {
    while let Some(Ok(message)) = receiver.next().await {
        if matches!(message, Message::Close(_)) {
            return;
        }
    }
}

async fn reject(sender: &mut Outbound, rejection: &RejectionFrame) {
    if send_json(sender, rejection).await {
        let _ = sender.send(Message::Close(None)).await;
    }
}

async fn send_json<T: Serialize>(sender: &mut Outbound, value: &T) -> bool {
    let text = match serde_json::to_string(value) {
        Ok(v) => v,
        Err(err) => {
            warn!(error = %err, "sprint: frame serialization failed");
            return false;
        }
    };
    sender.send(Message::Text(text)).await.is_ok()
}
