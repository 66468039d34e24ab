use super::*;
use shared::{
    domain::{AgentStatus, ArtifactKind},
    protocol::AgentUpdatePayload,
};

fn running(goal: &str) -> SessionState {
    let mut state = SessionState::default();
    reduce(
        &mut state,
        Action::Start {
            goal: goal.to_string(),
        },
    );
    reduce(&mut state, Action::Connected);
    state
}

fn agent_update(agent_id: &str, status: AgentStatus, thought: Option<&str>) -> SessionEvent {
    SessionEvent::AgentUpdate(AgentUpdatePayload {
        agent_id: agent_id.to_string(),
        name: String::new(),
        status,
        thought: thought.map(str::to_string),
    })
}

fn artifact(id: &str, title: &str) -> SessionEvent {
    SessionEvent::Artifact(Artifact {
        id: id.into(),
        title: title.to_string(),
        kind: ArtifactKind::Design,
        preview: "preview".to_string(),
        content: Some("content".to_string()),
        timestamp: "10:00:00".to_string(),
    })
}

fn log(id: &str, message: &str, timestamp: &str) -> SessionEvent {
    SessionEvent::Log(LogEntry {
        id: id.into(),
        agent: "System".to_string(),
        message: message.to_string(),
        timestamp: timestamp.to_string(),
    })
}

fn roster_ids(state: &SessionState) -> Vec<String> {
    state.agents.iter().map(|agent| agent.id.clone()).collect()
}

#[test]
fn default_state_is_idle_with_full_roster() {
    let state = SessionState::default();
    assert_eq!(state.phase(), SessionPhase::Idle);
    assert!(!state.running && !state.connected);
    assert_eq!(roster_ids(&state), ["po", "arch", "dev", "qa"]);
    assert!(state.artifacts.is_empty() && state.logs.is_empty());
}

#[test]
fn agent_update_replaces_status_and_clears_missing_thought() {
    let mut state = running("goal");
    apply(
        &mut state,
        agent_update("arch", AgentStatus::Active, Some("Designing system...")),
    );
    let arch = state.agent("arch").expect("arch");
    assert_eq!(arch.status, AgentStatus::Active);
    assert_eq!(arch.thought.as_deref(), Some("Designing system..."));
    assert_eq!(arch.name, "Architect");

    apply(&mut state, agent_update("arch", AgentStatus::Done, None));
    let arch = state.agent("arch").expect("arch");
    assert_eq!(arch.status, AgentStatus::Done);
    assert_eq!(arch.thought, None);
}

#[test]
fn status_transitions_are_mirrored_not_validated() {
    let mut state = running("goal");
    apply(&mut state, agent_update("qa", AgentStatus::Done, None));
    apply(&mut state, agent_update("qa", AgentStatus::Idle, None));
    apply(&mut state, agent_update("qa", AgentStatus::Thinking, None));
    assert_eq!(
        state.agent("qa").expect("qa").status,
        AgentStatus::Thinking
    );
}

#[test]
fn roster_never_grows_or_shrinks() {
    let mut state = running("goal");
    let before = roster_ids(&state);
    for (id, status) in [
        ("po", AgentStatus::Active),
        ("intruder", AgentStatus::Active),
        ("", AgentStatus::Done),
        ("PO", AgentStatus::Thinking),
        ("dev", AgentStatus::Done),
    ] {
        let effect = apply(&mut state, agent_update(id, status, None));
        assert_eq!(effect, None);
    }
    assert_eq!(roster_ids(&state), before);
    assert_eq!(state.agent("po").expect("po").status, AgentStatus::Active);
}

#[test]
fn artifacts_and_logs_only_grow_and_keep_duplicates() {
    let mut state = running("goal");
    let events = [
        artifact("a1", "User Stories"),
        log("l1", "first", "10:00:00"),
        artifact("a1", "User Stories"),
        agent_update("po", AgentStatus::Done, None),
        log("l1", "first", "10:00:00"),
    ];

    let mut lengths = (0, 0);
    for event in events {
        apply(&mut state, event);
        let next = (state.artifacts.len(), state.logs.len());
        assert!(next.0 >= lengths.0 && next.1 >= lengths.1);
        lengths = next;
    }
    assert_eq!(lengths, (2, 2));

    reduce(
        &mut state,
        Action::Start {
            goal: "next".to_string(),
        },
    );
    assert!(state.artifacts.is_empty() && state.logs.is_empty());
}

#[test]
fn logs_keep_arrival_order_regardless_of_timestamps() {
    let mut state = running("goal");
    apply(&mut state, log("l1", "third by clock", "10:00:03"));
    apply(&mut state, log("l2", "first by clock", "10:00:01"));
    apply(&mut state, log("l3", "second by clock", "10:00:02"));

    let messages: Vec<&str> = state.logs.iter().map(|l| l.message.as_str()).collect();
    assert_eq!(
        messages,
        ["third by clock", "first by clock", "second by clock"]
    );
}

#[test]
fn complete_stops_running_and_requests_teardown() {
    let mut state = running("goal");
    let effect = apply(&mut state, SessionEvent::Complete);
    assert_eq!(effect, Some(Effect::CloseTransport));
    assert!(!state.running);
    assert!(state.connected);
    assert_eq!(state.error, None);
    assert_eq!(state.phase(), SessionPhase::Complete);
}

#[test]
fn late_frames_apply_but_never_restart_the_session() {
    let mut state = running("goal");
    apply(&mut state, SessionEvent::Complete);

    apply(&mut state, artifact("late", "Late Artifact"));
    apply(&mut state, log("late", "late log", "10:09:00"));
    apply(&mut state, agent_update("qa", AgentStatus::Active, None));
    reduce(&mut state, Action::Connected);

    assert!(!state.running);
    assert_eq!(state.artifacts.len(), 1);
    assert_eq!(state.logs.len(), 1);
    assert_eq!(state.agent("qa").expect("qa").status, AgentStatus::Active);
    assert_eq!(state.phase(), SessionPhase::Complete);
}

#[test]
fn protocol_error_is_terminal_and_keeps_history() {
    let mut state = running("goal");
    apply(&mut state, artifact("a1", "User Stories"));
    apply(&mut state, log("l1", "working", "10:00:00"));

    let effect = apply(
        &mut state,
        SessionEvent::Error {
            message: "sprint failed".to_string(),
        },
    );
    assert_eq!(effect, Some(Effect::CloseTransport));
    assert_eq!(state.error.as_deref(), Some("sprint failed"));
    assert!(!state.running);
    assert_eq!(state.terminal, Some(Terminal::Failed(FailureKind::Protocol)));
    assert_eq!(state.artifacts.len(), 1);
    assert_eq!(state.logs.len(), 1);
}

#[test]
fn first_error_wins() {
    let mut state = running("goal");
    apply(
        &mut state,
        SessionEvent::Error {
            message: "first".to_string(),
        },
    );
    apply(
        &mut state,
        SessionEvent::Error {
            message: "second".to_string(),
        },
    );
    reduce(
        &mut state,
        Action::TransportFailed {
            message: "socket reset".to_string(),
        },
    );
    assert_eq!(state.error.as_deref(), Some("first"));
}

#[test]
fn close_without_terminal_frame_is_connection_lost() {
    let mut state = running("goal");
    reduce(&mut state, Action::Closed);
    assert!(!state.running);
    assert!(!state.connected);
    assert_eq!(state.error.as_deref(), Some(CONNECTION_LOST_MESSAGE));
    assert_eq!(state.phase(), SessionPhase::Disconnected);
}

#[test]
fn close_after_complete_only_drops_connected_flag() {
    let mut state = running("goal");
    apply(&mut state, SessionEvent::Complete);
    reduce(&mut state, Action::Closed);
    assert!(!state.connected);
    assert_eq!(state.error, None);
    assert_eq!(state.phase(), SessionPhase::Complete);
}

#[test]
fn transport_error_fails_a_running_session() {
    let mut state = running("goal");
    reduce(
        &mut state,
        Action::TransportFailed {
            message: "websocket receive failed: reset".to_string(),
        },
    );
    assert!(!state.running);
    assert_eq!(
        state.terminal,
        Some(Terminal::Failed(FailureKind::Transport))
    );

    reduce(&mut state, Action::Closed);
    assert_eq!(
        state.error.as_deref(),
        Some("websocket receive failed: reset")
    );
}

#[test]
fn connect_failure_sets_diagnostic() {
    let mut state = SessionState::default();
    reduce(
        &mut state,
        Action::Start {
            goal: "goal".to_string(),
        },
    );
    assert!(state.running && !state.connected);

    reduce(
        &mut state,
        Action::ConnectFailed {
            reason: "connection refused".to_string(),
        },
    );
    assert!(!state.running);
    assert_eq!(state.terminal, Some(Terminal::Failed(FailureKind::Connect)));
    assert!(state
        .error
        .as_deref()
        .is_some_and(|error| error.contains("connection refused")));
}

#[test]
fn stop_cancels_without_error() {
    let mut state = running("goal");
    reduce(&mut state, Action::Stopped);
    assert!(!state.running);
    assert_eq!(state.error, None);
    assert_eq!(state.phase(), SessionPhase::Cancelled);
}

#[test]
fn set_goal_does_not_reset_progress() {
    let mut state = running("goal");
    apply(&mut state, log("l1", "working", "10:00:00"));
    reduce(
        &mut state,
        Action::SetGoal {
            goal: "edited".to_string(),
        },
    );
    assert_eq!(state.goal, "edited");
    assert!(state.running);
    assert_eq!(state.logs.len(), 1);
}
