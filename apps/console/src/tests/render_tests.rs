use super::*;
use client_core::state::Terminal;
use shared::domain::{Artifact, ArtifactKind, LogEntry};

fn log(id: &str, message: &str) -> LogEntry {
    LogEntry {
        id: id.into(),
        agent: "System".to_string(),
        message: message.to_string(),
        timestamp: "10:00:00".to_string(),
    }
}

fn running(goal: &str) -> SessionState {
    let mut state = SessionState::with_goal(goal);
    state.running = true;
    state.connected = true;
    state
}

#[test]
fn idle_state_renders_nothing() {
    let mut renderer = Renderer::default();
    assert!(renderer.render(&SessionState::default()).is_empty());
}

#[test]
fn only_new_entries_are_rendered() {
    let mut renderer = Renderer::default();
    let mut state = running("Build a todo app");
    state.logs.push(log("l1", "Sprint started"));

    let first = renderer.render(&state);
    assert_eq!(
        first,
        [
            "== sprint running: Build a todo app",
            "[10:00:00] System: Sprint started",
        ]
    );

    state.logs.push(log("l2", "next"));
    assert_eq!(renderer.render(&state), ["[10:00:00] System: next"]);
    assert!(renderer.render(&state).is_empty());
}

#[test]
fn agent_status_changes_are_reported_once() {
    let mut renderer = Renderer::default();
    let mut state = running("goal");
    renderer.render(&state);

    state.agents[0].status = AgentStatus::Active;
    state.agents[0].thought = Some("Analyzing requirements...".to_string());
    let lines = renderer.render(&state);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("Product Owner"));
    assert!(lines[0].contains("active (Analyzing requirements...)"));

    assert!(renderer.render(&state).is_empty());
}

#[test]
fn artifacts_and_outcome_are_rendered() {
    let mut renderer = Renderer::default();
    let mut state = running("goal");
    renderer.render(&state);

    state.artifacts.push(Artifact {
        id: "a1".into(),
        title: "Test Report".to_string(),
        kind: ArtifactKind::Test,
        preview: "100% PASS".to_string(),
        content: None,
        timestamp: String::new(),
    });
    state.running = false;
    state.terminal = Some(Terminal::Completed);

    assert_eq!(
        renderer.render(&state),
        [
            "== sprint complete: 1 artifacts, 0 log entries",
            "  + artifact Test Report (test) 100% PASS",
        ]
    );
}

#[test]
fn restart_resets_counters() {
    let mut renderer = Renderer::default();
    let mut state = running("goal");
    state.logs.push(log("l1", "one"));
    state.logs.push(log("l2", "two"));
    renderer.render(&state);

    let mut restarted = running("goal");
    restarted.logs.push(log("l3", "fresh"));
    assert_eq!(renderer.render(&restarted), ["[10:00:00] System: fresh"]);
}

#[test]
fn failure_shows_error() {
    let mut renderer = Renderer::default();
    let mut state = SessionState::with_goal("goal");
    state.terminal = Some(Terminal::ConnectionLost);
    state.error = Some("connection lost".to_string());
    assert_eq!(renderer.render(&state), ["== disconnected: connection lost"]);
}
