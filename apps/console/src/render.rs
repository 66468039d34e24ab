use client_core::{SessionPhase, SessionState};
use shared::domain::{AgentStatus, ArtifactId, LogEntryId};

/// Turns successive state snapshots into the lines that changed between them.
#[derive(Debug)]
pub struct Renderer {
    logs_seen: usize,
    first_log: Option<LogEntryId>,
    artifacts_seen: usize,
    first_artifact: Option<ArtifactId>,
    statuses: Vec<(String, AgentStatus)>,
    phase: SessionPhase,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            logs_seen: 0,
            first_log: None,
            artifacts_seen: 0,
            first_artifact: None,
            statuses: Vec::new(),
            phase: SessionPhase::Idle,
        }
    }
}

impl Renderer {
    pub fn render(&mut self, state: &SessionState) -> Vec<String> {
        let mut lines = Vec::new();

        // A fresh start replaces the collections wholesale.
        let first_log = state.logs.first().map(|entry| entry.id.clone());
        if first_log != self.first_log || state.logs.len() < self.logs_seen {
            self.logs_seen = 0;
            self.first_log = first_log;
        }
        let first_artifact = state.artifacts.first().map(|artifact| artifact.id.clone());
        if first_artifact != self.first_artifact || state.artifacts.len() < self.artifacts_seen {
            self.artifacts_seen = 0;
            self.first_artifact = first_artifact;
        }

        let phase = state.phase();
        if phase != self.phase {
            lines.push(phase_line(phase, state));
            self.phase = phase;
        }

        for agent in &state.agents {
            let changed = match self.statuses.iter().position(|(id, _)| *id == agent.id) {
                Some(index) if self.statuses[index].1 == agent.status => false,
                Some(index) => {
                    self.statuses[index].1 = agent.status;
                    true
                }
                None => {
                    self.statuses.push((agent.id.clone(), agent.status));
                    agent.status != AgentStatus::Idle
                }
            };
            if changed {
                let mut line = format!("  {:<14} {}", agent.name, status_label(agent.status));
                if let Some(thought) = &agent.thought {
                    line.push_str(&format!(" ({thought})"));
                }
                lines.push(line);
            }
        }

        for entry in &state.logs[self.logs_seen..] {
            lines.push(format!("[{}] {}: {}", entry.timestamp, entry.agent, entry.message));
        }
        self.logs_seen = state.logs.len();

        for artifact in &state.artifacts[self.artifacts_seen..] {
            lines.push(format!(
                "  + artifact {} ({}) {}",
                artifact.title,
                artifact.kind.as_str(),
                artifact.preview
            ));
        }
        self.artifacts_seen = state.artifacts.len();

        lines
    }
}

fn phase_line(phase: SessionPhase, state: &SessionState) -> String {
    let error = state.error.as_deref().unwrap_or("unknown error");
    match phase {
        SessionPhase::Idle => "== idle".to_string(),
        SessionPhase::Running => format!("== sprint running: {}", state.goal),
        SessionPhase::Complete => format!(
            "== sprint complete: {} artifacts, {} log entries",
            state.artifacts.len(),
            state.logs.len()
        ),
        SessionPhase::Failed => format!("== sprint failed: {error}"),
        SessionPhase::Disconnected => format!("== disconnected: {error}"),
        SessionPhase::Cancelled => "== sprint cancelled".to_string(),
    }
}

fn status_label(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Idle => "idle",
        AgentStatus::Thinking => "thinking",
        AgentStatus::Active => "active",
        AgentStatus::Done => "done",
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
