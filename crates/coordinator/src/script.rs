//! The four-phase sprint the coordinator plays back to every client.
//!
//! Artifact bodies are templated from the goal; ids and timestamps are
//! assigned when a step is turned into a frame, so they reflect send time.

use std::time::Duration;

use chrono::Local;
use shared::{
    domain::{AgentStatus, Artifact, ArtifactId, ArtifactKind, LogEntry, LogEntryId},
    protocol::{AgentUpdatePayload, CompletePayload, ServerFrame},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub step_delay: Duration,
    pub phase_delay: Duration,
}

#[cfg(test)]
impl Pacing {
    pub const IMMEDIATE: Pacing = Pacing {
        step_delay: Duration::ZERO,
        phase_delay: Duration::ZERO,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Log {
        agent: &'static str,
        message: String,
    },
    Agent {
        agent_id: &'static str,
        name: &'static str,
        status: AgentStatus,
        thought: Option<&'static str>,
    },
    Artifact {
        title: &'static str,
        kind: ArtifactKind,
        preview: String,
        content: String,
    },
    Pause(Duration),
    Complete,
}

impl Step {
    /// `None` for pauses, which only affect timing.
    pub fn to_frame(&self) -> Option<ServerFrame> {
        let frame = match self {
            Step::Log { agent, message } => ServerFrame::Log(LogEntry {
                id: LogEntryId::generate(),
                agent: agent.to_string(),
                message: message.clone(),
                timestamp: timestamp(),
            }),
            Step::Agent {
                agent_id,
                name,
                status,
                thought,
            } => ServerFrame::AgentUpdate(AgentUpdatePayload {
                agent_id: agent_id.to_string(),
                name: name.to_string(),
                status: *status,
                thought: thought.map(str::to_string),
            }),
            Step::Artifact {
                title,
                kind,
                preview,
                content,
            } => ServerFrame::Artifact(Artifact {
                id: ArtifactId::generate(),
                title: title.to_string(),
                kind: *kind,
                preview: preview.clone(),
                content: Some(content.clone()),
                timestamp: timestamp(),
            }),
            Step::Pause(_) => return None,
            Step::Complete => ServerFrame::Complete(CompletePayload {
                success: Some(true),
            }),
        };
        Some(frame)
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

struct Phase {
    agent_id: &'static str,
    name: &'static str,
    log_label: &'static str,
    thought: &'static str,
    started: &'static str,
    finished: &'static str,
    title: &'static str,
    kind: ArtifactKind,
}

const PHASES: [Phase; 4] = [
    Phase {
        agent_id: "po",
        name: "Product Owner",
        log_label: "Product Owner",
        thought: "Analyzing requirements...",
        started: "Breaking down the goal into user stories...",
        finished: "User stories defined and prioritized.",
        title: "User Stories",
        kind: ArtifactKind::Design,
    },
    Phase {
        agent_id: "arch",
        name: "Architect",
        log_label: "Architect",
        thought: "Designing system...",
        started: "Creating technical design document...",
        finished: "Architecture approved. Ready for implementation.",
        title: "Technical Design",
        kind: ArtifactKind::Design,
    },
    Phase {
        agent_id: "dev",
        name: "Developer",
        log_label: "Developer",
        thought: "Writing code...",
        started: "Implementing API endpoints...",
        finished: "Implementation complete. Handing off to QA.",
        title: "main.py",
        kind: ArtifactKind::Code,
    },
    Phase {
        agent_id: "qa",
        name: "QA Engineer",
        log_label: "QA",
        thought: "Running tests...",
        started: "Executing automated test suite...",
        finished: "All tests passed. Sprint complete!",
        title: "Test Report",
        kind: ArtifactKind::Test,
    },
];

pub fn sprint_script(goal: &str, pacing: Pacing) -> Vec<Step> {
    let mut steps = vec![Step::Log {
        agent: "System",
        message: format!("Sprint started with goal: \"{goal}\""),
    }];

    for (index, phase) in PHASES.iter().enumerate() {
        let content = artifact_body(phase.agent_id, goal);
        let preview = artifact_preview(phase.agent_id, &content);

        steps.push(Step::Agent {
            agent_id: phase.agent_id,
            name: phase.name,
            status: AgentStatus::Active,
            thought: Some(phase.thought),
        });
        steps.push(Step::Log {
            agent: phase.log_label,
            message: phase.started.to_string(),
        });
        steps.push(Step::Pause(pacing.step_delay));
        steps.push(Step::Artifact {
            title: phase.title,
            kind: phase.kind,
            preview,
            content,
        });
        steps.push(Step::Agent {
            agent_id: phase.agent_id,
            name: phase.name,
            status: AgentStatus::Done,
            thought: None,
        });
        steps.push(Step::Log {
            agent: phase.log_label,
            message: phase.finished.to_string(),
        });
        if index + 1 < PHASES.len() {
            steps.push(Step::Pause(pacing.phase_delay));
        }
    }

    steps.push(Step::Log {
        agent: "System",
        message: "Sprint retrospective complete. Ready for next cycle.".to_string(),
    });
    steps.push(Step::Complete);
    steps
}

fn artifact_preview(agent_id: &str, content: &str) -> String {
    match agent_id {
        "po" => {
            let stories = content
                .lines()
                .filter(|line| line.starts_with("## "))
                .count();
            format!("{stories} stories defined")
        }
        "arch" if content.contains("FastAPI") => "FastAPI + React".to_string(),
        "arch" => "Custom Stack".to_string(),
        "qa" if content.to_uppercase().contains("PASS") => "100% PASS".to_string(),
        "qa" => "Tests Complete".to_string(),
        _ => "main.py".to_string(),
    }
}

fn artifact_body(agent_id: &str, goal: &str) -> String {
    match agent_id {
        "po" => format!(
            "# User Stories for: {goal}\n\n\
             ## Story 1: Core Functionality\n\
             **As a** user **I want to** access the main feature **so that** I can accomplish my primary goal.\n\n\
             - [ ] Feature is accessible from the main dashboard\n\
             - [ ] Feature responds within 200ms\n\n\
             ## Story 2: User Authentication\n\
             **As a** user **I want to** securely log in **so that** my data is protected.\n\n\
             - [ ] Token-based authentication\n\
             - [ ] Session management\n\n\
             ## Story 3: Data Persistence\n\
             **As a** user **I want to** save my progress **so that** I can continue later.\n\n\
             - [ ] Auto-save\n\
             - [ ] Data recovery on failure\n"
        ),
        "arch" => format!(
            "# Technical Design Document\n\n\
             ## Overview\n\
             Architecture for: {goal}\n\n\
             ## Tech Stack\n\
             - **Backend**: FastAPI\n\
             - **Frontend**: React + TypeScript\n\
             - **Database**: PostgreSQL\n\n\
             ## API Endpoints\n\
             - `GET /api/v1/data` - Fetch data\n\
             - `POST /api/v1/data` - Create data\n"
        ),
        "dev" => format!(
            "\"\"\"\nFastAPI application generated for: {goal}\n\"\"\"\n\
             from fastapi import FastAPI\n\n\
             app = FastAPI(title=\"AI Dev Team API\")\n\n\n\
             @app.get(\"/health\")\n\
             def health_check():\n    \
                 return {{\"status\": \"healthy\"}}\n"
        ),
        _ => format!(
            "# Test Execution Report\n\n\
             Goal: {goal}\n\n\
             - **Total Tests**: 12\n\
             - **Passed**: 12\n\
             - **Failed**: 0\n\n\
             test_health_check - PASSED\n\
             test_create_data - PASSED\n"
        ),
    }
}

#[cfg(test)]
#[path = "tests/script_tests.rs"]
mod tests;
