use std::{collections::HashMap, fs, time::Duration};

use serde::Deserialize;

use crate::script::Pacing;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub step_delay_ms: u64,
    pub phase_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".into(),
            step_delay_ms: 150,
            phase_delay_ms: 500,
        }
    }
}

impl Settings {
    pub fn pacing(&self) -> Pacing {
        Pacing {
            step_delay: Duration::from_millis(self.step_delay_ms),
            phase_delay: Duration::from_millis(self.phase_delay_ms),
        }
    }
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string("coordinator.toml").ok();
    settings_from(file.as_deref(), |key| std::env::var(key).ok())
}

pub(crate) fn settings_from(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
            if let Some(v) = file_cfg.get("bind_addr") {
                settings.bind_addr = v.clone();
            }
            if let Some(v) = file_cfg.get("step_delay_ms").and_then(|v| v.parse().ok()) {
                settings.step_delay_ms = v;
            }
            if let Some(v) = file_cfg.get("phase_delay_ms").and_then(|v| v.parse().ok()) {
                settings.phase_delay_ms = v;
            }
        }
    }

    if let Some(v) = env("COORDINATOR_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Some(v) = env("APP__STEP_DELAY_MS").and_then(|v| v.parse().ok()) {
        settings.step_delay_ms = v;
    }
    if let Some(v) = env("APP__PHASE_DELAY_MS").and_then(|v| v.parse().ok()) {
        settings.phase_delay_ms = v;
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
