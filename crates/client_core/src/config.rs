use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;

pub const DEFAULT_SETTINGS_FILE: &str = "sprint.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSettings {
    pub coordinator_url: String,
    pub connect_timeout_ms: u64,
    pub close_timeout_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            coordinator_url: "ws://localhost:8000".into(),
            connect_timeout_ms: 10_000,
            close_timeout_ms: 2_000,
        }
    }
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file if it parses, then environment overrides.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, env);

    settings
}

fn apply_file(settings: &mut ClientSettings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.get("coordinator_url").and_then(toml::Value::as_str) {
        settings.coordinator_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("connect_timeout_ms").and_then(as_millis) {
        settings.connect_timeout_ms = v;
    }
    if let Some(v) = file_cfg.get("close_timeout_ms").and_then(as_millis) {
        settings.close_timeout_ms = v;
    }
}

fn apply_env(settings: &mut ClientSettings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("WS_URL") {
        settings.coordinator_url = v;
    }
    if let Some(v) = env("SPRINT_COORDINATOR_URL") {
        settings.coordinator_url = v;
    }
    if let Some(v) = env("APP__COORDINATOR_URL") {
        settings.coordinator_url = v;
    }

    if let Some(v) = env("APP__CONNECT_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
        settings.connect_timeout_ms = v;
    }
    if let Some(v) = env("APP__CLOSE_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
        settings.close_timeout_ms = v;
    }
}

fn as_millis(value: &toml::Value) -> Option<u64> {
    match value {
        toml::Value::Integer(v) => u64::try_from(*v).ok(),
        toml::Value::String(v) => v.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
