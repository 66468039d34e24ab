use super::*;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn missing_file_yields_defaults() {
    let settings = load_settings_from(Path::new("/nonexistent/sprint.toml"), no_env);
    assert_eq!(settings, ClientSettings::default());
}

#[test]
fn file_values_override_defaults() {
    let mut settings = ClientSettings::default();
    apply_file(
        &mut settings,
        r#"
            coordinator_url = "wss://sprints.example.com/base"
            connect_timeout_ms = 2500
            close_timeout_ms = "750"
        "#,
    );
    assert_eq!(settings.coordinator_url, "wss://sprints.example.com/base");
    assert_eq!(settings.connect_timeout_ms, 2500);
    assert_eq!(settings.close_timeout_ms, 750);
}

#[test]
fn prefixed_env_wins_over_plain_names() {
    let mut settings = ClientSettings::default();
    apply_env(&mut settings, |key| match key {
        "WS_URL" => Some("ws://plain:1".to_string()),
        "APP__COORDINATOR_URL" => Some("ws://prefixed:2".to_string()),
        "APP__CONNECT_TIMEOUT_MS" => Some("not-a-number".to_string()),
        _ => None,
    });
    assert_eq!(settings.coordinator_url, "ws://prefixed:2");
    assert_eq!(settings.connect_timeout_ms, 10_000);
}

#[test]
fn unparseable_file_is_ignored() {
    let mut settings = ClientSettings::default();
    apply_file(&mut settings, "coordinator_url = [");
    assert_eq!(settings, ClientSettings::default());
}
