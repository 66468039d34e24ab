use reqwest::Client;
use shared::protocol::HealthResponse;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("cannot derive health endpoint from {0}")]
    Endpoint(String),
    #[error("health request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Maps the coordinator's WebSocket base URL onto its HTTP `/health` route.
pub fn health_endpoint(coordinator_url: &Url) -> Result<Url, HealthError> {
    let scheme = match coordinator_url.scheme() {
        "ws" | "http" => "http",
        "wss" | "https" => "https",
        _ => return Err(HealthError::Endpoint(coordinator_url.to_string())),
    };
    let mut endpoint = coordinator_url.clone();
    endpoint
        .set_scheme(scheme)
        .map_err(|()| HealthError::Endpoint(coordinator_url.to_string()))?;
    endpoint
        .path_segments_mut()
        .map_err(|()| HealthError::Endpoint(coordinator_url.to_string()))?
        .pop_if_empty()
        .push("health");
    Ok(endpoint)
}

pub async fn probe_health(
    http: &Client,
    coordinator_url: &Url,
) -> Result<HealthResponse, HealthError> {
    let endpoint = health_endpoint(coordinator_url)?;
    let res = http.get(endpoint).send().await?.error_for_status()?;
    Ok(res.json().await?)
}

#[cfg(test)]
#[path = "tests/health_tests.rs"]
mod tests;
