//! Preflight reachability check for the site under test

use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Delay between preflight attempts
const RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Fail fast, before a browser is launched, if `url` does not answer with a
/// success status within `timeout_duration`.
pub async fn check_reachable(url: &str, timeout_duration: Duration) -> E2eResult<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let start = Instant::now();
    let mut attempts = 0;
    let mut last_error = String::from("no attempt made");

    while attempts == 0 || start.elapsed() < timeout_duration {
        attempts += 1;

        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("{} reachable ({})", url, resp.status());
                return Ok(());
            }
            Ok(resp) => {
                warn!("Preflight GET {} returned {}", url, resp.status());
                last_error = format!("HTTP {}", resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for {} ...", url);
                }
                last_error = e.to_string();
            }
        }

        sleep(RETRY_INTERVAL).await;
    }

    Err(E2eError::Navigation {
        url: url.to_string(),
        reason: format!("unreachable after {} attempts: {}", attempts, last_error),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_is_navigation_error() {
        // Bind and release a port so nothing is listening on it
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let target = format!("http://127.0.0.1:{}/", port);

        let err = check_reachable(&target, Duration::from_millis(200)).await.unwrap_err();

        match err {
            E2eError::Navigation { url, reason } => {
                assert_eq!(url, target);
                assert!(reason.contains("attempts"));
            }
            other => panic!("expected navigation error, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let err = check_reachable("not a url", Duration::from_millis(10)).await.unwrap_err();
        assert!(matches!(err, E2eError::Navigation { .. }));
    }
}
