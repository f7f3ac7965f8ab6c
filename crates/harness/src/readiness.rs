//! HTTP readiness polling

use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use paasport_common::{Error, Result};

/// Per-attempt request timeout while polling
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll `url` until a 2xx response arrives or `total` elapses
///
/// A single attempt is one bounded GET; connection refused while the target
/// is still coming up is expected and only logged once. The loop never
/// overshoots the budget by more than one poll interval plus one request.
pub async fn wait_for_url(url: &str, total: Duration, interval: Duration) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let start = Instant::now();
    let mut attempts = 0usize;

    while start.elapsed() < total {
        attempts += 1;

        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("{} ready after {} attempt(s)", url, attempts);
                return Ok(());
            }
            Ok(resp) => {
                warn!("Readiness check on {} returned {}", url, resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for {}...", url);
                }
                if !e.is_connect() {
                    warn!("Readiness check on {} failed: {}", url, e);
                }
            }
        }

        sleep(interval).await;
    }

    Err(Error::ReadinessTimeout {
        target: url.to_string(),
        seconds: total.as_secs(),
    })
}
