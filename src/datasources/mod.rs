pub mod bhuvan;
pub mod openweathermap;
pub mod soilgrids;

pub use bhuvan::BhuvanClient;
pub use openweathermap::OpenWeatherMapClient;
pub use soilgrids::SoilGridsClient;

use crate::error::{AdvisorError, Result};
use std::time::Duration;
use tracing::warn;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 250;

/// Send a request with a bounded retry budget.
///
/// Retries only transport timeouts/connect failures and 429/5xx responses,
/// with a doubling delay between attempts. Any other non-success status is
/// returned to the caller unretried.
pub(crate) async fn send_with_retry(
    request: reqwest::RequestBuilder,
    source: &str,
) -> Result<reqwest::Response> {
    let mut delay = Duration::from_millis(INITIAL_BACKOFF_MS);
    let mut attempt = 1;

    loop {
        let req = request.try_clone().ok_or_else(|| {
            AdvisorError::UpstreamUnavailable(format!("{}: request is not retryable", source))
        })?;

        let outcome = match req.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_server_error() || status.as_u16() == 429 {
                    Err(format!("{} returned {}", source, status))
                } else {
                    Ok(response)
                }
            }
            Err(e) if e.is_timeout() || e.is_connect() => Err(format!("{}: {}", source, e)),
            Err(e) => {
                return Err(AdvisorError::UpstreamUnavailable(format!(
                    "{}: {}",
                    source, e
                )))
            }
        };

        match outcome {
            Ok(response) => return Ok(response),
            Err(reason) if attempt < MAX_ATTEMPTS => {
                warn!(attempt, %reason, "Retrying upstream request");
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(reason) => return Err(AdvisorError::UpstreamUnavailable(reason)),
        }
    }
}
