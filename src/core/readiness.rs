//! Readiness Wait
//!
//! Waits for the identity provider to answer before provisioning starts.

use crate::core::{HttpRequest, HttpTransport};
use crate::error::BootstrapError;
use crate::types::ReadinessConfig;

/// Poll `{base_url}{path}` until it answers 200.
///
/// Connection failures and non-200 answers both count as "not ready yet".
pub async fn wait_until_ready<T: HttpTransport + ?Sized>(
    transport: &T,
    base_url: &str,
    config: &ReadinessConfig,
) -> Result<(), BootstrapError> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), config.path);

    for attempt in 1..=config.attempts {
        let request = HttpRequest::get(url.as_str()).with_timeout(config.request_timeout);
        match transport.send(request).await {
            Ok(response) if response.status == 200 => {
                tracing::info!(attempt, "identity provider is ready");
                return Ok(());
            }
            Ok(response) => {
                tracing::debug!(attempt, status = response.status, "server not ready");
            }
            Err(e) => {
                tracing::debug!(attempt, error = %e, "readiness check failed");
            }
        }

        if attempt < config.attempts {
            tokio::time::sleep(config.interval).await;
        }
    }

    Err(BootstrapError::NotReady {
        attempts: config.attempts,
    })
}
