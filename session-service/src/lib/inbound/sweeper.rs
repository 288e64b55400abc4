use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::domain::session::ports::AuthServicePort;

/// Periodically delete expired refresh and reset tokens.
///
/// The first sweep runs immediately. A failed sweep is logged and retried on
/// the next tick.
pub fn spawn_token_sweeper(auth_service: Arc<dyn AuthServicePort>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match auth_service.purge_expired().await {
                Ok(summary) => tracing::info!(
                    refresh_tokens = summary.refresh_tokens,
                    password_reset_tokens = summary.password_reset_tokens,
                    "Expired tokens purged"
                ),
                Err(e) => tracing::error!(error = %e, "Token purge failed"),
            }
        }
    })
}
