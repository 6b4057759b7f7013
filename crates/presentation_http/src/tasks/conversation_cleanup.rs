//! Mapping and contact retention cleanup task (the Janitor)
//!
//! Periodically removes message mappings and cached contacts older than
//! the configured retention window.

use std::sync::Arc;
use std::time::Duration;

use application::ports::MappingStorePort;
use chrono::Utc;
use tracing::{debug, error, info};

/// Spawn a background task that periodically cleans up old mappings and
/// contacts.
///
/// Returns a `JoinHandle` that can be used to abort the task on shutdown.
pub fn spawn_conversation_cleanup_task(
    mapping_store: Arc<dyn MappingStorePort>,
    retention_days: u32,
    cleanup_interval: Duration,
) -> tokio::task::JoinHandle<()> {
    info!(
        retention_days = retention_days,
        interval_secs = cleanup_interval.as_secs(),
        "starting mapping cleanup task"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cleanup_interval);
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let cutoff = Utc::now() - chrono::Duration::days(i64::from(retention_days));

            debug!(cutoff = %cutoff, "running mapping cleanup");

            match mapping_store.cleanup(cutoff).await {
                Ok(removed) => {
                    if removed > 0 {
                        info!(removed_count = removed, "cleaned up old message mappings");
                    } else {
                        debug!("no mappings to clean up");
                    }
                },
                Err(e) => error!(error = %e, "failed to clean up old mappings"),
            }

            match mapping_store.cleanup_contacts(cutoff).await {
                Ok(removed) => {
                    if removed > 0 {
                        info!(removed_count = removed, "cleaned up stale cached contacts");
                    }
                },
                Err(e) => error!(error = %e, "failed to clean up stale contacts"),
            }
        }
    })
}
