use crate::server::auth::Authenticator;
use crate::server::notify::NotificationHub;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::{pin, select, time};
use tokio_util::sync::CancellationToken;
use tokio_util::task::task_tracker;

async fn worker(auth: Arc<Authenticator>, hub: Arc<NotificationHub>, period: Duration, cancel_token: CancellationToken) {
    let interval = time::interval(period);
    pin!(interval);
    loop {
        select! {
            _ = interval.tick() => {},
            _ = cancel_token.cancelled() => {
                info!("received cancel signal, returning gracefully");
                return;
            }
        }

        match auth.purge_expired().await {
            Ok(0) => {}
            Ok(n) => info!("purged {} expired sessions", n),
            Err(e) => error!("failed to purge expired sessions, {}", e),
        }
        hub.cleanup_empty_groups();
    }
}

/// Removes expired sessions every `period` until cancelled.
pub async fn session_sweeper(
    auth: Arc<Authenticator>,
    hub: Arc<NotificationHub>,
    period: Duration,
    cancel_token: CancellationToken,
) {
    let tracker = task_tracker::TaskTracker::new();
    tracker.spawn(worker(auth, hub, period, cancel_token));
    if tracker.close() {
        tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::auth::tests::seed;
    use crate::server::database::memory::MemoryStore;
    use crate::server::util::time::helper::set_mock_now;

    #[tokio::test]
    async fn sweeps_until_cancelled() {
        set_mock_now(0);
        let store = Arc::new(MemoryStore::new());
        let user = seed(&store, "seaside").await;
        let auth = Arc::new(Authenticator::new(store.clone(), 1));
        auth.login(&user.email, "secret").await.unwrap();
        set_mock_now(2 * 3600);

        let cancel_token = CancellationToken::new();
        let sweeper = tokio::spawn(session_sweeper(
            auth,
            Arc::new(NotificationHub::new()),
            Duration::from_millis(10),
            cancel_token.clone(),
        ));
        // the first tick fires immediately
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.session_count().await, 0);

        cancel_token.cancel();
        time::timeout(Duration::from_secs(1), sweeper).await.unwrap().unwrap();
        set_mock_now(0);
    }
}
