//! Cooperative delay used to pace requests and wait out rate limits.

use std::time::Duration;

/// Suspends the current task for `delay`. A zero delay returns without
/// yielding to the timer.
pub async fn pause(delay: Duration) {
    if delay.is_zero() {
        return;
    }
    tokio::time::sleep(delay).await;
}
