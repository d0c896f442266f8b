//! Small async helpers for test bodies.

use std::time::Duration;

/// Suspend the current test for `duration`.
pub async fn delay(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Suspend for `duration`, then yield `value`.
pub async fn delay_with<T>(duration: Duration, value: T) -> T {
    delay(duration).await;
    value
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn delays_resolve_after_duration() {
        let start = Instant::now();
        let value = delay_with(Duration::from_millis(250), "late").await;
        assert_eq!(value, "late");
        assert!(start.elapsed() >= Duration::from_millis(250));
    }
}
