use tokio::task::{JoinError, JoinHandle};

pub mod history;
pub mod monitor;
pub mod price_feed;

pub use history::HistoricalFetcher;
pub use monitor::{CoinReport, Monitor};
pub use price_feed::{CycleOutcome, PollLoop, PollState};

/// Resolves when a spawned service task ends; never resolves for `None`.
pub async fn task_exit(task: &mut Option<JoinHandle<()>>) -> std::result::Result<(), JoinError> {
    match task.as_mut() {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_panicking_task_is_reported() {
        let mut task = Some(tokio::spawn(async {
            panic!("forecast monitor crashed");
        }));
        let result = task_exit(&mut task).await;
        assert!(result.unwrap_err().is_panic());
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_task_never_exits() {
        let mut task: Option<JoinHandle<()>> = None;
        let waited = tokio::time::timeout(Duration::from_secs(3600), task_exit(&mut task)).await;
        assert!(waited.is_err());
    }
}
