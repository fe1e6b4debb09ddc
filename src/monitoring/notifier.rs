use async_trait::async_trait;
use log::{debug, info};
#[cfg(test)]
use mockall::automock;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

use crate::config::{NotificationBackend, NotificationConfig};
use crate::error::{Error, Result};

const APP_NAME: &str = "coin-forecast";

/// Fire-and-forget sink for forecast alerts.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> Result<()>;
}

/// Desktop popup through `notify-send`.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    program: String,
    display_timeout: Duration,
}

impl DesktopNotifier {
    pub fn new(display_timeout: Duration) -> Self {
        Self::with_program("notify-send", display_timeout)
    }

    pub fn with_program(program: &str, display_timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            display_timeout,
        }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        let status = Command::new(&self.program)
            .arg("--app-name")
            .arg(APP_NAME)
            .arg("--expire-time")
            .arg(self.display_timeout.as_millis().to_string())
            .arg(title)
            .arg(message)
            .status()
            .await
            .map_err(|e| Error::Notification(format!("failed to run {}: {}", self.program, e)))?;

        if !status.success() {
            return Err(Error::Notification(format!(
                "{} exited with {}",
                self.program, status
            )));
        }
        debug!("Desktop notification sent: {}", title);
        Ok(())
    }
}

/// Writes notifications to the log instead of the desktop.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        info!("[{}] {}", title, message.replace("\n\n", " | "));
        Ok(())
    }
}

pub fn build_notifier(config: &NotificationConfig) -> Arc<dyn Notifier> {
    match config.backend {
        NotificationBackend::Desktop => Arc::new(DesktopNotifier::new(Duration::from_secs(
            config.display_timeout_secs,
        ))),
        NotificationBackend::Log => Arc::new(LogNotifier),
    }
}
