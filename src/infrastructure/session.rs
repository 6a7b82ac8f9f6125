//! Session provider implementations
//!
//! A session owns the navigation driver for the duration of one collection
//! run. The provider is the seam where host-specific bootstrap concerns
//! (cookie reuse, user agent, an external browser profile) are decided;
//! the collector itself only ever sees a `SessionHandle`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::domain::services::{SessionHandle, SessionProvider};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http_driver::{HttpDriverConfig, HttpPageDriver};

/// Provides HTTP-backed crawling sessions.
///
/// Each acquired session gets its own client and cookie store; exclusive
/// use is enforced by handing the driver out by value inside the handle.
pub struct HttpSessionProvider {
    driver_config: HttpDriverConfig,
}

impl HttpSessionProvider {
    pub fn new(driver_config: HttpDriverConfig) -> Self {
        Self { driver_config }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(HttpDriverConfig::from_advanced(&config.advanced))
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn acquire(&self) -> Result<SessionHandle> {
        let driver = HttpPageDriver::new(self.driver_config.clone())
            .context("Failed to build navigation driver for session")?;

        let handle = SessionHandle::new(Box::new(driver));
        info!("🔗 Acquired crawling session {}", handle.id());
        Ok(handle)
    }

    async fn release(&self, handle: SessionHandle) -> Result<()> {
        let held_for = (Utc::now() - handle.started_at()).num_seconds();
        info!("Released crawling session {} after {}s", handle.id(), held_for);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquired_sessions_are_distinct() {
        let provider = HttpSessionProvider::new(HttpDriverConfig::default());

        let first = provider.acquire().await.expect("first session");
        let second = provider.acquire().await.expect("second session");
        assert_ne!(first.id(), second.id());

        provider.release(first).await.expect("release first");
        provider.release(second).await.expect("release second");
    }
}
