use crate::config::PacingConfig;
use std::time::Duration;
use tracing::{debug, info};

/// Fixed pauses between provider calls to stay under requests-per-minute limits.
///
/// The pauses do not look at response headers or errors; every call is
/// followed by the same delay whether it succeeded or not.
#[derive(Debug, Clone)]
pub struct Pacer {
    chat_delay: Duration,
    embedding_delay: Duration,
}

impl Pacer {
    pub fn new(chat_delay: Duration, embedding_delay: Duration) -> Self {
        Self {
            chat_delay,
            embedding_delay,
        }
    }

    pub fn from_config(cfg: &PacingConfig) -> Self {
        Self::new(cfg.chat_delay(), cfg.embedding_delay())
    }

    /// No pauses at all; for tests and local providers.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub async fn after_chat(&self) {
        if self.chat_delay.is_zero() {
            return;
        }
        info!(
            "waiting {:.1} seconds to stay under the chat rate limit",
            self.chat_delay.as_secs_f32()
        );
        tokio::time::sleep(self.chat_delay).await;
    }

    pub async fn after_embedding(&self) {
        if self.embedding_delay.is_zero() {
            return;
        }
        debug!("waiting {:?} before the next embedding call", self.embedding_delay);
        tokio::time::sleep(self.embedding_delay).await;
    }
}
