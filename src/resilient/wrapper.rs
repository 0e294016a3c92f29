use async_trait::async_trait;

use crate::{
    error::EvalError,
    generator::{GenerationRequest, SharedGenerator},
};

use super::clock::{Clock, TokioClock};
use super::config::ResilienceConfig;

/// Resilient wrapper that retries transient failures using exponential backoff.
///
/// Each attempt is bounded by the configured attempt timeout. Permanent
/// errors are returned immediately; once the attempt ceiling is reached the
/// wrapper gives up with [`EvalError::RetryExceeded`].
pub struct Resilient<G, C = TokioClock> {
    inner: G,
    cfg: ResilienceConfig,
    clock: C,
}

impl<G: SharedGenerator> Resilient<G> {
    /// Creates a new resilient wrapper around an existing generator.
    pub fn new(inner: G, cfg: ResilienceConfig) -> Self {
        Self::with_clock(inner, cfg, TokioClock)
    }
}

impl<G: SharedGenerator, C: Clock> Resilient<G, C> {
    pub fn with_clock(inner: G, cfg: ResilienceConfig, clock: C) -> Self {
        Self { inner, cfg, clock }
    }

    pub fn config(&self) -> &ResilienceConfig {
        &self.cfg
    }

    async fn attempt(&self, request: &GenerationRequest) -> Result<String, EvalError> {
        match self.cfg.attempt_timeout() {
            Some(limit) => tokio::time::timeout(limit, self.inner.generate(request))
                .await
                .map_err(|_| EvalError::Timeout {
                    seconds: limit.as_secs(),
                })?,
            None => self.inner.generate(request).await,
        }
    }

    async fn retry(&self, request: &GenerationRequest) -> Result<String, EvalError> {
        let max_attempts = self.cfg.max_attempts.max(1);
        let mut last_err: Option<EvalError> = None;

        for idx in 0..max_attempts {
            match self.attempt(request).await {
                Ok(text) => return Ok(text),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => {
                    log::debug!(
                        "Generation attempt {}/{} failed: {err}",
                        idx + 1,
                        max_attempts
                    );
                    last_err = Some(err);
                    if idx + 1 < max_attempts {
                        self.clock.sleep(self.cfg.backoff_delay(idx)).await;
                    }
                }
            }
        }

        Err(EvalError::RetryExceeded {
            attempts: max_attempts,
            last_error: last_err.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl<G: SharedGenerator, C: Clock> SharedGenerator for Resilient<G, C> {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, EvalError> {
        self.retry(request).await
    }
}
