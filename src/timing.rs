use std::time::Duration;

use async_trait::async_trait;

use crate::models::Framework;

/// Strategy for the simulated waits in the build and deploy phases.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Sleeps on the tokio timer, scaled by `scale` (0 skips the wait entirely).
#[derive(Debug, Clone, Copy)]
pub struct TokioDelay {
    scale: f64,
}

impl TokioDelay {
    pub fn new(scale: f64) -> Self {
        Self {
            scale: scale.max(0.0),
        }
    }
}

impl Default for TokioDelay {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        let scaled = duration.mul_f64(self.scale);
        if !scaled.is_zero() {
            tokio::time::sleep(scaled).await;
        }
    }
}

/// Returns immediately. Used by tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Delay for NoDelay {
    async fn wait(&self, _duration: Duration) {}
}

/// Simulated compile time, keyed on the project's framework.
pub fn build_delay(framework: Option<Framework>) -> Duration {
    match framework {
        Some(Framework::React) | Some(Framework::Vue) => Duration::from_millis(3000),
        Some(Framework::Vanilla) | None => Duration::from_millis(1500),
    }
}
