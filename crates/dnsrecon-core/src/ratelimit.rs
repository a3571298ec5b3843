//! Admission control for provider API calls
//!
//! Every network call of a handler first awaits [`RateLimiter::accept`].
//! Waiting there is the only suspension point of the change execution apart
//! from the calls themselves.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::RateLimitConfig;

/// Admits requests, possibly after waiting
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn accept(&self);
}

/// Admits every request immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

#[async_trait]
impl RateLimiter for Unlimited {
    async fn accept(&self) {}
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last: Instant,
}

/// Token bucket refilled with `qps` tokens per second up to `burst`
#[derive(Debug)]
pub struct TokenBucket {
    qps: f64,
    burst: f64,
    bucket: Mutex<Bucket>,
}

impl TokenBucket {
    /// Create a full bucket
    pub fn new(qps: f64, burst: u32) -> Self {
        let burst = f64::from(burst.max(1));
        Self {
            qps,
            burst,
            bucket: Mutex::new(Bucket {
                tokens: burst,
                last: Instant::now(),
            }),
        }
    }

    /// Take a token or return the time until one is available
    async fn try_take(&self) -> Option<Duration> {
        let mut bucket = self.bucket.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.qps).min(self.burst);
        bucket.last = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            None
        } else {
            Some(Duration::from_secs_f64((1.0 - bucket.tokens) / self.qps))
        }
    }
}

#[async_trait]
impl RateLimiter for TokenBucket {
    async fn accept(&self) {
        while let Some(wait) = self.try_take().await {
            debug!("Rate limit reached, waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }
}

/// Build the limiter described by `config`
pub fn rate_limiter_from_config(config: &RateLimitConfig) -> Arc<dyn RateLimiter> {
    if config.enabled && config.qps > 0.0 {
        Arc::new(TokenBucket::new(config.qps, config.burst))
    } else {
        Arc::new(Unlimited)
    }
}
