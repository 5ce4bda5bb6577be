// Per-IP rate limiting for the public voice webhook

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-IP token bucket state
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Shared rate limiter; clone freely (it's an Arc inside)
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<RateLimiterInner>,
}

struct RateLimiterInner {
    buckets: DashMap<IpAddr, Bucket>,
    /// Maximum tokens per IP (burst capacity)
    capacity: f64,
    /// Tokens added per second (sustained rate)
    refill_rate: f64,
}

impl RateLimiter {
    pub fn new(requests_per_second: f64, burst: f64) -> Self {
        Self {
            inner: Arc::new(RateLimiterInner {
                buckets: DashMap::new(),
                capacity: burst,
                refill_rate: requests_per_second,
            }),
        }
    }

    /// Returns true if the request from `ip` is within limits; consumes
    /// one token.
    pub fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut bucket = self.inner.buckets.entry(ip).or_insert_with(|| Bucket {
            tokens: self.inner.capacity,
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.inner.refill_rate).min(self.inner.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Drop buckets idle for more than `idle_secs`; called from a
    /// background task so the map does not grow without bound.
    pub fn purge_idle(&self, idle_secs: u64) {
        let cutoff = Duration::from_secs(idle_secs);
        let now = Instant::now();
        self.inner
            .buckets
            .retain(|_, bucket| now.duration_since(bucket.last_refill) < cutoff);
    }

    pub fn tracked_ips(&self) -> usize {
        self.inner.buckets.len()
    }
}

/// Axum middleware enforcing the limiter. The source IP comes from
/// `X-Forwarded-For` when a reverse proxy sets it.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let ip = forwarded_ip(&request).unwrap_or(IpAddr::from([127, 0, 0, 1]));

    if limiter.check(ip) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(ip = %ip, "Rate limit exceeded");
        Err(StatusCode::TOO_MANY_REQUESTS)
    }
}

fn forwarded_ip(request: &Request<Body>) -> Option<IpAddr> {
    let value = request.headers().get("x-forwarded-for")?.to_str().ok()?;
    // Leftmost entry is the actual client
    value.split(',').next()?.trim().parse().ok()
}
