//! Per-client rate limiting (governor)
//!
//! Every client IP gets its own token bucket refilled at
//! `limiter.requests_per_second` with room for `limiter.burst` requests.
//! Buckets for idle clients are dropped by [`IpRateLimiter::sweep`], which
//! the server calls on a timer until shutdown.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::LimiterConfig,
    error::{Error, Result},
    handlers::ApiError,
    state::AppState,
};

type KeyedLimiter<C> =
    RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// Token buckets keyed by client IP
pub struct IpRateLimiter<C: Clock = DefaultClock> {
    limiter: KeyedLimiter<C>,
    clock: C,
}

/// The limiter the server runs with
pub type ClientRateLimiter = IpRateLimiter<DefaultClock>;

impl IpRateLimiter<DefaultClock> {
    pub fn new(config: &LimiterConfig) -> Result<Self> {
        Self::with_clock(config, DefaultClock::default())
    }
}

impl<C: Clock + Clone> IpRateLimiter<C> {
    /// Build a limiter driven by `clock`
    pub fn with_clock(config: &LimiterConfig, clock: C) -> Result<Self> {
        let quota = build_quota(config.requests_per_second, config.burst)?;
        let limiter = RateLimiter::new(quota, DefaultKeyedStateStore::default(), clock.clone());
        Ok(Self { limiter, clock })
    }

    /// Take one token for `ip`
    ///
    /// On refusal returns how long the client should wait before retrying.
    pub fn check(&self, ip: IpAddr) -> std::result::Result<(), Duration> {
        self.limiter
            .check_key(&ip)
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }

    /// Drop buckets that have refilled completely and return how many remain
    pub fn sweep(&self) -> usize {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        self.limiter.len()
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

fn build_quota(requests_per_second: f64, burst: u32) -> Result<Quota> {
    let invalid = || {
        Error::InvalidConfig(format!(
            "limiter.requests_per_second ({requests_per_second}) and limiter.burst ({burst}) do not form a usable quota"
        ))
    };

    if !requests_per_second.is_finite() || requests_per_second <= 0.0 {
        return Err(invalid());
    }
    let period = Duration::try_from_secs_f64(1.0 / requests_per_second).map_err(|_| invalid())?;
    let burst = NonZeroU32::new(burst).ok_or_else(invalid)?;

    Quota::with_period(period)
        .map(|quota| quota.allow_burst(burst))
        .ok_or_else(invalid)
}

/// Best guess at the originating client address
///
/// Prefers the first hop of `X-Forwarded-For`, then `X-Real-IP`, then the
/// socket peer. Falls back to the unspecified address so that unattributable
/// requests still share one bucket.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
    let header_ip = |name: &str, first_hop: bool| -> Option<IpAddr> {
        let value = headers.get(name)?.to_str().ok()?;
        let candidate = if first_hop {
            value.split(',').next()?
        } else {
            value
        };
        candidate.trim().parse().ok()
    };

    header_ip("x-forwarded-for", true)
        .or_else(|| header_ip("x-real-ip", false))
        .or_else(|| peer.map(|addr| addr.ip()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Axum middleware enforcing the per-client limit
///
/// A no-op when the limiter is disabled.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(limiter) = state.rate_limiter() else {
        return next.run(request).await;
    };

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(request.headers(), peer);

    match limiter.check(ip) {
        Ok(()) => next.run(request).await,
        Err(wait) => {
            tracing::debug!(client = %ip, ?wait, "Rate limit exceeded");
            ApiError::rate_limited(wait).into_response()
        }
    }
}

/// Periodically evict idle clients until `shutdown` is cancelled
pub async fn run_sweeper(
    limiter: Arc<ClientRateLimiter>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!("Rate limiter sweeper stopped");
                return;
            }
            _ = ticker.tick() => {
                let remaining = limiter.sweep();
                tracing::debug!(tracked_clients = remaining, "Swept idle rate limiter entries");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use governor::clock::FakeRelativeClock;

    fn config(requests_per_second: f64, burst: u32) -> LimiterConfig {
        LimiterConfig {
            requests_per_second,
            burst,
            ..LimiterConfig::default()
        }
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_burst_then_refusal() {
        let clock = FakeRelativeClock::default();
        let limiter = IpRateLimiter::with_clock(&config(2.0, 4), clock.clone()).unwrap();

        for _ in 0..4 {
            assert!(limiter.check(ip(1)).is_ok());
        }
        let wait = limiter.check(ip(1)).unwrap_err();
        assert!(wait > Duration::ZERO);
        assert!(wait <= Duration::from_millis(500));
    }

    #[test]
    fn test_system_clock_limiter() {
        let limiter = ClientRateLimiter::new(&config(1.0, 2)).unwrap();

        assert!(limiter.check(ip(1)).is_ok());
        assert!(limiter.check(ip(1)).is_ok());
        let wait = limiter.check(ip(1)).unwrap_err();
        assert!(wait <= Duration::from_secs(1));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_refill_over_time() {
        let clock = FakeRelativeClock::default();
        let limiter = IpRateLimiter::with_clock(&config(2.0, 1), clock.clone()).unwrap();

        assert!(limiter.check(ip(1)).is_ok());
        assert!(limiter.check(ip(1)).is_err());

        clock.advance(Duration::from_millis(500));
        assert!(limiter.check(ip(1)).is_ok());
    }

    #[test]
    fn test_clients_are_independent() {
        let clock = FakeRelativeClock::default();
        let limiter = IpRateLimiter::with_clock(&config(1.0, 1), clock).unwrap();

        assert!(limiter.check(ip(1)).is_ok());
        assert!(limiter.check(ip(1)).is_err());
        assert!(limiter.check(ip(2)).is_ok());
    }

    #[test]
    fn test_sweep_evicts_idle_clients() {
        let clock = FakeRelativeClock::default();
        let limiter = IpRateLimiter::with_clock(&config(2.0, 4), clock.clone()).unwrap();

        limiter.check(ip(1)).unwrap();
        limiter.check(ip(2)).unwrap();
        assert_eq!(limiter.tracked_clients(), 2);

        clock.advance(Duration::from_secs(60));
        assert_eq!(limiter.sweep(), 0);
    }

    #[test]
    fn test_invalid_quota() {
        assert!(build_quota(0.0, 4).is_err());
        assert!(build_quota(f64::NAN, 4).is_err());
        assert!(build_quota(2.0, 0).is_err());
        assert!(build_quota(2.0, 4).is_ok());
    }

    #[test]
    fn test_client_ip_precedence() {
        let peer: SocketAddr = "192.168.1.9:5000".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some(peer)), peer.ip());
        assert_eq!(
            client_ip(&headers, None),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );

        headers.insert("x-real-ip", HeaderValue::from_static("172.16.0.4"));
        assert_eq!(client_ip(&headers, Some(peer)), ip_from("172.16.0.4"));

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, Some(peer)), ip_from("203.0.113.7"));
    }

    #[test]
    fn test_client_ip_ignores_garbage_headers() {
        let peer: SocketAddr = "192.168.1.9:5000".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("unknown"));
        assert_eq!(client_ip(&headers, Some(peer)), peer.ip());
    }

    fn ip_from(s: &str) -> IpAddr {
        s.parse().unwrap()
    }
}
