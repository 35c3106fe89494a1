//! Rate limiting middleware using token bucket algorithm.

use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::net::IpAddr;
use std::sync::Arc;
use tower_governor::{
    GovernorError, GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor},
};

/// Keys buckets by client IP.
///
/// Behind a trusted reverse proxy the IP comes from `X-Forwarded-For`,
/// `X-Real-IP` or `Forwarded`; otherwise from the socket peer address.
#[derive(Debug, Clone, Copy)]
pub struct ClientIpKeyExtractor {
    behind_proxy: bool,
}

impl ClientIpKeyExtractor {
    pub fn new(behind_proxy: bool) -> Self {
        Self { behind_proxy }
    }
}

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if self.behind_proxy {
            SmartIpKeyExtractor.extract(req)
        } else {
            PeerIpKeyExtractor.extract(req)
        }
    }
}

pub type RateLimitLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Creates a rate limiter for browsing the portal.
///
/// # Limits
///
/// - **Rate**: 5 requests per second
/// - **Burst**: 100 requests
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
pub fn layer(behind_proxy: bool) -> RateLimitLayer {
    build(behind_proxy, 5, 100)
}

/// Creates a stricter rate limiter for credential endpoints.
///
/// # Limits
///
/// - **Rate**: 1 request per second
/// - **Burst**: 10 requests
///
/// Used for login, signup, OTP verification and password reset, where
/// guessing is the threat.
///
/// # Example
///
/// ```rust,ignore
/// let credentials = Router::new()
///     .route("/student_login", post(student_login_submit))
///     .layer(rate_limit::secure_layer(config.behind_proxy));
/// ```
pub fn secure_layer(behind_proxy: bool) -> RateLimitLayer {
    build(behind_proxy, 1, 10)
}

fn build(behind_proxy: bool, per_second: u64, burst: u32) -> RateLimitLayer {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(ClientIpKeyExtractor::new(behind_proxy))
            .per_second(per_second)
            .burst_size(burst)
            .finish()
            .expect("rate limit settings are non-zero"),
    );

    GovernorLayer::new(governor_conf)
}
