use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::error::ApiError;

/// One bucket per client address.
pub type ClientRateLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

const DEFAULT_REQUESTS: NonZeroU32 = match NonZeroU32::new(100) {
    Some(v) => v,
    None => unreachable!(),
};

/// Idle buckets are dropped once this many clients are tracked.
const SHRINK_THRESHOLD: usize = 10_000;

/// Quota allowing `rate_limit_requests` per `rate_limit_window_secs` for a
/// single client, replenished evenly, with the whole allowance available
/// as a burst.
pub fn quota_from_config(api: &ApiConfig) -> Quota {
    let requests = NonZeroU32::new(api.rate_limit_requests).unwrap_or(DEFAULT_REQUESTS);
    let window = Duration::from_secs(api.rate_limit_window_secs.max(1));
    Quota::with_period(window / requests.get())
        .unwrap_or_else(|| Quota::per_second(requests))
        .allow_burst(requests)
}

pub fn limiter_from_config(api: &ApiConfig) -> Arc<ClientRateLimiter> {
    Arc::new(RateLimiter::keyed(quota_from_config(api)))
}

/// Peer address from the connection. Requests served without connect info
/// share the unspecified-address bucket.
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Reject requests over the client's quota with 429 and `Retry-After`.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<ClientRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);

    if limiter.len() > SHRINK_THRESHOLD {
        limiter.retain_recent();
    }

    match limiter.check_key(&ip) {
        Ok(()) => next.run(request).await,
        Err(not_until) => {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            let retry_after = wait.as_secs().max(1);
            tracing::warn!("Rate limit exceeded for {}, retry after {}s", ip, retry_after);

            let mut response = ApiError::too_many_requests("Too many requests. Please slow down.").into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
            response
        }
    }
}
