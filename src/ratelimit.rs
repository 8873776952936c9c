//! Fixed-window per-IP rate limiting for the create endpoint.

use crate::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;

/// Default requests allowed per window.
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 5;

const WINDOW_SECS: i64 = 60;
// Window maps above this size get pruned during checks.
const PRUNE_THRESHOLD: usize = 1024;

struct Window {
    count: u32,
    reset_at: i64, // unix seconds
}

pub struct RateLimiter {
    enabled: bool,
    limit: u32,
    windows: Mutex<HashMap<String, Window>>,
}

pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: i64,
}

impl RateLimiter {
    pub fn new(limit: u32, enabled: bool) -> Self {
        Self {
            enabled,
            limit: if limit == 0 {
                DEFAULT_REQUESTS_PER_MINUTE
            } else {
                limit
            },
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Count a request against the client's current window.
    pub fn check(&self, client: &str) -> Decision {
        let now = Utc::now().timestamp();
        let mut windows = self.windows.lock();

        if windows.len() > PRUNE_THRESHOLD {
            windows.retain(|_, w| w.reset_at > now);
        }

        let window = windows.entry(client.to_string()).or_insert(Window {
            count: 0,
            reset_at: now + WINDOW_SECS,
        });
        if window.reset_at <= now {
            window.count = 0;
            window.reset_at = now + WINDOW_SECS;
        }
        window.count += 1;

        Decision {
            allowed: window.count <= self.limit,
            limit: self.limit,
            remaining: self.limit.saturating_sub(window.count),
            reset_at: window.reset_at,
        }
    }
}

pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !state.limiter.enabled() {
        return next.run(request).await;
    }

    let client = client_ip(&request);
    let decision = state.limiter.check(&client);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        let retry_after = (decision.reset_at - Utc::now().timestamp()).max(0);
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Rate limit exceeded", "retry_after": retry_after })),
        )
            .into_response()
    };

    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", header_value(decision.limit as i64));
    headers.insert("x-ratelimit-remaining", header_value(decision.remaining as i64));
    headers.insert("x-ratelimit-reset", header_value(decision.reset_at));

    response
}

fn header_value(value: i64) -> HeaderValue {
    HeaderValue::from_str(&value.to_string()).unwrap_or(HeaderValue::from_static("0"))
}

// Trust the first X-Forwarded-For hop when present, else the socket address.
fn client_ip(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(ip) = forwarded.split(',').next() {
            let ip = ip.trim();
            if !ip.is_empty() {
                return ip.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denies_above_the_limit() {
        let limiter = RateLimiter::new(2, true);

        let first = limiter.check("10.0.0.1");
        assert!(first.allowed);
        assert_eq!(first.limit, 2);
        assert_eq!(first.remaining, 1);

        let second = limiter.check("10.0.0.1");
        assert!(second.allowed);
        assert_eq!(second.remaining, 0);

        let third = limiter.check("10.0.0.1");
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);
        assert!(third.reset_at > Utc::now().timestamp());
    }

    #[test]
    fn windows_are_per_client() {
        let limiter = RateLimiter::new(1, true);

        assert!(limiter.check("10.0.0.1").allowed);
        assert!(!limiter.check("10.0.0.1").allowed);
        assert!(limiter.check("10.0.0.2").allowed);
    }

    #[test]
    fn zero_limit_falls_back_to_default() {
        let limiter = RateLimiter::new(0, true);
        assert_eq!(limiter.check("10.0.0.1").limit, DEFAULT_REQUESTS_PER_MINUTE);
    }
}
