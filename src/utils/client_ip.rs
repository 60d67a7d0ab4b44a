//! Client address resolution for rate limiting and click records.

use std::net::SocketAddr;

use axum::http::HeaderMap;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Resolves the originating client address of a request.
///
/// When `behind_proxy` is set, the first entry of `X-Forwarded-For` wins,
/// then `X-Real-IP`. Otherwise the headers are ignored, since any client can
/// forge them. The socket peer address is the fallback in both cases.
///
/// Returns `None` when no source yields a non-empty value; callers then use
/// the shared unknown-client bucket.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
///
/// assert_eq!(resolve_client_ip(&headers, None, true).as_deref(), Some("203.0.113.7"));
/// assert_eq!(resolve_client_ip(&headers, None, false), None);
/// ```
pub fn resolve_client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    behind_proxy: bool,
) -> Option<String> {
    if behind_proxy {
        let forwarded = header_str(headers, X_FORWARDED_FOR)
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());

        if let Some(ip) = forwarded.or_else(|| header_str(headers, X_REAL_IP)) {
            return Some(ip.to_string());
        }
    }

    peer.map(|addr| addr.ip().to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
