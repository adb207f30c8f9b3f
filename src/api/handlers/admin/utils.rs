//! Client identity helpers for lockout keys.

use axum::http::HeaderMap;
use std::net::SocketAddr;

const UNKNOWN_CLIENT: &str = "unknown";

/// Checked in order; the first address of the first present header wins.
const PROXY_HEADERS: [&str; 2] = ["x-forwarded-for", "x-real-ip"];

/// Key used by the login attempt tracker.
///
/// Proxy headers are only honoured when the deployment says a trusted proxy
/// overwrites them; otherwise any client could rotate its lockout key.
pub(super) fn client_key(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> String {
    trust_proxy_headers
        .then(|| forwarded_client(headers))
        .flatten()
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn forwarded_client(headers: &HeaderMap) -> Option<String> {
    PROXY_HEADERS.iter().find_map(|name| {
        let value = headers.get(*name)?.to_str().ok()?;
        let first = value.split(',').next()?.trim();
        (!first.is_empty()).then(|| first.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some(SocketAddr::from(([192, 0, 2, 10], 51234)))
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn proxy_headers_ignored_unless_trusted() {
        let headers = headers(&[("x-forwarded-for", "198.51.100.4")]);
        assert_eq!(client_key(&headers, peer(), false), "192.0.2.10");
        assert_eq!(client_key(&headers, peer(), true), "198.51.100.4");
    }

    #[test]
    fn trusted_proxy_header_precedence() {
        let both = headers(&[
            ("x-forwarded-for", " 198.51.100.4 , 10.0.0.1"),
            ("x-real-ip", "203.0.113.9"),
        ]);
        assert_eq!(client_key(&both, peer(), true), "198.51.100.4");

        let real_ip_only = headers(&[("x-real-ip", "203.0.113.9")]);
        assert_eq!(client_key(&real_ip_only, peer(), true), "203.0.113.9");

        // A blank forwarded list falls through to X-Real-IP.
        let blank = headers(&[("x-forwarded-for", " "), ("x-real-ip", "203.0.113.9")]);
        assert_eq!(client_key(&blank, None, true), "203.0.113.9");
    }

    #[test]
    fn falls_back_to_peer_then_unknown() {
        let empty = HeaderMap::new();
        assert_eq!(client_key(&empty, peer(), true), "192.0.2.10");
        assert_eq!(client_key(&empty, None, true), "unknown");
        assert_eq!(client_key(&empty, None, false), "unknown");
    }
}
