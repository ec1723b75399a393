//! Client origin used to key lockouts.

use std::net::SocketAddr;

use axum::http::HeaderMap;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

/// Resolve the client address for a request.
///
/// Proxy headers are only honoured when `trust_proxy_headers` is set; the
/// first `X-Forwarded-For` entry wins over `X-Real-IP`. Otherwise the peer
/// address is used.
pub fn resolve_origin(headers: &HeaderMap, peer: SocketAddr, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        let forwarded = header_str(headers, FORWARDED_FOR)
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }

        if let Some(ip) = header_str(headers, REAL_IP).map(str::trim).filter(|v| !v.is_empty()) {
            return ip.to_string();
        }
    }

    peer.ip().to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "192.0.2.10:51234".parse().unwrap()
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"));
        headers.insert(REAL_IP, HeaderValue::from_static("198.51.100.3"));
        headers
    }

    #[test]
    fn test_untrusted_headers_are_ignored() {
        assert_eq!(resolve_origin(&headers(), peer(), false), "192.0.2.10");
    }

    #[test]
    fn test_first_forwarded_entry_wins() {
        assert_eq!(resolve_origin(&headers(), peer(), true), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_fallback() {
        let mut headers = headers();
        headers.remove(FORWARDED_FOR);
        assert_eq!(resolve_origin(&headers, peer(), true), "198.51.100.3");
    }

    #[test]
    fn test_peer_when_no_proxy_headers() {
        assert_eq!(resolve_origin(&HeaderMap::new(), peer(), true), "192.0.2.10");
    }
}
