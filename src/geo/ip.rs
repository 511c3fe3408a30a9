//! Client IP extraction and classification
//!
//! The service usually sits behind a CDN or reverse proxy, so the real
//! client address arrives in headers. Extraction prefers, in order:
//! `CF-Connecting-IP`, `X-Real-IP`, the first entry of `X-Forwarded-For`,
//! then the socket address, then loopback.

use axum::http::HeaderMap;
use ipnet::Ipv6Net;
use std::net::IpAddr;
use std::sync::LazyLock;

static ULA_NET: LazyLock<Ipv6Net> = LazyLock::new(|| "fc00::/7".parse().unwrap());
static LINK_LOCAL_NET: LazyLock<Ipv6Net> = LazyLock::new(|| "fe80::/10".parse().unwrap());

/// Extract the client IP as a string, stripping any IPv6-mapped-IPv4
/// prefix (`::ffff:1.2.3.4` → `1.2.3.4`).
pub fn extract_client_ip(headers: &HeaderMap, socket_addr: Option<IpAddr>) -> String {
    let from_headers = header_value(headers, "cf-connecting-ip")
        .or_else(|| header_value(headers, "x-real-ip"))
        .or_else(|| forwarded_for_first(headers));

    let ip = from_headers
        .or_else(|| socket_addr.map(|addr| addr.to_string()))
        .unwrap_or_else(|| "127.0.0.1".to_string());

    strip_mapped_prefix(&ip).to_string()
}

/// True when `ip` parses as an IPv4 or IPv6 address.
pub fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}

/// True for addresses that no public geolocation provider can resolve:
/// RFC 1918 ranges, loopback, link-local, and their IPv6 equivalents.
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => {
            v6.is_loopback() || ULA_NET.contains(&v6) || LINK_LOCAL_NET.contains(&v6)
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn forwarded_for_first(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn strip_mapped_prefix(ip: &str) -> &str {
    ip.strip_prefix("::ffff:").unwrap_or(ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn socket() -> Option<IpAddr> {
        Some("198.51.100.7".parse().unwrap())
    }

    #[test]
    fn test_cloudflare_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", HeaderValue::from_static("203.0.113.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.2"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.3"));

        assert_eq!(extract_client_ip(&headers, socket()), "203.0.113.1");
    }

    #[test]
    fn test_real_ip_over_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.2"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.3"));

        assert_eq!(extract_client_ip(&headers, socket()), "203.0.113.2");
    }

    #[test]
    fn test_forwarded_for_uses_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.3, 198.51.100.1, 10.0.0.1"),
        );

        assert_eq!(extract_client_ip(&headers, socket()), "203.0.113.3");
    }

    #[test]
    fn test_socket_address_fallback() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers, socket()), "198.51.100.7");
    }

    #[test]
    fn test_loopback_when_nothing_known() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers, None), "127.0.0.1");
    }

    #[test]
    fn test_mapped_ipv4_prefix_is_stripped() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("::ffff:203.0.113.4"));
        assert_eq!(extract_client_ip(&headers, socket()), "203.0.113.4");
    }

    #[test]
    fn test_private_ranges() {
        for ip in [
            "10.1.2.3",
            "172.16.0.1",
            "172.31.255.255",
            "192.168.1.10",
            "127.0.0.1",
            "169.254.0.5",
            "::1",
            "fc00::1",
            "fd12:3456::1",
            "fe80::1",
        ] {
            assert!(is_private_ip(ip.parse().unwrap()), "{ip} should be private");
        }
    }

    #[test]
    fn test_public_ranges() {
        for ip in ["8.8.8.8", "203.0.113.1", "172.32.0.1", "2001:4860:4860::8888"] {
            assert!(!is_private_ip(ip.parse().unwrap()), "{ip} should be public");
        }
    }

    #[test]
    fn test_ip_validation() {
        assert!(is_valid_ip("203.0.113.1"));
        assert!(is_valid_ip("2001:db8::1"));
        assert!(!is_valid_ip("not-an-ip"));
        assert!(!is_valid_ip("999.1.1.1"));
        assert!(!is_valid_ip(""));
    }
}
