//! Client address and user agent of the caller.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header::USER_AGENT, request::Parts, HeaderMap},
};

use crate::api::AppState;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Who is calling, as far as the request tells.
///
/// The address is the socket peer. When that peer is a trusted proxy,
/// `X-Forwarded-For` (first hop) and then `X-Real-IP` take precedence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn from_parts(headers: &HeaderMap, peer: Option<SocketAddr>, trusted_proxies: &[IpAddr]) -> Self {
        let peer_ip = peer.map(|addr| addr.ip());
        let behind_proxy = peer_ip.is_some_and(|ip| trusted_proxies.contains(&ip));

        let forwarded = behind_proxy
            .then(|| forwarded_ip(headers))
            .flatten();

        Self {
            ip_address: forwarded.or_else(|| peer_ip.map(|ip| ip.to_string())),
            user_agent: header_str(headers, USER_AGENT.as_str()).map(str::to_string),
        }
    }
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    header_str(headers, X_FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .or_else(|| header_str(headers, X_REAL_IP))
        .map(str::trim)
        .filter(|v| v.parse::<IpAddr>().is_ok())
        .map(str::to_string)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[async_trait]
impl FromRequestParts<AppState> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self::from_parts(&parts.headers, peer, &state.config.trusted_proxies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn proxied_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("10.0.0.1, 172.16.0.1"));
        headers.insert(X_REAL_IP, HeaderValue::from_static("10.0.0.2"));
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8"));
        headers
    }

    #[test]
    fn test_trusted_proxy_forwards_client() {
        let proxy: IpAddr = "127.0.0.1".parse().unwrap();
        let info = ClientInfo::from_parts(&proxied_headers(), Some("127.0.0.1:9000".parse().unwrap()), &[proxy]);
        assert_eq!(info.ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(info.user_agent.as_deref(), Some("curl/8"));

        let mut headers = HeaderMap::new();
        headers.insert(X_REAL_IP, HeaderValue::from_static("10.0.0.2"));
        let info = ClientInfo::from_parts(&headers, Some("127.0.0.1:9000".parse().unwrap()), &[proxy]);
        assert_eq!(info.ip_address.as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn test_untrusted_peer_cannot_spoof_address() {
        let peer = Some("203.0.113.7:51000".parse().unwrap());
        let info = ClientInfo::from_parts(&proxied_headers(), peer, &[]);
        assert_eq!(info.ip_address.as_deref(), Some("203.0.113.7"));

        let other_proxy: IpAddr = "127.0.0.1".parse().unwrap();
        let info = ClientInfo::from_parts(&proxied_headers(), peer, &[other_proxy]);
        assert_eq!(info.ip_address.as_deref(), Some("203.0.113.7"));

        // Without a socket peer nothing vouches for the headers
        let info = ClientInfo::from_parts(&proxied_headers(), None, &[other_proxy]);
        assert_eq!(info.ip_address, None);
    }

    #[test]
    fn test_garbage_forwarded_value_ignored() {
        let proxy: IpAddr = "127.0.0.1".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("not-an-ip"));
        let info = ClientInfo::from_parts(&headers, Some("127.0.0.1:9000".parse().unwrap()), &[proxy]);
        assert_eq!(info.ip_address.as_deref(), Some("127.0.0.1"));
        assert_eq!(ClientInfo::from_parts(&HeaderMap::new(), None, &[]), ClientInfo::default());
    }
}
