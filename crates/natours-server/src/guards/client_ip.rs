use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use http::request::Parts;

/// Determine the client address used as the rate limit key
///
/// Without trusted proxies the socket peer is authoritative. With `n` trusted
/// hops the `n`-th `X-Forwarded-For` entry from the right is used, so a client
/// cannot pick its own key by prepending entries.
pub fn resolve(parts: &Parts, trusted_hops: Option<usize>) -> Option<IpAddr> {
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let Some(hops) = trusted_hops.filter(|h| *h > 0) else {
        return peer;
    };

    let forwarded: Vec<&str> = parts
        .headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();

    let index = forwarded.len().saturating_sub(hops);
    forwarded
        .get(index)
        .and_then(|entry| entry.parse().ok())
        .or(peer)
}
