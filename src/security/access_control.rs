//! Source address allow-list middleware.
//! Runs before every route, including unknown paths.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::SecurityConfig;
use crate::observability::metrics;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Allow-list of client addresses. Empty allows everyone.
#[derive(Debug, Clone, Default)]
pub struct AccessGuard {
    allowed: HashSet<String>,
    trust_forwarded_for: bool,
}

impl AccessGuard {
    pub fn new<I>(allowed: I, trust_forwarded_for: bool) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            trust_forwarded_for,
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(config.allowed_ips.iter().cloned(), config.trust_forwarded_for)
    }

    /// True when no allow-list is configured.
    pub fn is_open(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Apparent client address: rightmost `X-Forwarded-For` entry when trusted,
    /// otherwise the socket peer IP.
    ///
    /// The rightmost entry is the one written by the proxy in front of us;
    /// anything to its left arrived from the client and can be forged.
    pub fn client_address(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
        let forwarded = self
            .trust_forwarded_for
            .then(|| headers.get(X_FORWARDED_FOR))
            .flatten()
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        forwarded.or_else(|| peer.map(|addr| addr.ip().to_string()))
    }

    pub fn is_allowed(&self, address: Option<&str>) -> bool {
        self.is_open() || address.is_some_and(|a| self.allowed.contains(a))
    }
}

pub async fn access_control_middleware(
    State(guard): State<Arc<AccessGuard>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if guard.is_open() {
        return next.run(request).await;
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = guard.client_address(request.headers(), peer);

    if guard.is_allowed(client.as_deref()) {
        next.run(request).await
    } else {
        let client = client.as_deref().unwrap_or("unknown");
        tracing::warn!(client = %client, path = %request.uri().path(), "Insecure access blocked");
        metrics::record_access_denied();
        StatusCode::FORBIDDEN.into_response()
    }
}
