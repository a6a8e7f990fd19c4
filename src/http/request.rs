//! Request identification.
//!
//! # Responsibilities
//! - Assign a request ID as early as possible (tower-http `SetRequestId`)
//! - Echo it back on the response (`PropagateRequestId`)
//! - Resolve the ID for a request inside middleware, generating one if no
//!   upstream layer attached it
//! - Resolve the client address, preferring proxy-supplied headers

use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, HeaderName, Request};
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer assigning a UUID v4 request ID when the client sent none.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID), MakeRequestUuid)
}

/// Layer copying the request ID onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID))
}

/// Access to an upstream-assigned request ID.
pub trait RequestIdExt {
    /// The ID attached by [`set_request_id_layer`], else the raw
    /// `x-request-id` header.
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.extensions()
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok())
            .or_else(|| {
                self.headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
            })
            .filter(|id| !id.is_empty())
    }
}

/// Fresh request ID.
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Upstream ID if present, otherwise a fresh one.
pub fn resolve_request_id<B>(request: &Request<B>) -> String {
    request
        .request_id()
        .map(str::to_owned)
        .unwrap_or_else(generate_request_id)
}

/// Client address headers set by reverse proxies, in order of preference.
pub const REAL_IP_HEADERS: [&str; 3] = ["true-client-ip", "x-real-ip", "x-forwarded-for"];

/// Client IP reported by a proxy. `X-Forwarded-For` contributes its first
/// entry. Values that do not parse as an IP address are ignored.
pub fn real_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let value = REAL_IP_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim())
        .find(|v| !v.is_empty())?;
    value.parse().ok()
}

/// Proxy-reported client IP if present, otherwise the peer address from
/// `ConnectInfo`, otherwise empty.
pub fn resolve_remote_addr<B>(request: &Request<B>) -> String {
    if let Some(ip) = real_ip(request.headers()) {
        return ip.to_string();
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default()
}
