//! Reverse proxy to the diagnostics service.
//!
//! # Responsibilities
//! - Rewrite scheme and authority of the request URI to the diagnostics origin
//! - Leave method, path, query, body and Host untouched
//! - Mark loopback callers with the local marker header
//! - Strip hop-by-hop headers both ways, append X-Forwarded-For
//!
//! # Design Decisions
//! - Bodies are streamed, never buffered
//! - Origin responses (including errors) are passed through as-is
//! - Only an unreachable origin produces a response of our own (502)

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    http::{
        header,
        uri::{Authority, InvalidUriParts, PathAndQuery, Scheme},
        HeaderMap, HeaderName, HeaderValue, Request, StatusCode, Uri, Version,
    },
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::config::DiagConfig;
use crate::observability::metrics;

/// Value of the local marker header for loopback callers.
pub const LOCAL_MARKER_VALUE: &str = "127.0.0.1";

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Headers that only apply to a single transport hop.
const HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Errors building the proxy from configuration.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid diagnostics origin `{origin}`: {reason}")]
    InvalidOrigin { origin: String, reason: String },

    #[error("invalid local marker header: {0}")]
    InvalidMarkerHeader(#[from] header::InvalidHeaderName),
}

/// Forwards requests to the diagnostics origin.
pub struct DiagProxy {
    scheme: Scheme,
    authority: Authority,
    local_marker: HeaderName,
    client: Client<HttpConnector, Body>,
}

impl DiagProxy {
    pub fn new(config: &DiagConfig) -> Result<Self, ProxyError> {
        let invalid = |reason: &str| ProxyError::InvalidOrigin {
            origin: config.origin.clone(),
            reason: reason.to_string(),
        };

        let origin: Uri = config
            .origin
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| invalid(&e.to_string()))?;
        let scheme = origin.scheme().cloned().ok_or_else(|| invalid("missing scheme"))?;
        let authority = origin
            .authority()
            .cloned()
            .ok_or_else(|| invalid("missing host"))?;
        let local_marker = HeaderName::from_bytes(config.local_marker_header.as_bytes())?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            scheme,
            authority,
            local_marker,
            client,
        })
    }

    /// Forward one request from `peer` and return the origin's response.
    pub async fn forward(&self, peer: SocketAddr, request: Request<Body>) -> Response {
        let (mut parts, body) = request.into_parts();

        parts.uri = match self.rewrite_uri(&parts.uri) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::warn!(uri = %parts.uri, error = %e, "Cannot rewrite request URI");
                return (StatusCode::BAD_REQUEST, "Bad request URI\n").into_response();
            }
        };
        // The origin is always spoken to over HTTP/1.1.
        parts.version = Version::HTTP_11;

        strip_hop_by_hop(&mut parts.headers);
        append_forwarded_for(&mut parts.headers, peer.ip());

        if is_loopback(&peer) {
            parts.headers.insert(
                self.local_marker.clone(),
                HeaderValue::from_static(LOCAL_MARKER_VALUE),
            );
        } else {
            // Remote callers must not be able to claim to be local.
            parts.headers.remove(&self.local_marker);
        }

        tracing::debug!(
            method = %parts.method,
            uri = %parts.uri,
            peer = %peer,
            "Forwarding to diagnostics origin"
        );

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => {
                let (mut parts, body) = response.into_parts();
                strip_hop_by_hop(&mut parts.headers);
                metrics::record_diag_request(parts.status.as_u16());
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::warn!(error = %e, origin = %self.authority, "Diagnostics origin unreachable");
                metrics::record_diag_request(StatusCode::BAD_GATEWAY.as_u16());
                (StatusCode::BAD_GATEWAY, "Upstream request failed\n").into_response()
            }
        }
    }

    fn rewrite_uri(&self, uri: &Uri) -> Result<Uri, InvalidUriParts> {
        let mut uri_parts = uri.clone().into_parts();
        uri_parts.scheme = Some(self.scheme.clone());
        uri_parts.authority = Some(self.authority.clone());
        if uri_parts.path_and_query.is_none() {
            uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        Uri::from_parts(uri_parts)
    }
}

/// True for 127.0.0.0/8, ::1 and IPv4-mapped loopback.
pub fn is_loopback(addr: &SocketAddr) -> bool {
    match addr.ip() {
        IpAddr::V4(ip) => ip.is_loopback(),
        IpAddr::V6(ip) => {
            ip.is_loopback() || ip.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback())
        }
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Headers named in Connection are hop-by-hop too.
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, ip: IpAddr) {
    let prior: Vec<&str> = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    let value = if prior.is_empty() {
        ip.to_string()
    } else {
        format!("{}, {}", prior.join(", "), ip)
    };

    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
