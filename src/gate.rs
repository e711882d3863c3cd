//! Edge gate in front of the backend proxy namespace.
//!
//! Every request passes through [`edge_gate`]. Requests under [`BACKEND_PREFIX`]
//! need the passcode cookie; with it they are rewritten onto the configured
//! upstream base URL and forwarded with the server-side API key attached.
//! The browser only ever sees the same-origin `/backend/...` URL.

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use url::Url;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const BACKEND_PREFIX: &str = "/backend";
pub const API_KEY_HEADER: &str = "x-api-key";

/// Largest request body the gate buffers before forwarding.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// A request already rewritten for the upstream.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, Clone)]
pub struct ForwardResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Transport used to reach the upstream API.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn forward(&self, request: ForwardRequest) -> AppResult<ForwardResponse>;
}

/// Returns the path remainder for `/backend` and `/backend/...`, `None` otherwise.
pub fn strip_backend_prefix(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(BACKEND_PREFIX)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// `base + rest + ?query`, without doubling the slash between base and rest.
pub fn rewrite_target(base: &str, rest: &str, query: Option<&str>) -> AppResult<Url> {
    let mut target = format!("{}{}", base.trim_end_matches('/'), rest);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(query);
    }
    Url::parse(&target)
        .map_err(|e| AppError::Configuration(format!("invalid upstream URL {}: {}", target, e)))
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Copy client headers for the upstream, dropping `Host`, hop-by-hop headers
/// and any client-supplied API key, then attach the server's key.
pub fn upstream_headers(incoming: &HeaderMap, api_key: &str) -> AppResult<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(incoming.len() + 1);
    for (name, value) in incoming {
        if name == header::HOST
            || name == header::CONTENT_LENGTH
            || name.as_str() == API_KEY_HEADER
            || is_hop_by_hop(name)
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    let key = HeaderValue::from_str(api_key)
        .map_err(|_| AppError::Configuration("API_KEY is not a valid header value".into()))?;
    headers.insert(HeaderName::from_static(API_KEY_HEADER), key);
    Ok(headers)
}

/// Middleware: gate and rewrite `/backend` calls, pass everything else through.
pub async fn edge_gate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(rest) = strip_backend_prefix(req.uri().path()).map(str::to_owned) else {
        return next.run(req).await;
    };

    if !state.cookie.is_present(req.headers()) {
        tracing::debug!("Rejected {} without passcode cookie", req.uri().path());
        return AppError::Unauthorized.into_response();
    }

    match proxy(&state, &rest, req).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn proxy(state: &AppState, rest: &str, req: Request) -> AppResult<Response> {
    let (parts, body) = req.into_parts();

    let url = rewrite_target(&state.config.upstream.base_url, rest, parts.uri.query())?;
    let headers = upstream_headers(&parts.headers, &state.config.upstream.api_key)?;
    let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| AppError::BadRequest("Invalid request body".into()))?;

    tracing::debug!("Forwarding {} {}", parts.method, url.path());

    let upstream = state
        .upstream
        .forward(ForwardRequest {
            method: parts.method,
            url,
            headers,
            body,
        })
        .await?;

    Ok(into_response(upstream))
}

fn into_response(upstream: ForwardResponse) -> Response {
    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;

    let headers = response.headers_mut();
    for (name, value) in &upstream.headers {
        if name == header::CONTENT_LENGTH || is_hop_by_hop(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    response
}
