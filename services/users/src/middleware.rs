//! HTTP middleware chain
//!
//! Outermost to innermost: request id, tracing span, client IP, request
//! context (deadline), CORS, OPTIONS short-circuit, panic recovery.

use axum::{
    Json, Router,
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{
        HeaderMap, HeaderName, Method, StatusCode,
        header::{
            ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE,
            ORIGIN,
        },
    },
    middleware::{Next, from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::{
    any::Any,
    net::{IpAddr, SocketAddr},
    time::Duration,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span, error, field::Empty};

use crate::{config::ServerConfig, context::RequestContext};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Resolved address of the calling client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

fn request_id_header() -> HeaderName {
    HeaderName::from_static(REQUEST_ID_HEADER)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Wrap `router` with the full middleware chain
///
/// `Router::layer` wraps everything added so far, so layers are added from
/// the innermost outwards.
pub fn apply(router: Router, config: &ServerConfig) -> Router {
    let x_request_id = request_id_header();

    let mut router = router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn(short_circuit_options));

    if config.cors_enabled {
        router = router
            .layer(cors_layer())
            .layer(from_fn(preflight_no_content));
    }

    router
        .layer(from_fn_with_state(config.request_timeout(), request_context))
        .layer(from_fn(client_ip))
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_span)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
}

fn make_span(req: &Request<Body>) -> Span {
    let request_id = header_str(req.headers(), REQUEST_ID_HEADER).unwrap_or("n/a");

    tracing::info_span!(
        "http_request",
        method = %req.method(),
        uri = %req.uri(),
        request_id = %request_id,
        client_ip = Empty,
    )
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// socket peer when the server runs with connect info
pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
        .or_else(|| header_str(headers, "x-real-ip").and_then(|v| v.trim().parse().ok()))
        .or_else(|| peer.map(|addr| addr.ip()))
}

async fn client_ip(mut req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    if let Some(ip) = resolve_client_ip(req.headers(), peer) {
        Span::current().record("client_ip", tracing::field::display(ip));
        req.extensions_mut().insert(ClientIp(ip));
    }

    next.run(req).await
}

/// Attach a [`RequestContext`] whose deadline bounds every storage call
async fn request_context(
    State(timeout): State<Duration>,
    mut req: Request,
    next: Next,
) -> Response {
    let mut ctx = RequestContext::background().with_timeout(timeout);

    if let Some(request_id) = header_str(req.headers(), REQUEST_ID_HEADER) {
        ctx = ctx.with_request_id(request_id);
    }
    if let Some(ClientIp(ip)) = req.extensions().get::<ClientIp>() {
        ctx = ctx.with_client_ip(*ip);
    }

    req.extensions_mut().insert(ctx);
    next.run(req).await
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([
            Method::POST,
            Method::OPTIONS,
            Method::GET,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([
            CONTENT_TYPE,
            CONTENT_LENGTH,
            ACCEPT_ENCODING,
            HeaderName::from_static("x-csrf-token"),
            AUTHORIZATION,
            ACCEPT,
            ORIGIN,
            CACHE_CONTROL,
            HeaderName::from_static("x-requested-with"),
        ])
}

/// OPTIONS never reaches a route handler
async fn short_circuit_options(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    next.run(req).await
}

/// CorsLayer answers preflights with 200; report them as 204 like any
/// other OPTIONS request
async fn preflight_no_content(req: Request, next: Next) -> Response {
    let preflight = req.method() == Method::OPTIONS;
    let mut response = next.run(req).await;

    if preflight && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    error!(panic = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal Server Error" })),
    )
        .into_response()
}
