//! Axum middleware things
//!

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

pub fn corslayer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        // bearer tokens, not cookies, so any origin is fine
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_origin(Any)
}
