//! Shared helpers for integration tests.

use axum::body::Body;
use axum::http::{Method, Request};
use request_apm::config::ApmConfig;

/// Config that produces an active layer.
pub fn active_config() -> ApmConfig {
    ApmConfig::new("abc", "svc").with_enabled(true)
}

/// A request with a Host header, as a real client would send.
pub fn request(method: Method, path: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header("Host", "api.example.com")
        .body(Body::empty())
        .unwrap()
}

pub fn get(path: &str) -> Request<Body> {
    request(Method::GET, path)
}
