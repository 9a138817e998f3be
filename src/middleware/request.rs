//! Request metadata extraction.
//!
//! # Design Decisions
//! - Host comes from the `Host` header, falling back to the URI authority
//! - Origin-form URIs are made absolute with the configured transport scheme
//! - A missing or unusable host still yields a URL built from the path and
//!   query alone; only an unparseable path and query skips instrumentation

use axum::extract::MatchedPath;
use axum::http::{header, Request, Uri};
use url::Url;

use crate::backend::WebRequest;
use crate::config::TransportKind;

/// Placeholder authority for URLs of requests without a usable host.
const FALLBACK_HOST: &str = "localhost";

/// Transaction name: `"<METHOD> <PATH>"`.
///
/// Uses the raw request path unless `route_template` is set and axum matched
/// a route, in which case the route template (`/users/{id}`) is used.
pub fn transaction_name<B>(req: &Request<B>, route_template: bool) -> String {
    let template = if route_template {
        req.extensions().get::<MatchedPath>().map(|matched| matched.as_str())
    } else {
        None
    };
    let path = template.unwrap_or_else(|| req.uri().path());
    format!("{} {}", req.method(), path)
}

/// Host the client addressed, without validation.
pub fn request_host<B>(req: &Request<B>) -> String {
    req.headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().authority().map(|a| a.to_string()))
        .unwrap_or_default()
}

/// Build the request metadata, or fail if the path and query do not parse.
pub fn web_request<B>(req: &Request<B>, transport: TransportKind) -> Result<WebRequest, url::ParseError> {
    let host = request_host(req);
    let url = match absolute_url(req.uri(), &host, transport) {
        Some(url) => url,
        None => path_url(req.uri(), transport)?,
    };

    Ok(WebRequest {
        url,
        method: req.method().clone(),
        transport,
        host,
    })
}

fn absolute_url(uri: &Uri, host: &str, transport: TransportKind) -> Option<Url> {
    if uri.scheme().is_some() {
        return Url::parse(&uri.to_string()).ok();
    }
    if host.is_empty() {
        return None;
    }
    Url::parse(&format!("{}://{}{}", transport.scheme(), host, path_and_query(uri))).ok()
}

fn path_url(uri: &Uri, transport: TransportKind) -> Result<Url, url::ParseError> {
    Url::parse(&format!("{}://{}", transport.scheme(), FALLBACK_HOST))?.join(path_and_query(uri))
}

fn path_and_query(uri: &Uri) -> &str {
    uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Method;

    #[test]
    fn test_transaction_name_uses_path() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/orders?id=7")
            .body(Body::empty())
            .unwrap();
        assert_eq!(transaction_name(&req, false), "POST /orders");
        assert_eq!(transaction_name(&req, true), "POST /orders");
    }

    #[test]
    fn test_origin_form_url() {
        let req = Request::builder()
            .uri("/health?verbose=1")
            .header("Host", "api.example.com:8443")
            .body(Body::empty())
            .unwrap();

        let meta = web_request(&req, TransportKind::Https).unwrap();
        assert_eq!(meta.url.as_str(), "https://api.example.com:8443/health?verbose=1");
        assert_eq!(meta.host, "api.example.com:8443");
        assert_eq!(meta.method, Method::GET);
        assert_eq!(meta.transport, TransportKind::Https);
    }

    #[test]
    fn test_absolute_form_url() {
        let req = Request::builder()
            .uri("http://example.com/a/b")
            .body(Body::empty())
            .unwrap();

        let meta = web_request(&req, TransportKind::Http).unwrap();
        assert_eq!(meta.url.as_str(), "http://example.com/a/b");
        assert_eq!(meta.host, "example.com");
    }

    #[test]
    fn test_missing_host_uses_path_and_query() {
        let req = Request::builder().uri("/health?x=1").body(Body::empty()).unwrap();

        let meta = web_request(&req, TransportKind::Http).unwrap();
        assert_eq!(meta.host, "");
        assert_eq!(meta.url.path(), "/health");
        assert_eq!(meta.url.query(), Some("x=1"));
    }

    #[test]
    fn test_malformed_host_uses_path_and_query() {
        let req = Request::builder()
            .uri("/health")
            .header("Host", "bad host")
            .body(Body::empty())
            .unwrap();

        let meta = web_request(&req, TransportKind::Https).unwrap();
        assert_eq!(meta.host, "bad host");
        assert_eq!(meta.url.scheme(), "https");
        assert_eq!(meta.url.path(), "/health");
    }
}
