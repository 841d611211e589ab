//! Path-prefix reverse proxy

use axum::{
    Json,
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};
use reqwest::{Client, Url};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Upstream for every path under `prefix`
#[derive(Debug, Clone)]
pub struct Route {
    pub prefix: &'static str,
    pub upstream: Url,
}

/// Shared proxy state
#[derive(Clone)]
pub struct ProxyState {
    pub client: Client,
    pub routes: Arc<Vec<Route>>,
    pub max_body_bytes: usize,
}

/// Route whose prefix covers `path` on a segment boundary
pub fn resolve<'a>(routes: &'a [Route], path: &str) -> Option<&'a Route> {
    routes.iter().find(|route| {
        path.strip_prefix(route.prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

const HOP_BY_HOP: &[HeaderName] = &[
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Copy headers minus hop-by-hop ones, `Host` and `Content-Length`
pub fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    // Headers listed in `Connection` are hop-by-hop for this message too
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let dropped = HOP_BY_HOP.contains(name)
            || name == header::HOST
            || name == header::CONTENT_LENGTH
            || name.as_str() == "keep-alive"
            || listed.iter().any(|l| l == name.as_str());
        if !dropped {
            forwarded.append(name.clone(), value.clone());
        }
    }
    forwarded
}

fn bad_gateway(message: &str) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(serde_json::json!({
            "success": false,
            "message": message,
        })),
    )
        .into_response()
}

fn upstream_url(base: &Url, path: &str, query: Option<&str>) -> Url {
    let mut url = base.clone();
    url.set_path(path);
    url.set_query(query);
    url
}

/// Forward a request to the upstream owning its path
pub async fn proxy(State(state): State<ProxyState>, req: Request) -> Response {
    let (parts, body) = req.into_parts();

    let Some(route) = resolve(&state.routes, parts.uri.path()) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let url = upstream_url(&route.upstream, parts.uri.path(), parts.uri.query());

    let body = match to_bytes(body, state.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            warn!("Rejected request body for {}: {}", url, e);
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    debug!("Proxying {} {} to {}", parts.method, parts.uri, url);

    let upstream = state
        .client
        .request(parts.method, url.clone())
        .headers(forwardable_headers(&parts.headers))
        .body(body)
        .send()
        .await;

    let upstream = match upstream {
        Ok(upstream) => upstream,
        Err(e) => {
            error!("Upstream {} unreachable: {}", url, e);
            return bad_gateway("Bad gateway");
        }
    };

    let status = upstream.status();
    let headers = forwardable_headers(upstream.headers());
    let bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed reading response from {}: {}", url, e);
            return bad_gateway("Bad gateway");
        }
    };

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn routes() -> Vec<Route> {
        let users = Url::parse("http://127.0.0.1:5000").unwrap();
        let venues = Url::parse("http://127.0.0.1:3001").unwrap();
        vec![
            Route { prefix: "/api/users", upstream: users.clone() },
            Route { prefix: "/api/auth", upstream: users },
            Route { prefix: "/api/venues", upstream: venues.clone() },
            Route { prefix: "/uploads", upstream: venues },
        ]
    }

    #[test]
    fn test_resolve_on_segment_boundary() {
        let routes = routes();

        assert_eq!(resolve(&routes, "/api/auth/login").map(|r| r.prefix), Some("/api/auth"));
        assert_eq!(resolve(&routes, "/api/venues").map(|r| r.prefix), Some("/api/venues"));
        assert_eq!(
            resolve(&routes, "/uploads/hall.jpg").map(|r| r.upstream.port()),
            Some(Some(3001))
        );
        assert!(resolve(&routes, "/api/venuesx").is_none());
        assert!(resolve(&routes, "/about").is_none());
    }

    #[test]
    fn test_hop_by_hop_headers_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("gateway:10000"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-trace"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-trace", HeaderValue::from_static("1"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("b=2"));

        let forwarded = forwardable_headers(&headers);

        assert!(forwarded.get(header::HOST).is_none());
        assert!(forwarded.get(header::CONNECTION).is_none());
        assert!(forwarded.get("keep-alive").is_none());
        assert!(forwarded.get("x-trace").is_none());
        assert!(forwarded.get(header::TRANSFER_ENCODING).is_none());
        assert!(forwarded.get(header::CONTENT_LENGTH).is_none());
        assert_eq!(forwarded.get(header::AUTHORIZATION).unwrap(), "Bearer t");
        assert_eq!(forwarded.get_all(header::COOKIE).iter().count(), 2);
    }

    #[test]
    fn test_upstream_url_keeps_path_and_query() {
        let base = Url::parse("http://127.0.0.1:3003").unwrap();
        let url = upstream_url(&base, "/api/bookings", Some("status=Pending&page=2"));
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:3003/api/bookings?status=Pending&page=2"
        );
    }
}
