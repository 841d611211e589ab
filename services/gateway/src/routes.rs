//! Gateway router

use axum::{Json, Router, response::IntoResponse, routing::{any, get}};
use std::path::Path;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::proxy::{ProxyState, proxy};

/// Proxy every route prefix and serve the frontend for everything else
pub fn create_router(state: ProxyState, frontend_dir: &Path) -> Router {
    let frontend = ServeDir::new(frontend_dir)
        .fallback(ServeFile::new(frontend_dir.join("index.html")));

    let mut router = Router::new().route("/health", get(health_check));
    for route in state.routes.iter() {
        router = router
            .route(route.prefix, any(proxy))
            .route(&format!("{}/*rest", route.prefix), any(proxy));
    }

    router
        .fallback_service(frontend)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "gateway"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        extract::Request,
        http::{HeaderMap, StatusCode},
        response::Response,
    };
    use reqwest::{Client, Url};
    use std::{path::PathBuf, sync::Arc};
    use tokio::net::TcpListener;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::proxy::Route;

    /// Echoes method, path, query and a few headers back as JSON
    async fn spawn_echo_backend() -> Url {
        async fn echo(req: Request) -> Json<serde_json::Value> {
            let header = |headers: &HeaderMap, name: &str| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            let headers = req.headers().clone();
            let method = req.method().to_string();
            let path = req.uri().path().to_string();
            let query = req.uri().query().map(str::to_string);
            let body = to_bytes(req.into_body(), usize::MAX).await.unwrap();

            Json(serde_json::json!({
                "method": method,
                "path": path,
                "query": query,
                "host": header(&headers, "host"),
                "authorization": header(&headers, "authorization"),
                "x-trace": header(&headers, "x-trace"),
                "body": String::from_utf8_lossy(&body),
            }))
        }

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, Router::new().fallback(echo)).await.unwrap();
        });

        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn gateway(upstream: Url, frontend_dir: &Path) -> Router {
        let state = ProxyState {
            client: Client::new(),
            routes: Arc::new(vec![
                Route { prefix: "/api/bookings", upstream: upstream.clone() },
                Route { prefix: "/uploads", upstream },
            ]),
            max_body_bytes: 1024 * 1024,
        };
        create_router(state, frontend_dir)
    }

    async fn frontend_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gateway-frontend-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(dir.join("assets")).await.unwrap();
        tokio::fs::write(dir.join("index.html"), "<html>app</html>").await.unwrap();
        tokio::fs::write(dir.join("assets/app.js"), "console.log(1)").await.unwrap();
        dir
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_forwards_request() {
        let upstream = spawn_echo_backend().await;
        let dir = frontend_dir().await;
        let app = gateway(upstream.clone(), &dir);

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/bookings/42/status?dry=1")
                    .header("Host", "gateway.example.com")
                    .header("Authorization", "Bearer abc")
                    .header("Connection", "x-trace")
                    .header("x-trace", "1")
                    .body(Body::from(r#"{"status":"Confirmed"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let echoed: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(echoed["method"], "PUT");
        assert_eq!(echoed["path"], "/api/bookings/42/status");
        assert_eq!(echoed["query"], "dry=1");
        assert_eq!(
            echoed["host"],
            format!("127.0.0.1:{}", upstream.port().unwrap())
        );
        assert_eq!(echoed["authorization"], "Bearer abc");
        assert_eq!(echoed["x-trace"], serde_json::Value::Null);
        assert_eq!(echoed["body"], r#"{"status":"Confirmed"}"#);

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_bad_gateway() {
        let dir = frontend_dir().await;
        let app = gateway(Url::parse("http://127.0.0.1:1").unwrap(), &dir);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/bookings")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_static_files_and_spa_fallback() {
        let dir = frontend_dir().await;
        let app = gateway(Url::parse("http://127.0.0.1:1").unwrap(), &dir);

        let asset = app
            .clone()
            .oneshot(Request::builder().uri("/assets/app.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(asset.status(), StatusCode::OK);
        assert_eq!(body_text(asset).await, "console.log(1)");

        let deep_link = app
            .oneshot(Request::builder().uri("/venues/grand-hall").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(deep_link.status(), StatusCode::OK);
        assert_eq!(body_text(deep_link).await, "<html>app</html>");

        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
