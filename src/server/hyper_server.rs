//! Hyper-based HTTP Server
//!
//! Direct Hyper implementation without routing-framework overhead. Each
//! inbound request suspends once, on the outbound call to the upstream
//! provider, and holds no state of its own.

use std::convert::Infallible;
use std::sync::Arc;

use hyper::body::to_bytes;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use tokio::net::TcpSocket;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::protocol::http::{
    HealthResponse, HttpEmbedRequest, HttpEmbedResponse, HttpErrorResponse,
};
use crate::server::config::ServerConfig;
use crate::upstream::{EmbeddingsClient, UpstreamError};

/// Shared state for the Hyper server
#[derive(Clone)]
struct ServerState {
    embeddings: Arc<EmbeddingsClient>,
    config: Arc<ServerConfig>,
}

/// Start the HTTP server
pub async fn start_http_server(
    config: Arc<ServerConfig>,
    embeddings: Arc<EmbeddingsClient>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bind_address = config.network.http_bind_address.clone();

    info!("🚀 Starting Embedding Proxy HTTP Server");
    info!("📡 Binding to {}", bind_address);

    let state = ServerState { embeddings, config };

    // Create service factory
    let make_svc = make_service_fn(move |_| {
        let state = state.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let state = state.clone();
                handle_request(req, state)
            }))
        }
    });

    // Parse address
    let addr = bind_address.parse()?;

    let socket = TcpSocket::new_v4()?;

    // TCP_NODELAY: Nagle buffers small JSON responses for 40-200ms otherwise
    socket.set_nodelay(true)?;

    // SO_REUSEADDR for faster restart
    socket.set_reuseaddr(true)?;

    socket.bind(addr)?;
    let listener = socket.listen(1024)?;

    let server = Server::from_tcp(listener.into_std()?)?
        .http1_keepalive(true)
        .http1_half_close(false)
        .tcp_nodelay(true)
        .tcp_sleep_on_accept_errors(true)
        .serve(make_svc);

    info!("✅ HTTP server listening on {}", bind_address);
    info!("📍 Endpoints:");
    info!("   POST /embed      - Forward text to the upstream embeddings API");
    info!("   GET  /health     - Health check");
    info!("   GET  /           - Server info");

    server.await?;

    Ok(())
}

/// Main request handler - routing
async fn handle_request(
    req: Request<Body>,
    state: ServerState,
) -> Result<Response<Body>, Infallible> {
    // Manual CORS - minimal overhead
    let origin = req
        .headers()
        .get("origin")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("*")
        .to_string();

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match (&method, path.as_str()) {
        (&Method::POST, "/embed") => handle_embed(req, state).await,
        (&Method::GET, "/health") => handle_health(state).await,
        (&Method::GET, "/") => handle_root(state).await,
        (&Method::OPTIONS, _) => handle_options(),
        _ => handle_not_found(),
    };

    // Add minimal CORS headers
    let mut response = response;
    let headers = response.headers_mut();
    headers.insert("access-control-allow-origin", origin.parse().unwrap());
    headers.insert(
        "access-control-allow-methods",
        "GET, POST, OPTIONS".parse().unwrap(),
    );
    headers.insert("access-control-allow-headers", "content-type".parse().unwrap());

    Ok(response)
}

/// OPTIONS handler for CORS preflight
fn handle_options() -> Response<Body> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Body::empty())
        .unwrap()
}

/// 404 handler
fn handle_not_found() -> Response<Body> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("content-type", "application/json")
        .body(Body::from(r#"{"error":"Not Found"}"#))
        .unwrap()
}

/// Root endpoint - server info
async fn handle_root(state: ServerState) -> Response<Body> {
    let info = serde_json::json!({
        "name": "Embedding Proxy Server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "embed": {
                "method": "POST",
                "path": "/embed",
                "description": "Forward text to the upstream embeddings API"
            },
            "health": {
                "method": "GET",
                "path": "/health",
                "description": "Health check endpoint"
            }
        },
        "model": state.config.upstream.model
    });

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(Body::from(info.to_string()))
        .unwrap()
}

/// Health check endpoint
///
/// Reports readiness without an upstream round trip; a probe must not spend
/// upstream quota.
async fn handle_health(state: ServerState) -> Response<Body> {
    debug!("🏥 Health check requested");

    if state.embeddings.is_available() {
        let response = HealthResponse::healthy(
            state.embeddings.default_model(),
            state.embeddings.model_dimension(),
        );
        json_response(StatusCode::OK, &response)
    } else {
        error!("❌ Health check failed: upstream credential missing");
        let error = HttpErrorResponse::credential_missing(&state.config.upstream.api_key_env);
        json_response(StatusCode::SERVICE_UNAVAILABLE, &error)
    }
}

/// Embedding endpoint - the proxy path
async fn handle_embed(req: Request<Body>, state: ServerState) -> Response<Body> {
    let request_id = Uuid::new_v4();
    let start_time = std::time::Instant::now();

    // Read body - direct, no extractors
    let body_bytes = match to_bytes(req.into_body()).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                &HttpErrorResponse::new("Failed to read request body"),
            );
        }
    };

    // Parse JSON request
    let request: HttpEmbedRequest = match serde_json::from_slice(&body_bytes) {
        Ok(req) => req,
        Err(e) => {
            debug!("❌ Request {} rejected: {}", request_id, e);
            return json_response(StatusCode::BAD_REQUEST, &HttpErrorResponse::invalid_json());
        }
    };

    debug!(
        "📨 Request {} embedding text of length {}",
        request_id,
        request.text.len()
    );

    // One outbound call, suspend until it completes
    let result = state
        .embeddings
        .embed(&request.text, request.model.as_deref())
        .await;

    match result {
        Ok(embedding) => {
            debug!(
                "✅ Request {} produced {} dimensions in {:?}",
                request_id,
                embedding.len(),
                start_time.elapsed()
            );
            json_response(StatusCode::OK, &HttpEmbedResponse::new(embedding))
        }
        Err(e) => {
            error!("❌ Request {} upstream call failed: {}", request_id, e);
            match &e {
                UpstreamError::MissingCredential { env_var } => json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &HttpErrorResponse::credential_missing(env_var),
                ),
                _ => json_response(
                    StatusCode::BAD_GATEWAY,
                    &HttpErrorResponse::upstream_error(e.to_string()),
                ),
            }
        }
    }
}

/// Helper to build JSON responses
fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method as req_method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_state(base_url: &str) -> ServerState {
        let mut config = ServerConfig::default();
        config.upstream.api_key_env = "EMBEDDING_PROXY_TEST_UNSET_KEY".to_string();
        let embeddings = EmbeddingsClient::new(&config.upstream)
            .unwrap()
            .with_api_key("test-key")
            .with_base_url(base_url);
        ServerState {
            embeddings: Arc::new(embeddings),
            config: Arc::new(config),
        }
    }

    fn embed_request(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/embed")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn response_json(response: Response<Body>) -> serde_json::Value {
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn mount_upstream(server: &MockServer) {
        Mock::given(req_method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_json(serde_json::json!({
                "input": "hello",
                "model": "text-embedding-3-small"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [0.1, 0.2, 0.3]}]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_embed_returns_upstream_vector() {
        let upstream = MockServer::start().await;
        mount_upstream(&upstream).await;

        let state = test_state(&upstream.uri());
        let response = handle_embed(embed_request(r#"{"text":"hello"}"#), state).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
        let body = response_json(response).await;
        assert_eq!(body, serde_json::json!({"embedding": [0.1, 0.2, 0.3]}));
    }

    #[tokio::test]
    async fn test_embed_is_idempotent() {
        let upstream = MockServer::start().await;
        mount_upstream(&upstream).await;

        let state = test_state(&upstream.uri());

        let first = handle_embed(embed_request(r#"{"text":"hello"}"#), state.clone()).await;
        let second = handle_embed(embed_request(r#"{"text":"hello"}"#), state).await;

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(
            response_json(first).await,
            response_json(second).await
        );
    }

    #[tokio::test]
    async fn test_embed_rejects_invalid_json() {
        let upstream = MockServer::start().await;
        let state = test_state(&upstream.uri());

        let response = handle_embed(embed_request("this is not json"), state).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_json(response).await;
        assert_eq!(body["code"], "INVALID_JSON");
    }

    #[tokio::test]
    async fn test_embed_rejects_missing_text_field() {
        let upstream = MockServer::start().await;
        let state = test_state(&upstream.uri());

        let response = handle_embed(embed_request(r#"{"input":"hello"}"#), state).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_embed_upstream_failure_is_bad_gateway() {
        let upstream = MockServer::start().await;
        Mock::given(req_method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&upstream)
            .await;

        let state = test_state(&upstream.uri());
        let response = handle_embed(embed_request(r#"{"text":"hello"}"#), state).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = response_json(response).await;
        assert_eq!(body["code"], "UPSTREAM_ERROR");
    }

    #[tokio::test]
    async fn test_embed_upstream_shape_mismatch_is_bad_gateway() {
        let upstream = MockServer::start().await;
        Mock::given(req_method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": {"message": "bad request"}
            })))
            .mount(&upstream)
            .await;

        let state = test_state(&upstream.uri());
        let response = handle_embed(embed_request(r#"{"text":"hello"}"#), state).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_embed_without_credential() {
        let upstream = MockServer::start().await;
        let mut config = ServerConfig::default();
        config.upstream.api_key_env = "EMBEDDING_PROXY_TEST_UNSET_KEY".to_string();
        let embeddings = EmbeddingsClient::new(&config.upstream)
            .unwrap()
            .with_base_url(upstream.uri());
        let state = ServerState {
            embeddings: Arc::new(embeddings),
            config: Arc::new(config),
        };

        let response = handle_embed(embed_request(r#"{"text":"hello"}"#), state).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response_json(response).await;
        assert_eq!(body["code"], "CREDENTIAL_MISSING");
    }

    #[tokio::test]
    async fn test_health_reports_model_and_dimension() {
        let upstream = MockServer::start().await;
        let state = test_state(&upstream.uri());

        let response = handle_health(state).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model"], "text-embedding-3-small");
        assert_eq!(body["embedding_dimension"], 1536);
    }

    #[tokio::test]
    async fn test_health_without_credential_is_unavailable() {
        let mut config = ServerConfig::default();
        config.upstream.api_key_env = "EMBEDDING_PROXY_TEST_UNSET_KEY".to_string();
        let embeddings = EmbeddingsClient::new(&config.upstream).unwrap();
        let state = ServerState {
            embeddings: Arc::new(embeddings),
            config: Arc::new(config),
        };

        let response = handle_health(state).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_routing_and_cors_headers() {
        let upstream = MockServer::start().await;
        mount_upstream(&upstream).await;
        let state = test_state(&upstream.uri());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/embed")
            .header("origin", "http://example.com")
            .body(Body::from(r#"{"text":"hello"}"#))
            .unwrap();
        let response = handle_request(request, state.clone()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "http://example.com"
        );

        let request = Request::builder()
            .method(Method::GET)
            .uri("/nope")
            .body(Body::empty())
            .unwrap();
        let response = handle_request(request, state.clone()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/embed")
            .body(Body::empty())
            .unwrap();
        let response = handle_request(request, state).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_root_reports_configured_model() {
        let upstream = MockServer::start().await;
        let state = test_state(&upstream.uri());

        let response = handle_root(state).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["model"], "text-embedding-3-small");
        assert_eq!(body["endpoints"]["embed"]["path"], "/embed");
    }
}
