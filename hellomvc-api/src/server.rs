//! HTTP Server

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use hellomvc_core::config::HelloMvcConfig;
use hellomvc_core::server::{execute_handler, HandlerResponse, RouteMatch, Router};
use hellomvc_core::{Error, Result};

/// State shared by every connection
pub struct AppState {
    router: Router,
    body_limit: usize,
}

impl AppState {
    /// Create state from a router and a body size limit in bytes
    pub fn new(router: Router, body_limit: usize) -> Self {
        Self { router, body_limit }
    }

    /// Build state from configuration
    pub fn from_config(config: &HelloMvcConfig) -> Self {
        let body_limit = usize::try_from(config.server.client_max_body_size).unwrap_or(usize::MAX);
        Self::new(Router::new(config.effective_routes()), body_limit)
    }
}

/// Bind the configured address and serve until the process exits
pub async fn run_server(config: &HelloMvcConfig) -> Result<()> {
    let addr = config.server.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Server(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("🚀 hellomvc listening on http://{}", addr);
    serve(listener, Arc::new(AppState::from_config(config))).await
}

/// Accept connections on `listener` and serve each on its own task
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    for route in state.router.routes() {
        tracing::info!("   📍 {} {:?}", route.path, route.handler);
    }

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Accept error: {}", e);
                continue;
            }
        };

        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .serve_connection(io, service_fn(move |req| handle_request(req, state.clone())))
                .await
            {
                tracing::error!("Error serving connection from {}: {:?}", peer, err);
            }
        });
    }
}

/// Route a request, bind its body and run the handler
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = dispatch(req, &state).await;

    tracing::debug!(
        "{} {} -> {} ({:?})",
        method,
        path,
        response.status.as_u16(),
        start.elapsed()
    );
    Ok(into_hyper(response))
}

async fn dispatch<B>(req: Request<B>, state: &AppState) -> HandlerResponse
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let route = match state.router.match_request(req.uri().path(), req.method().as_str()) {
        RouteMatch::Found(route) => route,
        RouteMatch::MethodNotAllowed(allowed) => return HandlerResponse::method_not_allowed(&allowed),
        RouteMatch::NotFound => return HandlerResponse::not_found(),
    };

    let (parts, body) = req.into_parts();
    let body = match Limited::new(body, state.body_limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            tracing::warn!("{} {}: body exceeds {} bytes", parts.method, parts.uri.path(), state.body_limit);
            return HandlerResponse::payload_too_large();
        }
        Err(e) => {
            tracing::warn!("{} {}: failed to read body: {}", parts.method, parts.uri.path(), e);
            return HandlerResponse::bad_request("failed to read request body");
        }
    };

    match execute_handler(&route.config.handler, &parts.headers, body) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("{} {} failed: {}", parts.method, parts.uri.path(), e);
            e.into_response()
        }
    }
}

fn into_hyper(response: HandlerResponse) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(response.status);
    for (name, value) in &response.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    builder
        .body(Full::new(response.body.unwrap_or_default()))
        .unwrap_or_else(|e| {
            tracing::error!("Failed to build response: {}", e);
            let mut fallback = Response::new(Full::new(Bytes::from_static(b"Internal Server Error")));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::{ALLOW, CONTENT_TYPE};

    fn state() -> Arc<AppState> {
        Arc::new(AppState::from_config(&HelloMvcConfig::default()))
    }

    fn post(uri: &str, content_type: Option<&str>, body: &'static str) -> Request<Full<Bytes>> {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder.body(Full::new(Bytes::from(body))).unwrap()
    }

    async fn send(req: Request<Full<Bytes>>, state: Arc<AppState>) -> (StatusCode, hyper::HeaderMap, String) {
        let response = handle_request(req, state).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    const HELLO: &str = r#"{"username":"hello","age":20}"#;

    #[tokio::test]
    async fn test_variants_acknowledge() {
        for v in 1..=4 {
            let uri = format!("/request-body-json-v{}", v);
            let (status, _, body) = send(post(&uri, Some("application/json"), HELLO), state()).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert_eq!(body, "ok", "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_v5_echoes_record() {
        let (status, headers, body) =
            send(post("/request-body-json-v5", Some("application/json"), HELLO), state()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        let echoed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(echoed["username"], "hello");
        assert_eq!(echoed["age"], 20);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        for v in 1..=5 {
            let uri = format!("/request-body-json-v{}", v);
            let (status, _, _) = send(post(&uri, Some("application/json"), r#"{"username":"#), state()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_missing_age_is_accepted() {
        let (status, _, body) = send(
            post("/request-body-json-v5", Some("application/json"), r#"{"username":"hello"}"#),
            state(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"username":"hello","age":0}"#);
    }

    #[tokio::test]
    async fn test_record_binding_without_json_content_type() {
        let (status, _, _) = send(post("/request-body-json-v3", Some("text/plain"), HELLO), state()).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let (status, _, body) = send(post("/request-body-json-v2", Some("text/plain"), HELLO), state()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");

        let (status, _, _) = send(post("/request-body-json-v1", None, HELLO), state()).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let state = Arc::new(AppState::new(Router::default(), 8));
        let (status, _, _) = send(post("/request-body-json-v3", Some("application/json"), HELLO), state).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_unknown_route_and_wrong_method() {
        let (status, _, _) = send(post("/nope", Some("application/json"), HELLO), state()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let req = Request::builder()
            .method("GET")
            .uri("/request-body-json-v1")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let (status, headers, _) = send(req, state()).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(headers.get(ALLOW).unwrap(), "POST");
    }

    #[tokio::test]
    async fn test_health() {
        let req = Request::builder().uri("/health").body(Full::new(Bytes::new())).unwrap();
        let (status, _, body) = send(req, state()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"healthy"}"#);
    }

    #[tokio::test]
    async fn test_serve_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, state()));

        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://{}/request-body-json-v5", addr))
            .json(&serde_json::json!({"username": "hello", "age": 20}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), HELLO);
    }
}
