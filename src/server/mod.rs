use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::chat::Assistant;
use crate::errors::GenerationError;
use crate::fallback;
use crate::generate::Generator;
use crate::wire::{AppType, ChatRequest, ErrorBody, GenerateResponse, GenerationRequest};

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<Generator>,
    pub assistant: Arc<Assistant>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/generate", post(generate_handler))
        .route("/api/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("HTTP server listening on: http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn generate_handler(
    State(state): State<AppState>,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!("rejected generate body: {rejection}");
            let err = GenerationError::BadRequest(format!("Invalid request body: {}", rejection.body_text()));
            let resp = GenerateResponse::failure(err.user_message(), fallback::project("", AppType::General));
            return (status(err.http_status()), Json(resp)).into_response();
        }
    };

    let outcome = state.generator.generate(&req).await;
    (status(outcome.http_status()), Json(outcome.response())).into_response()
}

async fn chat_handler(State(state): State<AppState>, body: Result<Json<ChatRequest>, JsonRejection>) -> Response {
    let result = match body {
        Ok(Json(req)) => state.assistant.reply(&req).await,
        Err(rejection) => Err(GenerationError::BadRequest(format!(
            "Invalid request body: {}",
            rejection.body_text()
        ))),
    };

    match result {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => {
            warn!(error = %e, "chat failed");
            let body = ErrorBody { error: e.user_message(), details: e.to_string() };
            (status(e.http_status()), Json(body)).into_response()
        }
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompletionSettings;
    use crate::errors::CompletionError;
    use crate::generate::tests::{full_completion, ScriptedProvider};
    use crate::provider::DynProvider;
    use crate::retry::RetryPolicy;
    use crate::validate::ValidationRules;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(provider: DynProvider) -> Router {
        router(AppState {
            generator: Arc::new(Generator::new(
                provider.clone(),
                CompletionSettings::generation(),
                RetryPolicy::disabled(),
                ValidationRules::default(),
            )),
            assistant: Arc::new(Assistant::new(provider, CompletionSettings::chat(), RetryPolicy::disabled())),
        })
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_version() {
        let resp = app(ScriptedProvider::replying("x"))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = read_json(resp).await;
        assert_eq!(v["status"], "ok");
        assert_eq!(v["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn rate_limited_generation_returns_429_with_fallback() {
        let resp = app(ScriptedProvider::failing(CompletionError::RateLimited))
            .oneshot(post_json("/api/generate", r#"{"description":"todo app","app_type":"productivity"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let v = read_json(resp).await;
        assert_eq!(v["success"], false);
        assert_eq!(v["error"], "Usage limit reached. Please try again later.");
        assert!(v["project"]["files"]["lib/main.dart"].is_string());
        assert_eq!(v["project"]["app_type"], "productivity");
    }

    #[tokio::test]
    async fn successful_generation_returns_project() {
        let resp = app(ScriptedProvider::replying(&full_completion()))
            .oneshot(post_json("/api/generate", r#"{"description":"An app called ShopEasy","app_type":"ecommerce"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = read_json(resp).await;
        assert_eq!(v["success"], true);
        assert_eq!(v["project"]["name"], "ShopEasy");
        assert!(v["project"]["files"]["lib/screens/cart_screen.dart"].is_string());
        assert!(v.as_object().unwrap().contains_key("usage"));
        assert!(v["usage"].is_null());
    }

    #[tokio::test]
    async fn stub_completion_is_unprocessable_with_fallback() {
        let resp = app(ScriptedProvider::replying("```\nok\n```"))
            .oneshot(post_json("/api/generate", r#"{"description":"أريد إنشاء تطبيق متجر إلكتروني","app_type":"ecommerce"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let v = read_json(resp).await;
        assert_eq!(v["success"], false);
        assert!(v["error"].is_string());
        assert_eq!(v["project"]["quality_score"], 40);
    }

    #[tokio::test]
    async fn malformed_body_still_gets_a_project() {
        let resp = app(ScriptedProvider::replying("x"))
            .oneshot(post_json("/api/generate", "{not json"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let v = read_json(resp).await;
        assert_eq!(v["success"], false);
        assert_eq!(v["project"]["name"], "flutter_app");
    }

    #[tokio::test]
    async fn chat_round_trip_and_errors() {
        let ok = app(ScriptedProvider::replying("hi there"))
            .oneshot(post_json("/api/chat", r#"{"messages":[{"role":"user","content":"hello"}]}"#))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(read_json(ok).await["content"], "hi there");

        let empty = app(ScriptedProvider::replying("unused"))
            .oneshot(post_json("/api/chat", r#"{"messages":[]}"#))
            .await
            .unwrap();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
        let v = read_json(empty).await;
        assert!(v["error"].is_string());
        assert!(v["details"].is_string());

        let missing = app(ScriptedProvider::failing(CompletionError::MissingCredential))
            .oneshot(post_json("/api/chat", r#"{"messages":[{"role":"user","content":"hello"}]}"#))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn cors_preflight_is_allowed() {
        let resp = app(ScriptedProvider::replying("x"))
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/generate")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
