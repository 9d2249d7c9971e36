pub mod deployments;
pub mod types;

use std::{future::ready, sync::Arc};

use axum::{
    Router,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use secrecy::ExposeSecret;
use tower_http::trace::TraceLayer;

use crate::{Config, orchestrator::DeploymentManager, slack_client::SlackWebhookClient};

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<DeploymentManager>,
    pub config: Arc<Config>,
    pub notifier: Option<SlackWebhookClient>,
}

async fn healthz() -> &'static str {
    "ok"
}

/// Create router for all API endpoints
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/providers", get(deployments::list_providers))
        .route(
            "/deployments",
            get(deployments::list_deployments).post(deployments::create_deployment),
        )
        .route("/deployments/{id}", get(deployments::get_deployment))
        .route("/deployments/{id}/cancel", post(deployments::cancel_deployment))
        .route(
            "/deployments/{id}/events",
            get(deployments::stream_deployment_events),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Key presented via `x-api-key` or as the Basic auth password.
fn presented_key(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .or_else(|| {
            parts
                .headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|auth| {
                    let auth = auth.trim();
                    let b64 = auth
                        .strip_prefix("Basic ")
                        .or_else(|| auth.strip_prefix("basic "))?;
                    let decoded = BASE64.decode(b64.as_bytes()).ok()?;
                    let creds = String::from_utf8(decoded).ok()?; // username:password
                    let (_username, password) = creds.split_once(':')?;
                    (!password.is_empty()).then(|| password.to_string())
                })
        })
}

/// Guards an endpoint when `api_key` is configured; a no-op otherwise.
pub struct ApiKey;

impl FromRequestParts<AppState> for ApiKey {
    type Rejection = (StatusCode, String);

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let res = match &state.config.api_key {
            None => Ok(ApiKey),
            Some(expected) => match presented_key(parts) {
                Some(key) if key == expected.expose_secret() => Ok(ApiKey),
                Some(_) => Err((StatusCode::UNAUTHORIZED, "invalid api key".to_string())),
                None => Err((
                    StatusCode::UNAUTHORIZED,
                    "missing x-api-key or Basic auth password".to_string(),
                )),
            },
        };
        ready(res)
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, Response},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        models::{DeploymentResult, DeploymentStatus},
        providers::ProviderRegistry,
        store::StatusStore,
        timing::NoDelay,
    };

    fn state(api_key: Option<&str>) -> AppState {
        let config = Config {
            api_key: api_key.map(|k| k.to_string().into()),
            ..Config::default()
        };
        AppState {
            manager: Arc::new(DeploymentManager::new(
                StatusStore::default(),
                ProviderRegistry::standard(),
                Arc::new(NoDelay),
            )),
            config: Arc::new(config),
            notifier: None,
        }
    }

    fn deployment_body(provider: &str) -> Value {
        json!({
            "project": {
                "files": [
                    {"path": "src/index.js", "content": "console.log('hi')", "type": "page"}
                ],
                "framework": "vanilla"
            },
            "config": {
                "providerId": provider,
                "projectName": "Demo Site",
                "framework": "vanilla",
                "buildCommand": "npm run build",
                "outputDirectory": "dist",
                "environmentVariables": {"API_URL": "https://api.example.com"}
            }
        })
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body<T: serde::de::DeserializeOwned>(resp: Response<Body>) -> T {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn healthz_is_open() {
        let app = router(state(Some("secret")));
        let resp = app.oneshot(get("/healthz")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn providers_lists_catalog() {
        let app = router(state(None));
        let resp = app.oneshot(get("/providers")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let providers: Vec<Value> = json_body(resp).await;
        assert_eq!(providers.len(), 6);
        assert_eq!(providers[2]["id"], "github-pages");
        assert_eq!(providers[2]["limits"]["buildMinutes"], "10 builds/hour");
    }

    #[tokio::test]
    async fn wait_returns_full_result() {
        let app = router(state(None));
        let resp = app
            .oneshot(post_json("/deployments?wait=true", &deployment_body("netlify")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let result: DeploymentResult = json_body(resp).await;
        assert!(result.success);
        assert_eq!(result.url.as_deref(), Some("https://demo-site.netlify.app"));
        assert!(result.metrics.is_some());
    }

    #[tokio::test]
    async fn unsupported_provider_is_reported_in_result() {
        let app = router(state(None));
        let resp = app
            .oneshot(post_json("/deployments?wait=true", &deployment_body("unknown-provider")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let result: Value = json_body(resp).await;
        assert_eq!(result["success"], false);
        assert!(
            result["error"]
                .as_str()
                .unwrap()
                .contains("Unsupported deployment provider")
        );
        assert!(result.get("metrics").is_none());
    }

    #[tokio::test]
    async fn background_deployment_is_queryable() {
        let state = state(None);
        let app = router(state.clone());
        let resp = app
            .clone()
            .oneshot(post_json("/deployments", &deployment_body("vercel")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let created: types::CreateDeploymentResponse = json_body(resp).await;

        let resp = app
            .clone()
            .oneshot(get(&format!("/deployments/{}", created.deployment_id)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let status: DeploymentStatus = json_body(resp).await;
        assert_eq!(status.id, created.deployment_id);

        let resp = app.oneshot(get("/deployments")).await.unwrap();
        let list: types::DeploymentListResponse = json_body(resp).await;
        assert_eq!(list.deployments.len(), 1);
    }

    #[tokio::test]
    async fn unknown_deployment_is_404() {
        let app = router(state(None));
        let resp = app.clone().oneshot(get("/deployments/nope")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app
            .clone()
            .oneshot(post_json("/deployments/nope/cancel", &json!({})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app.oneshot(get("/deployments/nope/events")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cancel_finished_deployment_reports_false() {
        let state = state(None);
        let result = state
            .manager
            .deploy_project(
                serde_json::from_value(deployment_body("firebase")["project"].clone()).unwrap(),
                serde_json::from_value(deployment_body("firebase")["config"].clone()).unwrap(),
                None,
            )
            .await;
        let app = router(state);
        let resp = app
            .oneshot(post_json(
                &format!("/deployments/{}/cancel", result.deployment_id),
                &json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: types::CancelDeploymentResponse = json_body(resp).await;
        assert!(!body.cancelled);
    }

    #[tokio::test]
    async fn api_key_required_when_configured() {
        let app = router(state(Some("secret")));

        let resp = app.clone().oneshot(get("/providers")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let wrong = Request::builder()
            .uri("/providers")
            .header("x-api-key", "nope")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            app.clone().oneshot(wrong).await.unwrap().status(),
            StatusCode::UNAUTHORIZED
        );

        let header = Request::builder()
            .uri("/providers")
            .header("x-api-key", "secret")
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.clone().oneshot(header).await.unwrap().status(), StatusCode::OK);

        let basic = Request::builder()
            .uri("/providers")
            .header("authorization", format!("Basic {}", BASE64.encode("ci:secret")))
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.oneshot(basic).await.unwrap().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn follow_status_ends_at_terminal_snapshot() {
        use futures_util::StreamExt;

        let manager = state(None).manager;
        let rx = manager.subscribe();
        let (id, _handle) = manager.spawn_deployment(
            serde_json::from_value(deployment_body("heroku")["project"].clone()).unwrap(),
            serde_json::from_value(deployment_body("heroku")["config"].clone()).unwrap(),
        );
        let current = manager.deployment_status(&id).unwrap();

        let seen: Vec<DeploymentStatus> =
            deployments::follow_status(manager.clone(), current, rx).collect().await;
        assert!(seen.iter().all(|s| s.id == id));
        assert!(seen.windows(2).all(|w| w[0].progress <= w[1].progress));
        let last = seen.last().unwrap();
        assert!(last.is_terminal());
        assert_eq!(last.url.as_deref(), Some("https://demo-site.herokuapp.com"));
    }
}
