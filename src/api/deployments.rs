use std::{convert::Infallible, sync::Arc};

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures_util::stream::{self, Stream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};

use super::{ApiKey, AppState, types::*};
use crate::{
    models::{DeploymentConfig, DeploymentProvider, DeploymentResult, DeploymentStatus},
    orchestrator::DeploymentManager,
    slack_client::SlackWebhookClient,
};

fn not_found(id: &str) -> (StatusCode, String) {
    (
        StatusCode::NOT_FOUND,
        format!("Deployment '{}' not found", id),
    )
}

async fn notify(notifier: Option<&SlackWebhookClient>, config: &DeploymentConfig, result: &DeploymentResult) {
    if let Some(notifier) = notifier
        && let Err(e) = notifier.notify_deployment(config, result).await
    {
        tracing::warn!(error = %e, deployment_id = %result.deployment_id, "Failed to send Slack notification");
    }
}

/// GET /providers - Static provider catalog
pub async fn list_providers(
    _key: ApiKey,
    State(state): State<AppState>,
) -> Json<&'static [DeploymentProvider]> {
    Json(state.manager.providers())
}

/// GET /deployments - All tracked deployments, newest first
pub async fn list_deployments(
    _key: ApiKey,
    State(state): State<AppState>,
) -> Json<DeploymentListResponse> {
    Json(DeploymentListResponse {
        deployments: state.manager.list_deployments(),
    })
}

/// POST /deployments - Start a deployment
///
/// Runs in the background and answers 202 with the deployment id, unless
/// `?wait=true` is given, in which case the full result is returned.
pub async fn create_deployment(
    _key: ApiKey,
    State(state): State<AppState>,
    Query(params): Query<CreateDeploymentParams>,
    Json(body): Json<CreateDeploymentRequest>,
) -> Response {
    let CreateDeploymentRequest { project, config } = body;

    tracing::info!(
        provider = %config.provider_id,
        project = %config.project_name,
        files = project.files.len(),
        wait = params.wait,
        "Deployment requested"
    );

    if params.wait {
        let result = state
            .manager
            .deploy_project(project, config.clone(), None)
            .await;
        notify(state.notifier.as_ref(), &config, &result).await;
        return Json(result).into_response();
    }

    let (deployment_id, handle) = state.manager.spawn_deployment(project, config.clone());
    if let Some(notifier) = state.notifier.clone() {
        tokio::spawn(async move {
            match handle.await {
                Ok(result) => notify(Some(&notifier), &config, &result).await,
                Err(e) => tracing::error!(error = %e, "Deployment task panicked"),
            }
        });
    }

    (
        StatusCode::ACCEPTED,
        Json(CreateDeploymentResponse { deployment_id }),
    )
        .into_response()
}

/// GET /deployments/{id} - Current status record
pub async fn get_deployment(
    _key: ApiKey,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeploymentStatus>, (StatusCode, String)> {
    state
        .manager
        .deployment_status(&id)
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

/// POST /deployments/{id}/cancel
pub async fn cancel_deployment(
    _key: ApiKey,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancelDeploymentResponse>, (StatusCode, String)> {
    if state.manager.deployment_status(&id).is_none() {
        return Err(not_found(&id));
    }
    let cancelled = state.manager.cancel_deployment(&id);
    Ok(Json(CancelDeploymentResponse {
        deployment_id: id,
        cancelled,
    }))
}

/// GET /deployments/{id}/events - Stream status snapshots via SSE
pub async fn stream_deployment_events(
    _key: ApiKey,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    // Subscribe before reading the record so no change slips in between.
    let rx = state.manager.subscribe();
    let current = state
        .manager
        .deployment_status(&id)
        .ok_or_else(|| not_found(&id))?;

    let stream = follow_status(state.manager.clone(), current, rx).map(|status| {
        let event = Event::default().event("status");
        Ok(match event.json_data(&status) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode status event");
                Event::default().event("error").data(e.to_string())
            }
        })
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

struct Follow {
    id: String,
    manager: Arc<DeploymentManager>,
    rx: broadcast::Receiver<DeploymentStatus>,
    next: Option<DeploymentStatus>,
    progress: u8,
    done: bool,
}

/// Snapshots of one deployment, starting with `current` and ending after the
/// first terminal snapshot. Stale snapshots are skipped.
pub fn follow_status(
    manager: Arc<DeploymentManager>,
    current: DeploymentStatus,
    rx: broadcast::Receiver<DeploymentStatus>,
) -> impl Stream<Item = DeploymentStatus> + Send {
    let follow = Follow {
        id: current.id.clone(),
        manager,
        rx,
        next: Some(current),
        progress: 0,
        done: false,
    };

    stream::unfold(follow, |mut f| async move {
        loop {
            if f.done {
                return None;
            }
            let status = match f.next.take() {
                Some(status) => status,
                None => match f.rx.recv().await {
                    Ok(status) if status.id == f.id => status,
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, deployment_id = %f.id, "Status stream lagged");
                        // Resync from the store; the record may be gone.
                        f.manager.deployment_status(&f.id)?
                    }
                    Err(RecvError::Closed) => return None,
                },
            };
            if status.progress < f.progress {
                continue;
            }
            f.progress = status.progress;
            f.done = status.is_terminal();
            return Some((status, f));
        }
    })
}
