use std::{sync::Arc, time::Duration};

use serde_json::json;
use tokio::{sync::broadcast, task::JoinHandle, time::Instant};
use uuid::Uuid;

use crate::{
    artifacts,
    error::DeployError,
    models::{
        DeploymentConfig, DeploymentMetrics, DeploymentProvider, DeploymentResult,
        DeploymentState, DeploymentStatus, GeneratedProject, LogLevel, PROVIDER_CATALOG,
    },
    providers::{DeployContext, ProviderDeployment, ProviderRegistry},
    store::{CancelSignal, StatusStore},
    timing::{Delay, TokioDelay, build_delay},
};

/// Observer invoked with a snapshot after every status change of one deployment.
pub type ProgressCallback = Arc<dyn Fn(&DeploymentStatus) + Send + Sync>;

const EVENT_BUFFER: usize = 256;

/// Runs simulated deployments and keeps their status records.
pub struct DeploymentManager {
    store: StatusStore,
    providers: ProviderRegistry,
    delay: Arc<dyn Delay>,
    events: broadcast::Sender<DeploymentStatus>,
}

struct Outcome {
    deployment: ProviderDeployment,
    build_time: Duration,
    total_size: usize,
}

/// Applies status mutations for one deployment and fans out the snapshots.
struct Tracker<'a> {
    manager: &'a DeploymentManager,
    id: &'a str,
    on_progress: Option<&'a (dyn Fn(&DeploymentStatus) + Send + Sync)>,
}

impl Tracker<'_> {
    fn update(&self, f: impl FnOnce(&mut DeploymentStatus)) -> Option<DeploymentStatus> {
        let snapshot = self.manager.store.update(self.id, f)?;
        self.manager.publish(&snapshot);
        if let Some(cb) = self.on_progress {
            cb(&snapshot);
        }
        Some(snapshot)
    }

    /// Like `update`, but a record that can no longer change ends the pipeline.
    fn step(&self, f: impl FnOnce(&mut DeploymentStatus)) -> Result<(), DeployError> {
        match self.update(f) {
            Some(_) => Ok(()),
            None if self.manager.store.get(self.id).is_some() => Err(DeployError::Cancelled),
            None => Err(DeployError::MissingRecord(self.id.to_string())),
        }
    }
}

fn checkpoint(cancel: &CancelSignal) -> Result<(), DeployError> {
    if cancel.is_cancelled() {
        Err(DeployError::Cancelled)
    } else {
        Ok(())
    }
}

impl DeploymentManager {
    pub fn new(store: StatusStore, providers: ProviderRegistry, delay: Arc<dyn Delay>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            store,
            providers,
            delay,
            events,
        }
    }

    pub fn providers(&self) -> &'static [DeploymentProvider] {
        &PROVIDER_CATALOG
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Receives every status snapshot of every deployment.
    pub fn subscribe(&self) -> broadcast::Receiver<DeploymentStatus> {
        self.events.subscribe()
    }

    pub fn deployment_status(&self, id: &str) -> Option<DeploymentStatus> {
        self.store.get(id)
    }

    pub fn list_deployments(&self) -> Vec<DeploymentStatus> {
        self.store.list()
    }

    /// Removes finished records older than the store TTL.
    pub fn prune(&self) -> usize {
        let removed = self.store.prune();
        if removed > 0 {
            tracing::debug!(removed, remaining = self.store.len(), "Pruned deployment records");
        }
        removed
    }

    /// Fails a pending or building deployment. Returns false when the id is
    /// unknown or already finished.
    pub fn cancel_deployment(&self, id: &str) -> bool {
        match self.store.cancel(id) {
            Some(snapshot) => {
                tracing::warn!(deployment_id = %id, "Deployment cancelled");
                self.publish(&snapshot);
                true
            }
            None => false,
        }
    }

    /// Runs all phases to completion. Never fails: errors end up in the result.
    pub async fn deploy_project(
        &self,
        project: GeneratedProject,
        config: DeploymentConfig,
        on_progress: Option<ProgressCallback>,
    ) -> DeploymentResult {
        let (id, cancel) = self.register(&config);
        self.run(&id, &cancel, &project, &config, on_progress.as_deref())
            .await
    }

    /// Registers the deployment synchronously and runs it on a tokio task.
    pub fn spawn_deployment(
        self: &Arc<Self>,
        project: GeneratedProject,
        config: DeploymentConfig,
    ) -> (String, JoinHandle<DeploymentResult>) {
        let (id, cancel) = self.register(&config);
        let manager = Arc::clone(self);
        let task_id = id.clone();
        let handle = tokio::spawn(async move {
            manager
                .run(&task_id, &cancel, &project, &config, None)
                .await
        });
        (id, handle)
    }

    fn publish(&self, snapshot: &DeploymentStatus) {
        // No subscribers is fine.
        let _ = self.events.send(snapshot.clone());
    }

    fn register(&self, config: &DeploymentConfig) -> (String, Arc<CancelSignal>) {
        let id = Uuid::new_v4().to_string();
        let mut status = DeploymentStatus::new(&id);
        status.log_with(
            LogLevel::Info,
            format!("Deployment queued for {}", config.provider_id),
            Some(json!({ "projectName": config.project_name })),
        );
        let cancel = self.store.insert(status.clone());
        self.publish(&status);
        (id, cancel)
    }

    async fn run(
        &self,
        id: &str,
        cancel: &CancelSignal,
        project: &GeneratedProject,
        config: &DeploymentConfig,
        on_progress: Option<&(dyn Fn(&DeploymentStatus) + Send + Sync)>,
    ) -> DeploymentResult {
        let started = Instant::now();
        let tracker = Tracker {
            manager: self,
            id,
            on_progress,
        };

        tracing::info!(
            deployment_id = %id,
            provider = %config.provider_id,
            project = %config.project_name,
            "Starting deployment"
        );

        match self.pipeline(&tracker, cancel, project, config).await {
            Ok(outcome) => self.finish(&tracker, outcome, started),
            Err(err) => self.fail(&tracker, err),
        }
    }

    async fn pipeline(
        &self,
        tracker: &Tracker<'_>,
        cancel: &CancelSignal,
        project: &GeneratedProject,
        config: &DeploymentConfig,
    ) -> Result<Outcome, DeployError> {
        let adapter = self.providers.get(&config.provider_id);

        // Prepare
        tracker.step(|s| {
            s.status = DeploymentState::Building;
            s.advance(10);
            s.log(LogLevel::Info, "Preparing deployment files");
        })?;
        let prepared = artifacts::prepare_files(project, config, adapter)?;
        tracker.step(|s| {
            s.advance(30);
            s.log_with(
                LogLevel::Info,
                format!("Generated {} configuration files", prepared.generated.len()),
                Some(json!({ "files": prepared.generated })),
            );
        })?;

        // Build
        tracker.step(|s| {
            s.advance(35);
            s.log(LogLevel::Info, "Building project");
        })?;
        let build_started = Instant::now();
        self.wait(cancel, build_delay(project.framework)).await?;
        let output = artifacts::build_output(project, &prepared.files, config)?;
        let build_time = build_started.elapsed();
        tracing::debug!(deployment_id = %tracker.id, files = output.len(), "Build finished");
        tracker.step(|s| {
            s.advance(60);
            s.log_with(
                LogLevel::Info,
                format!("Build completed in {}ms", build_time.as_millis()),
                Some(json!({
                    "outputDirectory": config.output_directory,
                    "files": output.len(),
                })),
            );
        })?;

        // Deploy
        let adapter = adapter
            .ok_or_else(|| DeployError::UnsupportedProvider(config.provider_id.clone()))?;
        let provider_name = adapter.catalog_entry().name;
        tracker.step(|s| {
            s.advance(65);
            s.log(LogLevel::Info, format!("Deploying to {}", provider_name));
        })?;
        let ctx = DeployContext {
            deployment_id: tracker.id,
            files: &output,
            config,
            delay: self.delay.as_ref(),
        };
        let deployment = tokio::select! {
            result = adapter.deploy(&ctx) => result?,
            _ = cancel.cancelled() => return Err(DeployError::Cancelled),
        };
        checkpoint(cancel)?;
        let deployment = deployment.with_custom_domain(config.custom_domain.as_deref());
        tracker.step(|s| {
            s.advance(90);
            s.log(
                LogLevel::Info,
                format!("Uploaded {} files to {}", output.len(), provider_name),
            );
        })?;

        Ok(Outcome {
            deployment,
            build_time,
            total_size: prepared.total_size(),
        })
    }

    async fn wait(&self, cancel: &CancelSignal, duration: Duration) -> Result<(), DeployError> {
        tokio::select! {
            _ = self.delay.wait(duration) => {}
            _ = cancel.cancelled() => {}
        }
        checkpoint(cancel)
    }

    fn finish(&self, tracker: &Tracker<'_>, outcome: Outcome, started: Instant) -> DeploymentResult {
        let ProviderDeployment { url, preview_url } = outcome.deployment;
        let finished = tracker.update(|s| {
            s.log_with(
                LogLevel::Info,
                format!("Deployment successful: {}", url),
                preview_url.as_ref().map(|p| json!({ "previewUrl": p })),
            );
            s.mark_deployed(url.clone(), preview_url.clone());
        });

        match finished {
            Some(status) => {
                tracing::info!(
                    deployment_id = %status.id,
                    state = %status.status,
                    url = %url,
                    "Deployment finished"
                );
                DeploymentResult {
                    success: true,
                    deployment_id: status.id,
                    url: status.url,
                    preview_url: status.preview_url,
                    error: None,
                    logs: status.logs,
                    metrics: Some(DeploymentMetrics {
                        build_time: outcome.build_time.as_millis() as u64,
                        deploy_time: started.elapsed().as_millis() as u64,
                        total_size: artifacts::format_size(outcome.total_size),
                    }),
                }
            }
            // Cancelled after the last checkpoint; the cancellation stands.
            None => self.fail(tracker, DeployError::Cancelled),
        }
    }

    fn fail(&self, tracker: &Tracker<'_>, err: DeployError) -> DeploymentResult {
        let message = err.to_string();
        let recorded = if err.is_cancelled() {
            tracing::info!(deployment_id = %tracker.id, "Deployment stopped after cancellation");
            self.store.get(tracker.id)
        } else {
            tracing::error!(deployment_id = %tracker.id, error = %message, "Deployment failed");
            tracker
                .update(|s| {
                    s.log(LogLevel::Error, format!("Deployment failed: {}", message));
                    s.mark_failed(message.clone());
                })
                .or_else(|| self.store.get(tracker.id))
        };

        match recorded {
            Some(status) => {
                tracing::debug!(deployment_id = %status.id, state = %status.status, "Deployment ended");
                DeploymentResult::failed(&status)
            }
            None => DeploymentResult {
                success: false,
                deployment_id: tracker.id.to_string(),
                url: None,
                preview_url: None,
                error: Some(message),
                logs: Vec::new(),
                metrics: None,
            },
        }
    }
}

impl Default for DeploymentManager {
    fn default() -> Self {
        Self::new(
            StatusStore::default(),
            ProviderRegistry::standard(),
            Arc::new(TokioDelay::default()),
        )
    }
}
