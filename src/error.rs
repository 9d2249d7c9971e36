use thiserror::Error;

/// Failures raised by the deployment pipeline.
///
/// These never escape [`crate::DeploymentManager::deploy_project`]; they are
/// folded into a failed [`crate::DeploymentResult`] instead.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Unsupported deployment provider: {0}")]
    UnsupportedProvider(String),

    #[error("Build failed: {0}")]
    Build(String),

    #[error("Deployment cancelled by user")]
    Cancelled,

    #[error("Deployment record {0} no longer exists")]
    MissingRecord(String),

    #[error("Failed to render JSON manifest: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to render TOML manifest: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl DeployError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DeployError::Cancelled)
    }
}
