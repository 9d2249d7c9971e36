use serde::{Deserialize, Serialize};

use crate::models::{DeploymentConfig, DeploymentStatus, GeneratedProject};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeploymentRequest {
    pub project: GeneratedProject,
    pub config: DeploymentConfig,
}

/// Query parameters for deployment creation
#[derive(Debug, Default, Deserialize)]
pub struct CreateDeploymentParams {
    /// Block until the deployment finished and return its result.
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeploymentResponse {
    pub deployment_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentListResponse {
    pub deployments: Vec<DeploymentStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelDeploymentResponse {
    pub deployment_id: String,
    pub cancelled: bool,
}
