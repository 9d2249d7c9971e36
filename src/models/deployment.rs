use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::provider::Framework;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitIntegration {
    pub repository: String,
    pub branch: String,
    #[serde(default)]
    pub auto_deploy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub from: String,
    pub to: String,
    pub status: u16,
}

/// Per-request deployment settings supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    /// Resolved against the provider registry when the deploy phase starts.
    pub provider_id: String,
    pub project_name: String,
    pub framework: Framework,
    pub build_command: String,
    pub output_directory: String,
    #[serde(default)]
    pub environment_variables: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_integration: Option<GitIntegration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirects: Option<Vec<Redirect>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<IndexMap<String, String>>,
}

impl DeploymentConfig {
    pub fn new(provider_id: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            project_name: project_name.into(),
            framework: Framework::React,
            build_command: "npm run build".to_string(),
            output_directory: "dist".to_string(),
            environment_variables: IndexMap::new(),
            custom_domain: None,
            git_integration: None,
            redirects: None,
            headers: None,
        }
    }

    /// DNS-safe form of `project_name`.
    pub fn subdomain(&self) -> String {
        crate::sanitize_project_name(&self.project_name)
    }

    pub fn branch(&self) -> &str {
        self.git_integration
            .as_ref()
            .map(|g| g.branch.as_str())
            .filter(|b| !b.is_empty())
            .unwrap_or("main")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentState {
    Pending,
    Building,
    Deployed,
    Failed,
}

impl DeploymentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentState::Deployed | DeploymentState::Failed)
    }
}

impl std::fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentState::Pending => write!(f, "pending"),
            DeploymentState::Building => write!(f, "building"),
            DeploymentState::Deployed => write!(f, "deployed"),
            DeploymentState::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentLog {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Mutable record tracked for one deployment attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
    pub id: String,
    pub status: DeploymentState,
    pub progress: u8,
    pub logs: Vec<DeploymentLog>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeploymentStatus {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: DeploymentState::Pending,
            progress: 0,
            logs: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
            url: None,
            preview_url: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.log_with(level, message, None);
    }

    pub fn log_with(
        &mut self,
        level: LogLevel,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) {
        self.logs.push(DeploymentLog {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            details,
        });
    }

    /// Raises progress; never lowers it and never reaches 100 outside of a
    /// terminal transition.
    pub fn advance(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(99));
    }

    pub fn mark_deployed(&mut self, url: String, preview_url: Option<String>) {
        self.status = DeploymentState::Deployed;
        self.progress = 100;
        self.end_time = Some(Utc::now());
        self.url = Some(url);
        self.preview_url = preview_url;
        self.error = None;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = DeploymentState::Failed;
        self.progress = 100;
        self.end_time = Some(Utc::now());
        self.url = None;
        self.preview_url = None;
        self.error = Some(error.into());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentMetrics {
    /// Milliseconds spent in the build phase.
    pub build_time: u64,
    /// Milliseconds from start to finalize.
    pub deploy_time: u64,
    pub total_size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub success: bool,
    pub deployment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub logs: Vec<DeploymentLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<DeploymentMetrics>,
}

impl DeploymentResult {
    /// Failed result mirroring a terminal status record.
    pub fn failed(status: &DeploymentStatus) -> Self {
        Self {
            success: false,
            deployment_id: status.id.clone(),
            url: None,
            preview_url: None,
            error: status.error.clone(),
            logs: status.logs.clone(),
            metrics: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_never_decreases_and_stops_short_of_100() {
        let mut status = DeploymentStatus::new("d1");
        status.advance(30);
        status.advance(10);
        assert_eq!(status.progress, 30);
        status.advance(100);
        assert_eq!(status.progress, 99);
        assert!(!status.is_terminal());
    }

    #[test]
    fn terminal_transitions_uphold_invariants() {
        let mut ok = DeploymentStatus::new("d1");
        ok.mark_deployed("https://a.vercel.app".to_string(), None);
        assert_eq!(ok.progress, 100);
        assert!(ok.end_time.is_some());
        assert!(ok.error.is_none());

        let mut failed = DeploymentStatus::new("d2");
        failed.mark_failed("boom");
        assert_eq!(failed.status, DeploymentState::Failed);
        assert_eq!(failed.progress, 100);
        assert!(failed.end_time.is_some());
        assert!(failed.url.is_none());
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }

    #[test]
    fn config_deserializes_from_camel_case() {
        let config: DeploymentConfig = serde_json::from_str(
            r#"{
                "providerId": "netlify",
                "projectName": "Shop",
                "framework": "vue",
                "buildCommand": "npm run build",
                "outputDirectory": "dist",
                "environmentVariables": {"B": "2", "A": "1"},
                "redirects": [{"from": "/old", "to": "/new", "status": 301}]
            }"#,
        )
        .unwrap();
        assert_eq!(config.framework, Framework::Vue);
        let keys: Vec<_> = config.environment_variables.keys().cloned().collect();
        assert_eq!(keys, vec!["B", "A"]);
        assert_eq!(config.redirects.unwrap()[0].status, 301);
        assert!(config.git_integration.is_none());
    }

    #[test]
    fn state_display_matches_wire_format() {
        for state in [
            DeploymentState::Pending,
            DeploymentState::Building,
            DeploymentState::Deployed,
            DeploymentState::Failed,
        ] {
            let wire = serde_json::to_string(&state).unwrap();
            assert_eq!(wire, format!("\"{}\"", state));
        }
    }

    #[test]
    fn branch_defaults_to_main() {
        let mut config = DeploymentConfig::new("aws-amplify", "site");
        assert_eq!(config.branch(), "main");
        config.git_integration = Some(GitIntegration {
            repository: "acme/site".to_string(),
            branch: "staging".to_string(),
            auto_deploy: true,
        });
        assert_eq!(config.branch(), "staging");
    }
}
