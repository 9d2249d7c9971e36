use std::time::Duration;

use super::{DeployContext, ProviderAdapter, ProviderDeployment};
use crate::{
    error::DeployError,
    models::{DeploymentConfig, FileType, GeneratedProject, ProjectFile, ProviderId},
};

pub const PROCFILE: &str = "Procfile";

pub struct Heroku;

impl ProviderAdapter for Heroku {
    fn id(&self) -> ProviderId {
        ProviderId::Heroku
    }

    fn prepare_config(
        &self,
        _project: &GeneratedProject,
        config: &DeploymentConfig,
    ) -> Result<Option<ProjectFile>, DeployError> {
        Ok(Some(
            ProjectFile::new(PROCFILE, format!("web: {}", config.build_command), FileType::Config)
                .with_description("Heroku process declaration"),
        ))
    }

    fn deploy_delay(&self) -> Duration {
        Duration::from_secs(8)
    }

    fn urls(&self, ctx: &DeployContext<'_>) -> ProviderDeployment {
        ProviderDeployment {
            url: format!("https://{}.herokuapp.com", ctx.config.subdomain()),
            preview_url: None,
        }
    }
}
