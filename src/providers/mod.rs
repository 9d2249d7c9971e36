//! Hosting provider adapters. Each provider owns its manifest synthesis and
//! its simulated deploy call; the orchestrator only looks adapters up by id.

pub mod aws_amplify;
pub mod firebase;
pub mod github_pages;
pub mod heroku;
pub mod netlify;
pub mod vercel;

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;

use crate::{
    error::DeployError,
    models::{DeploymentConfig, DeploymentProvider, GeneratedProject, ProjectFile, ProviderId, find_provider},
    timing::Delay,
};

pub use aws_amplify::AwsAmplify;
pub use firebase::Firebase;
pub use github_pages::GithubPages;
pub use heroku::Heroku;
pub use netlify::Netlify;
pub use vercel::Vercel;

/// What a provider hands back once the upload finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDeployment {
    pub url: String,
    pub preview_url: Option<String>,
}

impl ProviderDeployment {
    /// With a custom domain the provider URL is demoted to the preview URL.
    pub fn with_custom_domain(self, domain: Option<&str>) -> Self {
        match domain.map(str::trim).filter(|d| !d.is_empty()) {
            Some(domain) => Self {
                url: format!("https://{}", domain),
                preview_url: Some(self.url),
            },
            None => self,
        }
    }
}

pub struct DeployContext<'a> {
    pub deployment_id: &'a str,
    pub files: &'a [ProjectFile],
    pub config: &'a DeploymentConfig,
    pub delay: &'a dyn Delay,
}

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    fn catalog_entry(&self) -> &'static DeploymentProvider {
        find_provider(self.id())
    }

    /// Provider-specific manifest, if the provider reads one.
    fn prepare_config(
        &self,
        _project: &GeneratedProject,
        _config: &DeploymentConfig,
    ) -> Result<Option<ProjectFile>, DeployError> {
        Ok(None)
    }

    /// Simulated upload time.
    fn deploy_delay(&self) -> Duration;

    fn urls(&self, ctx: &DeployContext<'_>) -> ProviderDeployment;

    async fn deploy(&self, ctx: &DeployContext<'_>) -> Result<ProviderDeployment, DeployError> {
        ctx.delay.wait(self.deploy_delay()).await;
        Ok(self.urls(ctx))
    }
}

/// Adapters keyed by their wire id.
pub struct ProviderRegistry {
    adapters: HashMap<ProviderId, Box<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// All six catalog providers.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(Vercel));
        registry.register(Box::new(Netlify));
        registry.register(Box::new(GithubPages));
        registry.register(Box::new(Heroku));
        registry.register(Box::new(AwsAmplify));
        registry.register(Box::new(Firebase));
        registry
    }

    pub fn register(&mut self, adapter: Box<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.id(), adapter);
    }

    /// Looks an adapter up by its wire id (`github-pages`, `aws-amplify`, ...).
    pub fn get(&self, provider_id: &str) -> Option<&dyn ProviderAdapter> {
        let id = match provider_id.parse::<ProviderId>() {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!(error = %e, "No adapter for provider id");
                return None;
            }
        };
        self.adapters.get(&id).map(|a| a.as_ref())
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
