use std::time::Duration;

use super::{DeployContext, ProviderAdapter, ProviderDeployment};
use crate::models::{DeploymentConfig, ProviderId};

const DEFAULT_OWNER: &str = "username";

pub struct GithubPages;

/// Account that owns the pages site, taken from `owner/repo` or a GitHub URL.
fn repository_owner(config: &DeploymentConfig) -> String {
    config
        .git_integration
        .as_ref()
        .map(|git| {
            git.repository
                .trim()
                .trim_start_matches("https://github.com/")
                .trim_start_matches("git@github.com:")
                .to_string()
        })
        .and_then(|repo| {
            let mut parts = repo.split('/');
            match (parts.next(), parts.next()) {
                (Some(owner), Some(_)) if !owner.is_empty() => Some(owner.to_ascii_lowercase()),
                _ => None,
            }
        })
        .unwrap_or_else(|| DEFAULT_OWNER.to_string())
}

impl ProviderAdapter for GithubPages {
    fn id(&self) -> ProviderId {
        ProviderId::GithubPages
    }

    fn deploy_delay(&self) -> Duration {
        Duration::from_secs(6)
    }

    fn urls(&self, ctx: &DeployContext<'_>) -> ProviderDeployment {
        ProviderDeployment {
            url: format!(
                "https://{}.github.io/{}",
                repository_owner(ctx.config),
                ctx.config.subdomain()
            ),
            preview_url: None,
        }
    }
}
