use std::time::Duration;

use super::{DeployContext, ProviderAdapter, ProviderDeployment};
use crate::models::ProviderId;

pub struct AwsAmplify;

impl ProviderAdapter for AwsAmplify {
    fn id(&self) -> ProviderId {
        ProviderId::AwsAmplify
    }

    fn deploy_delay(&self) -> Duration {
        Duration::from_secs(5)
    }

    // Amplify serves each connected branch on its own subdomain.
    fn urls(&self, ctx: &DeployContext<'_>) -> ProviderDeployment {
        let branch = crate::sanitize_project_name(ctx.config.branch());
        ProviderDeployment {
            url: format!("https://{}.{}.amplifyapp.com", branch, ctx.config.subdomain()),
            preview_url: None,
        }
    }
}
