use std::time::Duration;

use super::{DeployContext, ProviderAdapter, ProviderDeployment};
use crate::models::ProviderId;

pub struct Firebase;

impl ProviderAdapter for Firebase {
    fn id(&self) -> ProviderId {
        ProviderId::Firebase
    }

    fn deploy_delay(&self) -> Duration {
        Duration::from_secs(4)
    }

    fn urls(&self, ctx: &DeployContext<'_>) -> ProviderDeployment {
        let name = ctx.config.subdomain();
        ProviderDeployment {
            url: format!("https://{}.web.app", name),
            preview_url: Some(format!("https://{}.firebaseapp.com", name)),
        }
    }
}
