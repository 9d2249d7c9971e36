use anyhow::Result;
use reqwest::Client;
use slack_morphism::prelude::*;
use url::Url;

use crate::models::{DeploymentConfig, DeploymentResult};

/// Posts deployment outcomes to a Slack Incoming Webhook.
#[derive(Clone)]
pub struct SlackWebhookClient {
    client: Client,
    webhook_url: Url,
}

impl SlackWebhookClient {
    pub fn new(webhook_url: &str) -> Result<Self> {
        let client = Client::new();
        let webhook_url = Url::parse(webhook_url)?;

        Ok(Self { client, webhook_url })
    }

    pub async fn notify_deployment(
        &self,
        config: &DeploymentConfig,
        result: &DeploymentResult,
    ) -> Result<()> {
        self.send_text(deployment_message(config, result)).await
    }

    async fn send_text(&self, text: String) -> Result<()> {
        let req = SlackApiPostWebhookMessageRequest::new(SlackMessageContent::new().with_text(text));

        self.client
            .post(self.webhook_url.clone())
            .json(&req)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

pub fn deployment_message(config: &DeploymentConfig, result: &DeploymentResult) -> String {
    if result.success {
        let url = result.url.as_deref().unwrap_or("(no url)");
        match &result.metrics {
            Some(m) => format!(
                ":rocket: *{}* deployed to {} at {} ({} in {}ms)",
                config.project_name, config.provider_id, url, m.total_size, m.deploy_time
            ),
            None => format!(
                ":rocket: *{}* deployed to {} at {}",
                config.project_name, config.provider_id, url
            ),
        }
    } else {
        format!(
            ":x: *{}* failed to deploy to {}: {}",
            config.project_name,
            config.provider_id,
            result.error.as_deref().unwrap_or("unknown error")
        )
    }
}
