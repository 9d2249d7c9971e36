use std::time::Duration;

use indexmap::IndexMap;
use serde::Serialize;

use super::{DeployContext, ProviderAdapter, ProviderDeployment};
use crate::{
    error::DeployError,
    models::{DeploymentConfig, FileType, GeneratedProject, ProjectFile, ProviderId},
};

pub const MANIFEST: &str = "vercel.json";

pub struct Vercel;

#[derive(Serialize)]
struct VercelManifest<'a> {
    version: u8,
    name: String,
    builds: Vec<VercelBuild<'a>>,
    routes: Vec<VercelRoute>,
    env: &'a IndexMap<String, String>,
    redirects: Vec<VercelRedirect<'a>>,
}

#[derive(Serialize)]
struct VercelBuild<'a> {
    src: &'static str,
    #[serde(rename = "use")]
    builder: &'static str,
    config: VercelBuildConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VercelBuildConfig<'a> {
    dist_dir: &'a str,
}

#[derive(Serialize)]
struct VercelRoute {
    src: &'static str,
    dest: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VercelRedirect<'a> {
    source: &'a str,
    destination: &'a str,
    status_code: u16,
}

impl ProviderAdapter for Vercel {
    fn id(&self) -> ProviderId {
        ProviderId::Vercel
    }

    fn prepare_config(
        &self,
        _project: &GeneratedProject,
        config: &DeploymentConfig,
    ) -> Result<Option<ProjectFile>, DeployError> {
        let manifest = VercelManifest {
            version: 2,
            name: config.subdomain(),
            builds: vec![VercelBuild {
                src: "package.json",
                builder: "@vercel/static-build",
                config: VercelBuildConfig {
                    dist_dir: &config.output_directory,
                },
            }],
            routes: vec![VercelRoute {
                src: "/(.*)",
                dest: "/index.html",
            }],
            env: &config.environment_variables,
            redirects: config
                .redirects
                .iter()
                .flatten()
                .map(|r| VercelRedirect {
                    source: &r.from,
                    destination: &r.to,
                    status_code: r.status,
                })
                .collect(),
        };
        Ok(Some(
            ProjectFile::new(MANIFEST, serde_json::to_string_pretty(&manifest)?, FileType::Config)
                .with_description("Vercel deployment configuration"),
        ))
    }

    fn deploy_delay(&self) -> Duration {
        Duration::from_secs(2)
    }

    fn urls(&self, ctx: &DeployContext<'_>) -> ProviderDeployment {
        let name = ctx.config.subdomain();
        let short_id: String = ctx
            .deployment_id
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .take(8)
            .collect::<String>()
            .to_ascii_lowercase();
        ProviderDeployment {
            url: format!("https://{}.vercel.app", name),
            preview_url: Some(format!("https://{}-{}.vercel.app", name, short_id)),
        }
    }
}
