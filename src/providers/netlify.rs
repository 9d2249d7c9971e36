use std::time::Duration;

use indexmap::IndexMap;
use serde::Serialize;

use super::{DeployContext, ProviderAdapter, ProviderDeployment};
use crate::{
    error::DeployError,
    models::{DeploymentConfig, FileType, GeneratedProject, ProjectFile, ProviderId},
};

pub const MANIFEST: &str = "netlify.toml";

pub struct Netlify;

#[derive(Serialize)]
struct NetlifyManifest<'a> {
    build: NetlifyBuild<'a>,
    redirects: Vec<NetlifyRedirect<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    headers: Vec<NetlifyHeaders<'a>>,
}

#[derive(Serialize)]
struct NetlifyBuild<'a> {
    command: &'a str,
    publish: &'a str,
}

#[derive(Serialize)]
struct NetlifyRedirect<'a> {
    from: &'a str,
    to: &'a str,
    status: u16,
}

#[derive(Serialize)]
struct NetlifyHeaders<'a> {
    #[serde(rename = "for")]
    path: &'static str,
    values: &'a IndexMap<String, String>,
}

impl ProviderAdapter for Netlify {
    fn id(&self) -> ProviderId {
        ProviderId::Netlify
    }

    fn prepare_config(
        &self,
        _project: &GeneratedProject,
        config: &DeploymentConfig,
    ) -> Result<Option<ProjectFile>, DeployError> {
        // SPA fallback first, caller rules after it.
        let mut redirects = vec![NetlifyRedirect {
            from: "/*",
            to: "/index.html",
            status: 200,
        }];
        redirects.extend(config.redirects.iter().flatten().map(|r| NetlifyRedirect {
            from: &r.from,
            to: &r.to,
            status: r.status,
        }));

        let headers = config
            .headers
            .as_ref()
            .filter(|h| !h.is_empty())
            .map(|values| vec![NetlifyHeaders { path: "/*", values }])
            .unwrap_or_default();

        let manifest = NetlifyManifest {
            build: NetlifyBuild {
                command: &config.build_command,
                publish: &config.output_directory,
            },
            redirects,
            headers,
        };
        Ok(Some(
            ProjectFile::new(MANIFEST, toml::to_string(&manifest)?, FileType::Config)
                .with_description("Netlify deployment configuration"),
        ))
    }

    fn deploy_delay(&self) -> Duration {
        Duration::from_secs(3)
    }

    fn urls(&self, ctx: &DeployContext<'_>) -> ProviderDeployment {
        let name = ctx.config.subdomain();
        ProviderDeployment {
            url: format!("https://{}.netlify.app", name),
            preview_url: Some(format!("https://deploy-preview--{}.netlify.app", name)),
        }
    }
}
