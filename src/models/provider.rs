use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    React,
    Vue,
    Vanilla,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    Vercel,
    Netlify,
    GithubPages,
    Heroku,
    AwsAmplify,
    Firebase,
}

impl ProviderId {
    pub const ALL: [ProviderId; 6] = [
        ProviderId::Vercel,
        ProviderId::Netlify,
        ProviderId::GithubPages,
        ProviderId::Heroku,
        ProviderId::AwsAmplify,
        ProviderId::Firebase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Vercel => "vercel",
            ProviderId::Netlify => "netlify",
            ProviderId::GithubPages => "github-pages",
            ProviderId::Heroku => "heroku",
            ProviderId::AwsAmplify => "aws-amplify",
            ProviderId::Firebase => "firebase",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown provider: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Advanced,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderLimits {
    pub sites: &'static str,
    pub bandwidth: &'static str,
    pub build_minutes: &'static str,
}

/// Read-only catalog entry describing a hosting target.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentProvider {
    pub id: ProviderId,
    pub name: &'static str,
    pub description: &'static str,
    pub supported_frameworks: &'static [Framework],
    pub features: &'static [&'static str],
    pub pricing: &'static str,
    pub difficulty: Difficulty,
    pub build_time: &'static str,
    pub limits: ProviderLimits,
}

const ALL_FRAMEWORKS: &[Framework] = &[Framework::React, Framework::Vue, Framework::Vanilla];

pub static PROVIDER_CATALOG: [DeploymentProvider; 6] = [
    DeploymentProvider {
        id: ProviderId::Vercel,
        name: "Vercel",
        description: "Zero-configuration deployments with a global edge network",
        supported_frameworks: ALL_FRAMEWORKS,
        features: &[
            "Automatic HTTPS",
            "Preview deployments",
            "Edge network",
            "Serverless functions",
        ],
        pricing: "Free for hobby projects, Pro from $20/month",
        difficulty: Difficulty::Easy,
        build_time: "1-2 minutes",
        limits: ProviderLimits {
            sites: "Unlimited",
            bandwidth: "100GB/month",
            build_minutes: "6000/month",
        },
    },
    DeploymentProvider {
        id: ProviderId::Netlify,
        name: "Netlify",
        description: "Static hosting with built-in forms, redirects and edge functions",
        supported_frameworks: ALL_FRAMEWORKS,
        features: &[
            "Form handling",
            "Split testing",
            "Deploy previews",
            "Redirect rules",
        ],
        pricing: "Free starter tier, Pro from $19/month",
        difficulty: Difficulty::Easy,
        build_time: "1-3 minutes",
        limits: ProviderLimits {
            sites: "Unlimited",
            bandwidth: "100GB/month",
            build_minutes: "300/month",
        },
    },
    DeploymentProvider {
        id: ProviderId::GithubPages,
        name: "GitHub Pages",
        description: "Static site hosting straight from a GitHub repository",
        supported_frameworks: ALL_FRAMEWORKS,
        features: &["Free hosting", "Custom domains", "Git-based publishing"],
        pricing: "Free for public repositories",
        difficulty: Difficulty::Moderate,
        build_time: "2-5 minutes",
        limits: ProviderLimits {
            sites: "1 per repository",
            bandwidth: "100GB/month (soft)",
            build_minutes: "10 builds/hour",
        },
    },
    DeploymentProvider {
        id: ProviderId::Heroku,
        name: "Heroku",
        description: "Container-based platform for full-stack applications",
        supported_frameworks: ALL_FRAMEWORKS,
        features: &["Add-on marketplace", "Process scaling", "Managed runtimes"],
        pricing: "Eco dynos from $5/month",
        difficulty: Difficulty::Moderate,
        build_time: "3-6 minutes",
        limits: ProviderLimits {
            sites: "Per dyno plan",
            bandwidth: "2TB/month",
            build_minutes: "Unmetered",
        },
    },
    DeploymentProvider {
        id: ProviderId::AwsAmplify,
        name: "AWS Amplify",
        description: "Full-stack hosting integrated with AWS services",
        supported_frameworks: ALL_FRAMEWORKS,
        features: &[
            "Branch deployments",
            "AWS integration",
            "Server-side rendering",
        ],
        pricing: "Pay as you go, free tier for 12 months",
        difficulty: Difficulty::Advanced,
        build_time: "3-5 minutes",
        limits: ProviderLimits {
            sites: "Unlimited",
            bandwidth: "15GB/month (free tier)",
            build_minutes: "1000/month (free tier)",
        },
    },
    DeploymentProvider {
        id: ProviderId::Firebase,
        name: "Firebase Hosting",
        description: "Fast static hosting backed by Google's CDN",
        supported_frameworks: ALL_FRAMEWORKS,
        features: &["Global CDN", "Preview channels", "One-command rollbacks"],
        pricing: "Free Spark plan, Blaze pay as you go",
        difficulty: Difficulty::Easy,
        build_time: "1-2 minutes",
        limits: ProviderLimits {
            sites: "36 per project",
            bandwidth: "10GB/month (Spark)",
            build_minutes: "N/A",
        },
    },
];

pub fn find_provider(id: ProviderId) -> &'static DeploymentProvider {
    // The catalog holds exactly one entry per `ProviderId` variant.
    PROVIDER_CATALOG
        .iter()
        .find(|p| p.id == id)
        .unwrap_or(&PROVIDER_CATALOG[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_every_provider_once() {
        for id in ProviderId::ALL {
            let count = PROVIDER_CATALOG.iter().filter(|p| p.id == id).count();
            assert_eq!(count, 1, "{id}");
            assert_eq!(find_provider(id).id, id);
        }
    }

    #[test]
    fn parse_provider_ids() {
        assert_eq!("github-pages".parse::<ProviderId>().unwrap(), ProviderId::GithubPages);
        assert_eq!("aws-amplify".parse::<ProviderId>().unwrap(), ProviderId::AwsAmplify);
        assert!("unknown-provider".parse::<ProviderId>().is_err());
        assert!("Vercel".parse::<ProviderId>().is_err());
    }

    #[test]
    fn provider_id_wire_format() {
        assert_eq!(
            serde_json::to_string(&ProviderId::GithubPages).unwrap(),
            "\"github-pages\""
        );
        let fw: Framework = serde_json::from_str("\"vanilla\"").unwrap();
        assert_eq!(fw, Framework::Vanilla);
    }
}
