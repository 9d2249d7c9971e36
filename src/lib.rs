pub mod api;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod providers;
pub mod slack_client;
pub mod store;
pub mod timing;

pub use crate::config::Config;
pub use error::DeployError;
pub use models::*;
pub use orchestrator::{DeploymentManager, ProgressCallback};
pub use providers::{ProviderAdapter, ProviderRegistry};
pub use store::StatusStore;

const MAX_LABEL_LEN: usize = 63;

/// Turns a free-form project name into a DNS label usable as a subdomain.
/// Lowercases, collapses every run of non-alphanumerics into one `-` and
/// trims dashes from both ends. Falls back to "app" when nothing is left.
pub fn sanitize_project_name(name: &str) -> String {
    let mut label = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            label.push(c.to_ascii_lowercase());
        } else if !label.ends_with('-') {
            label.push('-');
        }
    }
    let mut label: String = label.trim_matches('-').chars().take(MAX_LABEL_LEN).collect();
    while label.ends_with('-') {
        label.pop();
    }
    if label.is_empty() {
        return "app".to_string();
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_project_name() {
        assert_eq!(sanitize_project_name("My App!"), "my-app");
        assert_eq!(sanitize_project_name("feature/Branch"), "feature-branch");
        assert_eq!(sanitize_project_name("  Hello   World  "), "hello-world");
        assert_eq!(sanitize_project_name("café_menu"), "caf-menu");
        assert_eq!(sanitize_project_name("!!!"), "app");
        assert_eq!(sanitize_project_name(""), "app");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for name in ["My App!", "a--b", "UPPER_case 42", "-x-"] {
            let once = sanitize_project_name(name);
            assert_eq!(sanitize_project_name(&once), once);
        }
    }

    #[test]
    fn sanitize_truncates_to_dns_label_length() {
        let long = format!("{}-{}", "a".repeat(62), "b".repeat(10));
        let label = sanitize_project_name(&long);
        assert_eq!(label.len(), 62);
        assert!(!label.ends_with('-'));
    }
}
