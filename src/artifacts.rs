//! Synthesis of the files a deployment ships: package manifest, build script,
//! env file, provider manifest and the simulated build output.

use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    error::DeployError,
    models::{DeploymentConfig, FileType, Framework, GeneratedProject, ProjectFile},
    providers::ProviderAdapter,
};

pub const PACKAGE_JSON: &str = "package.json";
pub const BUILD_SCRIPT: &str = "build.sh";
pub const ENV_FILE: &str = ".env";
pub const CDN_STYLESHEET: &str = "https://cdn.jsdelivr.net/npm/tailwindcss@2.2.19/dist/tailwind.min.css";

/// Project files plus everything synthesized for the target provider.
#[derive(Debug, Clone)]
pub struct PreparedFiles {
    pub files: Vec<ProjectFile>,
    /// Paths written during preparation, in the order they were generated.
    pub generated: Vec<String>,
}

impl PreparedFiles {
    pub fn file(&self, path: &str) -> Option<&ProjectFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn total_size(&self) -> usize {
        total_size(&self.files)
    }
}

/// Appends provider and generic configuration to the project's files.
pub fn prepare_files(
    project: &GeneratedProject,
    config: &DeploymentConfig,
    adapter: Option<&dyn ProviderAdapter>,
) -> Result<PreparedFiles, DeployError> {
    let mut prepared = PreparedFiles {
        files: project.files.clone(),
        generated: Vec::new(),
    };

    if let Some(manifest) = adapter
        .map(|a| a.prepare_config(project, config))
        .transpose()?
        .flatten()
    {
        push_generated(&mut prepared, manifest);
    }

    if project.file(PACKAGE_JSON).is_none() {
        push_generated(&mut prepared, package_json(project, config)?);
    }

    push_generated(&mut prepared, build_script(config));

    if let Some(env) = env_file(&config.environment_variables) {
        push_generated(&mut prepared, env);
    }

    Ok(prepared)
}

fn push_generated(prepared: &mut PreparedFiles, file: ProjectFile) {
    prepared.generated.push(file.path.clone());
    upsert(&mut prepared.files, file);
}

/// Replaces the file at the same path, or appends it.
pub fn upsert(files: &mut Vec<ProjectFile>, file: ProjectFile) {
    match files.iter_mut().find(|f| f.path == file.path) {
        Some(existing) => *existing = file,
        None => files.push(file),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson<'a> {
    name: String,
    version: &'static str,
    private: bool,
    scripts: PackageScripts<'a>,
    dependencies: &'a IndexMap<String, String>,
    dev_dependencies: &'a IndexMap<String, String>,
}

#[derive(Serialize)]
struct PackageScripts<'a> {
    build: &'a str,
    start: String,
    dev: &'static str,
}

pub fn package_json(
    project: &GeneratedProject,
    config: &DeploymentConfig,
) -> Result<ProjectFile, DeployError> {
    let dev = match project.framework.unwrap_or(config.framework) {
        Framework::React | Framework::Vue => "vite",
        Framework::Vanilla => "npx serve .",
    };
    let manifest = PackageJson {
        name: config.subdomain(),
        version: "1.0.0",
        private: true,
        scripts: PackageScripts {
            build: &config.build_command,
            start: format!("npx serve {}", config.output_directory),
            dev,
        },
        dependencies: &project.dependencies,
        dev_dependencies: &project.dev_dependencies,
    };
    Ok(ProjectFile::new(
        PACKAGE_JSON,
        serde_json::to_string_pretty(&manifest)?,
        FileType::Config,
    )
    .with_description("Package manifest"))
}

pub fn build_script(config: &DeploymentConfig) -> ProjectFile {
    let content = format!(
        "#!/bin/sh\nset -e\n\necho \"Building {name}\"\nnpm install\n{command}\necho \"Output written to {output}\"\n",
        name = config.subdomain(),
        command = config.build_command,
        output = config.output_directory,
    );
    ProjectFile::new(BUILD_SCRIPT, content, FileType::Config).with_description("Build script")
}

/// `KEY=VALUE` lines in insertion order; `None` when there is nothing to write.
pub fn env_file(vars: &IndexMap<String, String>) -> Option<ProjectFile> {
    if vars.is_empty() {
        return None;
    }
    let content = vars
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n");
    Some(ProjectFile::new(ENV_FILE, content, FileType::Config).with_description("Environment variables"))
}

fn normalize_output_dir(dir: &str) -> Result<&str, DeployError> {
    let dir = dir.trim().trim_end_matches('/');
    if dir.is_empty() {
        return Err(DeployError::Build("output directory is empty".to_string()));
    }
    if dir.starts_with('/') || dir.split('/').any(|part| part == "..") {
        return Err(DeployError::Build(format!(
            "output directory {:?} must stay inside the project",
            dir
        )));
    }
    Ok(dir)
}

/// Simulated compile: moves `src/` into the output directory and writes an
/// `index.html` entry point. `files` is the prepared file set of `project`.
pub fn build_output(
    project: &GeneratedProject,
    files: &[ProjectFile],
    config: &DeploymentConfig,
) -> Result<Vec<ProjectFile>, DeployError> {
    if project.files.is_empty() {
        return Err(DeployError::Build("project contains no files".to_string()));
    }
    let mut seen = std::collections::HashSet::new();
    if let Some(dup) = files.iter().find(|f| !seen.insert(f.path.as_str())) {
        return Err(DeployError::Build(format!("duplicate file path {}", dup.path)));
    }
    let out_dir = normalize_output_dir(&config.output_directory)?;

    let mut output: Vec<ProjectFile> = files
        .iter()
        .map(|f| match f.path.strip_prefix("src/") {
            Some(rest) => ProjectFile {
                path: format!("{}/{}", out_dir, rest),
                ..f.clone()
            },
            None => f.clone(),
        })
        .collect();

    let styles: Vec<&str> = files
        .iter()
        .filter(|f| f.is_stylesheet())
        .map(|f| f.content.as_str())
        .collect();
    let scripts: Vec<&str> = files
        .iter()
        .filter(|f| f.is_script())
        .map(|f| f.content.as_str())
        .collect();

    let index = ProjectFile::new(
        format!("{}/index.html", out_dir),
        render_index_html(&config.project_name, &styles, &scripts),
        FileType::Page,
    )
    .with_description("Generated entry point");
    upsert(&mut output, index);

    Ok(output)
}

pub fn render_index_html(title: &str, styles: &[&str], scripts: &[&str]) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("  <meta charset=\"UTF-8\">\n");
    html.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html.push_str(&format!("  <title>{}</title>\n", escape_html(title)));
    html.push_str(&format!("  <link rel=\"stylesheet\" href=\"{}\">\n", CDN_STYLESHEET));
    if !styles.is_empty() {
        html.push_str("  <style>\n");
        html.push_str(&styles.join("\n"));
        html.push_str("\n  </style>\n");
    }
    html.push_str("</head>\n<body>\n  <div id=\"root\"></div>\n");
    for script in scripts {
        html.push_str("  <script>\n");
        html.push_str(script);
        html.push_str("\n  </script>\n");
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn total_size(files: &[ProjectFile]) -> usize {
    files.iter().map(|f| f.content.len()).sum()
}

/// Human-readable size: whole kilobytes below 1MB, one decimal above.
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let bytes = bytes as f64;
    if bytes < MB {
        format!("{:.0}KB", bytes / KB)
    } else {
        format!("{:.1}MB", bytes / MB)
    }
}
