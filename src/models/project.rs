use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::provider::Framework;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Component,
    Page,
    Style,
    Config,
    Api,
    Test,
    Other,
}

/// A virtual file produced by code generation. Paths are slash-separated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub path: String,
    pub content: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProjectFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>, file_type: FileType) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            file_type,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_stylesheet(&self) -> bool {
        self.file_type == FileType::Style || self.path.ends_with(".css")
    }

    pub fn is_script(&self) -> bool {
        self.path.ends_with(".js") || self.path.ends_with(".mjs")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedProject {
    pub files: Vec<ProjectFile>,
    #[serde(default)]
    pub framework: Option<Framework>,
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: IndexMap<String, String>,
}

impl GeneratedProject {
    pub fn new(files: Vec<ProjectFile>) -> Self {
        Self {
            files,
            ..Default::default()
        }
    }

    pub fn with_framework(mut self, framework: Framework) -> Self {
        self.framework = Some(framework);
        self
    }

    pub fn file(&self, path: &str) -> Option<&ProjectFile> {
        self.files.iter().find(|f| f.path == path)
    }
}
