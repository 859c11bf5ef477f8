use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// A portfolio entry as shown in the "Projects" section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    /// URL or embedded image reference.
    pub image: String,
    /// Display order is insertion order; duplicates are allowed.
    pub tech_stack: Vec<String>,
    pub live_url: String,
    pub github_url: String,
}

/// A project that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub image: String,
    pub tech_stack: Vec<String>,
    pub live_url: String,
    pub github_url: String,
}

/// Partial update with merge semantics: `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
}

/// Immutable copy of the store state handed to readers and observers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectsSnapshot {
    pub projects: Vec<Project>,
    pub loading: bool,
}

impl Project {
    pub fn apply(&mut self, update: &ProjectUpdate) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(image) = &update.image {
            self.image = image.clone();
        }
        if let Some(tech_stack) = &update.tech_stack {
            self.tech_stack = tech_stack.clone();
        }
        if let Some(live_url) = &update.live_url {
            self.live_url = live_url.clone();
        }
        if let Some(github_url) = &update.github_url {
            self.github_url = github_url.clone();
        }
    }
}

impl NewProject {
    pub fn into_project(self, id: String) -> Project {
        Project {
            id,
            title: self.title,
            description: self.description,
            image: self.image,
            tech_stack: self.tech_stack,
            live_url: self.live_url,
            github_url: self.github_url,
        }
    }

    /// Input-boundary check run by callers before a draft reaches the store.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("title", &self.title),
            ("description", &self.description),
            ("image", &self.image),
            ("liveUrl", &self.live_url),
            ("githubUrl", &self.github_url),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        if self.tech_stack.iter().any(|tech| tech.trim().is_empty()) {
            return Err(StoreError::Validation(
                "techStack entries must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self.field_paths().is_empty()
    }

    /// Wire names of the fields this update sets.
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.title.is_some() {
            paths.push("title");
        }
        if self.description.is_some() {
            paths.push("description");
        }
        if self.image.is_some() {
            paths.push("image");
        }
        if self.tech_stack.is_some() {
            paths.push("techStack");
        }
        if self.live_url.is_some() {
            paths.push("liveUrl");
        }
        if self.github_url.is_some() {
            paths.push("githubUrl");
        }
        paths
    }
}
