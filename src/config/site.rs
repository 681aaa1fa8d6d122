//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::check::Severity;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,

    // URL
    pub url: String,
    pub baseurl: String,
    /// Permalink style (`date`, `pretty`, `ordinal`, `none`) or a custom pattern
    pub permalink: String,

    // Reading
    pub source: String,
    pub exclude: Vec<String>,
    /// Comma separated list of Markdown extensions
    pub markdown_ext: String,

    // Checks
    /// Front-matter keys every document must set
    pub required_keys: Vec<String>,
    /// Known layout names; empty accepts any layout
    pub layouts: Vec<String>,
    /// How concatenated front-matter sections are reported
    pub duplicate_sections: Severity,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Portfolio".to_string(),
            description: String::new(),
            author: String::new(),

            url: String::new(),
            baseurl: String::new(),
            permalink: "date".to_string(),

            source: ".".to_string(),
            exclude: vec![
                "README.md".to_string(),
                "CHANGELOG.md".to_string(),
                "LICENSE*".to_string(),
                "Gemfile*".to_string(),
                "node_modules/**".to_string(),
                "vendor/**".to_string(),
            ],
            markdown_ext: "markdown,mkdown,mkdn,mkd,md".to_string(),

            required_keys: vec!["layout".to_string()],
            layouts: Vec::new(),
            duplicate_sections: Severity::Error,

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Markdown extensions, lowercased and without dots
    pub fn markdown_extensions(&self) -> Vec<String> {
        self.markdown_ext
            .split(',')
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }

    /// Check if a file has one of the configured Markdown extensions
    pub fn is_markdown(&self, path: &Path) -> bool {
        let extensions = self.markdown_extensions();
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|ext| ext.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    /// Compile the `exclude` globs, skipping invalid ones
    pub fn exclude_patterns(&self) -> Vec<glob::Pattern> {
        self.exclude
            .iter()
            .filter_map(|pattern| match glob::Pattern::new(pattern) {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!("Ignoring invalid exclude pattern {:?}: {}", pattern, e);
                    None
                }
            })
            .collect()
    }

    /// `baseurl` with a leading slash and no trailing slash ("" for the root)
    pub fn normalized_baseurl(&self) -> String {
        let base = self.baseurl.trim_matches('/');
        if base.is_empty() {
            String::new()
        } else {
            format!("/{}", base)
        }
    }
}
