//! folio: content tooling for a Markdown portfolio/blog site
//!
//! This crate reads the Markdown documents of a Jekyll-style site (pages,
//! `_posts/` and `_drafts/`), parses their front-matter, checks their
//! integrity and migrates them verbatim into another content tree. Rendering
//! is left to the site generator.

pub mod check;
pub mod commands;
pub mod config;
pub mod content;

use anyhow::Result;
use std::path::Path;

/// Name of the site configuration file
pub const CONFIG_FILE: &str = "_config.yml";

/// A site on disk
#[derive(Clone)]
pub struct Folio {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Source directory holding the content
    pub source_dir: std::path::PathBuf,
}

impl Folio {
    /// Open the site rooted at a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            tracing::debug!("Loading configuration from {:?}", config_path);
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let source_dir = match config.source.trim() {
            "" | "." | "./" => base_dir.clone(),
            source => base_dir.join(source),
        };

        Ok(Self {
            config,
            base_dir,
            source_dir,
        })
    }

    /// Check every document
    pub fn check(&self) -> Result<check::Report> {
        check::run(self)
    }

    /// Create a new document
    pub fn new_document(&self, title: &str, layout: Option<&str>) -> Result<std::path::PathBuf> {
        commands::new::run(self, title, layout)
    }

    /// Copy every document into another directory
    pub fn migrate(&self, out_dir: &Path, split: bool) -> Result<commands::migrate::Summary> {
        commands::migrate::run(self, out_dir, split)
    }
}
