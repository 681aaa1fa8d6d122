//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

const CONFIG_TEMPLATE: &str = r#"# Site
title: My Portfolio
description: ''
author: ''

# URL
url: ''
baseurl: ''
permalink: date

# Reading
source: .
exclude:
  - README.md
  - CHANGELOG.md
  - LICENSE*
  - Gemfile*
  - node_modules/**
  - vendor/**
markdown_ext: markdown,mkdown,mkdn,mkd,md

# Checks
required_keys:
  - layout
layouts: []
duplicate_sections: error
"#;

const ABOUT_PAGE: &str = r#"---
layout: page
title: About Me
permalink: /about/
---

Write a few words about yourself here.
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("A site already exists in {:?}", target_dir);
    }

    fs::create_dir_all(target_dir.join("_posts"))?;
    fs::create_dir_all(target_dir.join("_drafts"))?;

    fs::write(&config_path, CONFIG_TEMPLATE)?;

    let about_path = target_dir.join("about.md");
    if !about_path.exists() {
        fs::write(&about_path, ABOUT_PAGE)?;
    }

    let today = chrono::Local::now().format("%Y-%m-%d");
    let sample_post = format!(
        r#"---
layout: post
title: Hello, Optionals
date: {}
---

Swift optionals say "there may be no value here".

```swift
let nickname: String? = nil
print(nickname ?? "anonymous")
```
"#,
        today
    );
    fs::write(
        target_dir
            .join("_posts")
            .join(format!("{}-hello-optionals.md", today)),
        sample_post,
    )?;

    tracing::debug!("Wrote configuration, about page and sample post");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Folio;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_a_clean_site() {
        let dir = TempDir::new().unwrap();
        init_site(dir.path()).unwrap();

        assert!(dir.path().join("_drafts").is_dir());
        let about = fs::read_to_string(dir.path().join("about.md")).unwrap();
        assert!(about.contains("permalink: /about/"));

        let folio = Folio::new(dir.path()).unwrap();
        assert_eq!(folio.config.title, "My Portfolio");
        let report = folio.check().unwrap();
        assert_eq!(report.documents, 2);
        assert!(report.diagnostics.is_empty(), "{}", report.render_text());
    }

    #[test]
    fn test_init_refuses_existing_site() {
        let dir = TempDir::new().unwrap();
        init_site(dir.path()).unwrap();
        assert!(init_site(dir.path()).is_err());
    }
}
