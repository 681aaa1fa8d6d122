//! Create a new post, page or draft

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::content::FrontMatter;
use crate::Folio;

/// Create a new post/page/draft, returning the written file
pub fn create_document(folio: &Folio, title: &str, layout: &str, path: Option<&str>) -> Result<PathBuf> {
    let now = chrono::Local::now();
    let slug = match path {
        Some(p) => p.trim_end_matches(".md").to_string(),
        None => slug::slugify(title),
    };
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a file name from title {:?}", title);
    }

    let file_path = match layout {
        "draft" => folio.source_dir.join("_drafts").join(format!("{}.md", slug)),
        "page" => folio.source_dir.join(format!("{}.md", slug)),
        _ => folio
            .source_dir
            .join("_posts")
            .join(format!("{}-{}.md", now.format("%Y-%m-%d"), slug)),
    };

    // Check if file already exists
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let front_matter = FrontMatter {
        // drafts become posts once published
        layout: Some(if layout == "draft" { "post" } else { layout }.to_string()),
        title: Some(title.to_string()),
        permalink: (layout == "page").then(|| format!("/{}/", slug)),
        date: (layout != "page").then(|| now.format("%Y-%m-%d %H:%M:%S %z").to_string()),
        ..Default::default()
    };
    let content = format!("---\n{}---\n\n", front_matter.to_yaml()?);

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;

    tracing::info!("Created {:?}", file_path);

    Ok(file_path)
}

/// Run the new command
pub fn run(folio: &Folio, title: &str, layout: Option<&str>) -> Result<PathBuf> {
    create_document(folio, title, layout.unwrap_or("post"), None)
}
