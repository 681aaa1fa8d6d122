//! List site content

use anyhow::Result;

use crate::content::loader::ContentLoader;
use crate::content::{permalink, Document, DocumentKind};
use crate::Folio;

/// Render one listing line for a document
pub fn describe(folio: &Folio, document: &Document) -> String {
    let date = document
        .front_matter
        .parse_date()
        .map(|d| d.date())
        .or_else(|| permalink::parse_post_name(document.stem()).map(|p| p.date))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "----------".to_string());
    let link = permalink::derive(document, &folio.config)
        .map(|p| {
            if folio.config.url.is_empty() {
                p.to_string()
            } else {
                p.url(&folio.config)
            }
        })
        .unwrap_or_else(|| "(no permalink)".to_string());

    format!(
        "  {} [{}] {} -> {} ({} code blocks, {} words) [{}]",
        date,
        document.layout().unwrap_or("-"),
        document.title(),
        link,
        document.code_blocks().len(),
        document.word_count(),
        document.source
    )
}

/// List site content by type
pub fn run(folio: &Folio, content_type: &str) -> Result<()> {
    let kinds: &[DocumentKind] = match content_type {
        "post" | "posts" => &[DocumentKind::Post],
        "page" | "pages" => &[DocumentKind::Page],
        "draft" | "drafts" => &[DocumentKind::Draft],
        "all" => &[DocumentKind::Page, DocumentKind::Post, DocumentKind::Draft],
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, page, draft, all",
                content_type
            );
        }
    };

    let documents = ContentLoader::new(folio).load_documents()?;

    for kind in kinds {
        let mut matching: Vec<&Document> = documents.iter().filter(|d| d.kind == *kind).collect();
        if *kind == DocumentKind::Post {
            // newest first
            matching.sort_by(|a, b| b.stem().cmp(a.stem()));
        }

        let label = match kind {
            DocumentKind::Post => "Posts",
            DocumentKind::Page => "Pages",
            DocumentKind::Draft => "Drafts",
        };
        println!("{} ({}):", label, matching.len());
        for document in matching {
            println!("{}", describe(folio, document));
        }
    }

    Ok(())
}
