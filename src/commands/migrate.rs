//! Copy every document verbatim into another content tree

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::content::loader::ContentLoader;
use crate::content::Document;
use crate::Folio;

/// What a migration wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Files written
    pub written: usize,
    /// Of those, files produced by splitting concatenated sections
    pub split: usize,
}

/// Migrate the site content into `out_dir`
///
/// Nothing is written unless every document parses. Files holding several
/// concatenated sections abort the run unless `split` is set, in which case
/// each extra section becomes its own file.
pub fn run(folio: &Folio, out_dir: &Path, split: bool) -> Result<Summary> {
    let source_dir = resolve(&folio.source_dir)?;
    let target_dir = resolve(out_dir)?;
    if target_dir.starts_with(&source_dir) {
        anyhow::bail!(
            "Output directory {:?} must be outside the source directory {:?}",
            out_dir,
            folio.source_dir
        );
    }

    let site = ContentLoader::new(folio).load()?;
    if let Some(failure) = site.failures.first() {
        anyhow::bail!("Cannot read {}: {}", failure.source, failure.message);
    }

    let mut planned: Vec<(Document, bool)> = Vec::new();
    let mut concatenated = Vec::new();

    for file in &site.files {
        let document = file
            .parse()
            .with_context(|| format!("Cannot migrate {}", file.source))?;

        if document.to_source() != file.text {
            anyhow::bail!("{} does not survive re-serialization", file.source);
        }

        let sections = document.sections();
        if sections.is_empty() {
            planned.push((document, false));
        } else if split {
            tracing::info!(
                "Splitting {} into {} documents",
                document.source,
                sections.len() + 1
            );
            let mut parts = document
                .split_sections()
                .with_context(|| format!("Cannot split {}", file.source))?
                .into_iter();
            if let Some(first) = parts.next() {
                planned.push((first, false));
            }
            planned.extend(parts.map(|part| (part, true)));
        } else {
            concatenated.push(format!("{} (line {})", document.source, sections[0].line));
        }
    }

    if !concatenated.is_empty() {
        anyhow::bail!(
            "{} file(s) contain concatenated front-matter sections, rerun with --split to write them as separate documents: {}",
            concatenated.len(),
            concatenated.join(", ")
        );
    }

    let mut targets = BTreeSet::new();
    for (document, _) in &planned {
        if !targets.insert(document.source.clone()) {
            anyhow::bail!("Two documents would be written to {}", document.source);
        }
    }

    let mut summary = Summary::default();
    for (document, from_split) in &planned {
        let target = target_dir.join(&document.source);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, document.to_source())
            .with_context(|| format!("Failed to write {:?}", target))?;
        tracing::debug!("Wrote {:?}", target);

        summary.written += 1;
        if *from_split {
            summary.split += 1;
        }
    }

    tracing::info!(
        "Migrated {} documents to {:?} ({} from split sections)",
        summary.written,
        target_dir,
        summary.split
    );

    Ok(summary)
}

/// Absolute, symlink-free form of a path that may not exist yet
fn resolve(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = absolute.as_path();
    let mut rest = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }

    let mut resolved = existing.canonicalize()?;
    for name in rest.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}
