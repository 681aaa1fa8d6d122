//! Content loader - finds and reads documents under the site source

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::{ContentError, Document, DocumentKind};
use crate::Folio;

/// Directories whose Markdown files are documents despite the `_` prefix
const POSTS_DIR: &str = "_posts";
const DRAFTS_DIR: &str = "_drafts";

/// A content file read from disk, not yet parsed
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path relative to the source directory, `/` separated
    pub source: String,
    pub full_source: PathBuf,
    pub kind: DocumentKind,
    pub text: String,
}

impl SourceFile {
    /// Parse the file into a document
    pub fn parse(&self) -> Result<Document, ContentError> {
        let mut document = Document::parse(self.source.clone(), self.kind, &self.text)?;
        document.full_source = self.full_source.clone();
        Ok(document)
    }
}

/// A file that looked like content but could not be read
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub source: String,
    pub message: String,
}

/// Everything found under the source directory
#[derive(Debug, Clone, Default)]
pub struct LoadedSite {
    pub files: Vec<SourceFile>,
    pub failures: Vec<LoadFailure>,
}

/// Loads content from the source directory
pub struct ContentLoader<'a> {
    folio: &'a Folio,
    excludes: Vec<glob::Pattern>,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(folio: &'a Folio) -> Self {
        let excludes = folio.config.exclude_patterns();
        Self { folio, excludes }
    }

    /// Read every content file, keeping unreadable ones as failures
    pub fn load(&self) -> Result<LoadedSite> {
        let source_dir = &self.folio.source_dir;
        if !source_dir.is_dir() {
            anyhow::bail!("Source directory not found: {:?}", source_dir);
        }

        let mut site = LoadedSite::default();

        let walker = WalkDir::new(source_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_skipped_dir(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    if let Some(failure) = self.walk_failure(&e) {
                        tracing::warn!("Failed to read {}: {}", failure.source, e);
                        site.failures.push(failure);
                    }
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() || !self.folio.config.is_markdown(path) {
                continue;
            }

            let source = relative_source(source_dir, path);
            if self.is_excluded(&source) {
                tracing::debug!("Excluded {}", source);
                continue;
            }

            match fs::read_to_string(path) {
                Ok(text) => site.files.push(SourceFile {
                    kind: classify(&source),
                    source,
                    full_source: path.to_path_buf(),
                    text,
                }),
                Err(e) => {
                    tracing::warn!("Failed to read {:?}: {}", path, e);
                    site.failures.push(LoadFailure {
                        source,
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            "Loaded {} content files ({} unreadable)",
            site.files.len(),
            site.failures.len()
        );

        Ok(site)
    }

    /// Load and parse every document, skipping the ones that fail
    pub fn load_documents(&self) -> Result<Vec<Document>> {
        let site = self.load()?;
        let mut documents = Vec::new();

        for file in &site.files {
            match file.parse() {
                Ok(document) => documents.push(document),
                Err(e) => {
                    tracing::warn!("Failed to load document {}: {}", file.source, e);
                }
            }
        }

        Ok(documents)
    }

    /// Hidden directories, generator output and `_` directories other than posts/drafts
    fn is_skipped_dir(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        if name == POSTS_DIR || name == DRAFTS_DIR {
            return false;
        }
        if name.starts_with('.') || name.starts_with('_') {
            return true;
        }
        let source = relative_source(&self.folio.source_dir, entry.path());
        self.is_excluded(&source) || self.is_excluded(&format!("{}/", source))
    }

    /// A walk error that hides content: a broken link to a Markdown file or an
    /// unreadable directory
    fn walk_failure(&self, error: &walkdir::Error) -> Option<LoadFailure> {
        let path = error.path()?;
        let name = path.file_name()?.to_string_lossy();
        if name.starts_with('.') {
            return None;
        }
        if path.extension().is_some() && !self.folio.config.is_markdown(path) {
            return None;
        }

        let source = relative_source(&self.folio.source_dir, path);
        if self.is_excluded(&source) {
            return None;
        }
        Some(LoadFailure {
            source,
            message: error.to_string(),
        })
    }

    fn is_excluded(&self, source: &str) -> bool {
        self.excludes.iter().any(|p| p.matches(source))
    }
}

/// Path relative to the source directory with `/` separators
fn relative_source(source_dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(source_dir).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Decide the document kind from its location
pub fn classify(source: &str) -> DocumentKind {
    let mut dirs: Vec<&str> = source.split('/').collect();
    dirs.pop();
    if dirs.contains(&POSTS_DIR) {
        DocumentKind::Post
    } else if dirs.contains(&DRAFTS_DIR) {
        DocumentKind::Draft
    } else {
        DocumentKind::Page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("_posts/2016-01-01-a.md"), DocumentKind::Post);
        assert_eq!(classify("swift/_posts/2016-01-01-a.md"), DocumentKind::Post);
        assert_eq!(classify("_drafts/a.md"), DocumentKind::Draft);
        assert_eq!(classify("about.md"), DocumentKind::Page);
        assert_eq!(classify("_posts.md"), DocumentKind::Page);
    }

    #[test]
    fn test_load_walks_source() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "about.md", "---\nlayout: page\n---\n");
        write(root, "_posts/2016-01-01-optionals.md", "---\nlayout: post\n---\n");
        write(root, "_drafts/operators.markdown", "---\nlayout: post\n---\n");
        write(root, "_layouts/post.md", "not content");
        write(root, "_site/about.md", "generated");
        write(root, ".git/notes.md", "hidden");
        write(root, "README.md", "# readme");
        write(root, "css/style.css", "body {}");
        write(root, "node_modules/pkg/readme.md", "dependency");

        let folio = Folio::new(root).unwrap();
        let site = ContentLoader::new(&folio).load().unwrap();
        let sources: Vec<_> = site.files.iter().map(|f| f.source.as_str()).collect();

        assert_eq!(
            sources,
            vec![
                "_drafts/operators.markdown",
                "_posts/2016-01-01-optionals.md",
                "about.md"
            ]
        );
        assert_eq!(site.files[0].kind, DocumentKind::Draft);
        assert_eq!(site.files[1].kind, DocumentKind::Post);
        assert_eq!(site.files[2].kind, DocumentKind::Page);
        assert!(site.failures.is_empty());
    }

    #[test]
    fn test_unreadable_file_is_a_failure() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("binary.md"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let folio = Folio::new(dir.path()).unwrap();
        let site = ContentLoader::new(&folio).load().unwrap();
        assert!(site.files.is_empty());
        assert_eq!(site.failures.len(), 1);
        assert_eq!(site.failures[0].source, "binary.md");
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_link_is_a_failure() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "about.md", "---\nlayout: page\n---\n");
        std::os::unix::fs::symlink(
            dir.path().join("missing.md"),
            dir.path().join("optionals.md"),
        )
        .unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.css"), dir.path().join("style.css"))
            .unwrap();

        let folio = Folio::new(dir.path()).unwrap();
        let site = ContentLoader::new(&folio).load().unwrap();
        assert_eq!(site.files.len(), 1);
        assert_eq!(site.failures.len(), 1);
        assert_eq!(site.failures[0].source, "optionals.md");

        let report = folio.check().unwrap();
        assert!(report.has_errors());
    }

    #[test]
    fn test_load_documents_skips_broken() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "about.md", "---\nlayout: page\n---\n");
        write(dir.path(), "broken.md", "no header here\n");

        let folio = Folio::new(dir.path()).unwrap();
        let documents = ContentLoader::new(&folio).load_documents().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].source, "about.md");
        assert_eq!(documents[0].full_source, dir.path().join("about.md"));
    }
}
