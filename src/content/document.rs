//! Content document model

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::fences::{self, CodeBlock};
use super::frontmatter::{self, FrontMatter};
use super::ContentError;

/// Where a document lives in the site, by convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// A dated file under `_posts/`
    Post,
    /// An unpublished file under `_drafts/`
    Draft,
    /// Any other Markdown file
    Page,
}

/// A content document: one front-matter block followed by its body
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Source file path relative to the site source, `/` separated
    pub source: String,

    /// Full source file path
    #[serde(skip)]
    pub full_source: PathBuf,

    pub kind: DocumentKind,

    /// Parsed front-matter
    pub front_matter: FrontMatter,

    /// Markdown body
    #[serde(skip)]
    pub body: String,

    /// Line (1-based) on which the body starts
    pub body_line: usize,

    #[serde(skip)]
    raw: RawHeader,
}

/// Header text exactly as written, kept for re-serialization
#[derive(Debug, Clone)]
struct RawHeader {
    bom: bool,
    opening: String,
    header: String,
    closing: String,
}

/// A further front-matter-plus-body unit concatenated after the first one
#[derive(Debug, Clone)]
pub struct Section {
    /// Byte offset of the section's opening delimiter in the body
    pub offset: usize,
    /// Document line of the opening delimiter
    pub line: usize,
    pub front_matter: FrontMatter,
}

impl Document {
    /// Parse a document from its source text
    pub fn parse(
        source: impl Into<String>,
        kind: DocumentKind,
        text: &str,
    ) -> Result<Self, ContentError> {
        let split = frontmatter::split(text)?;
        let front_matter = FrontMatter::parse(split.header, 2)?;
        let source = source.into();

        Ok(Self {
            full_source: PathBuf::from(&source),
            source,
            kind,
            front_matter,
            body: split.body.to_string(),
            body_line: split.body_line,
            raw: RawHeader {
                bom: split.bom,
                opening: split.opening.to_string(),
                header: split.header.to_string(),
                closing: split.closing.to_string(),
            },
        })
    }

    /// Re-serialize the header and body
    pub fn to_source(&self) -> String {
        let mut out = String::with_capacity(
            self.raw.opening.len()
                + self.raw.header.len()
                + self.raw.closing.len()
                + self.body.len()
                + 3,
        );
        if self.raw.bom {
            out.push('\u{feff}');
        }
        out.push_str(&self.raw.opening);
        out.push_str(&self.raw.header);
        out.push_str(&self.raw.closing);
        out.push_str(&self.body);
        out
    }

    /// File name without its extension
    pub fn stem(&self) -> &str {
        Path::new(&self.source)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
    }

    /// Display title: front-matter title or the file stem
    pub fn title(&self) -> &str {
        self.front_matter.title.as_deref().unwrap_or_else(|| self.stem())
    }

    pub fn layout(&self) -> Option<&str> {
        self.front_matter.layout.as_deref()
    }

    /// Whether the document is meant to be published
    pub fn is_published(&self) -> bool {
        self.kind != DocumentKind::Draft && self.front_matter.is_published()
    }

    /// Fenced code blocks in the body, with document line numbers
    pub fn code_blocks(&self) -> Vec<CodeBlock> {
        fences::scan(&self.body)
            .into_iter()
            .map(|mut block| {
                block.line += self.body_line - 1;
                block
            })
            .collect()
    }

    pub fn word_count(&self) -> usize {
        self.body.split_whitespace().count()
    }

    /// Sections concatenated after the first one
    pub fn sections(&self) -> Vec<Section> {
        find_sections(&self.body)
            .into_iter()
            .map(|(offset, front_matter)| Section {
                offset,
                line: self.body_line + fences::line_of(&self.body, offset) - 1,
                front_matter,
            })
            .collect()
    }

    /// Split a file holding several concatenated sections into one document each
    ///
    /// The first document keeps the original source path; later ones get a
    /// `-2`, `-3`, ... suffix on the stem. Serializing the parts in order
    /// reproduces the original text.
    pub fn split_sections(&self) -> Result<Vec<Document>, ContentError> {
        let sections = self.sections();
        if sections.is_empty() {
            return Ok(vec![self.clone()]);
        }

        let mut first = self.clone();
        first.body = self.body[..sections[0].offset].to_string();
        let mut documents = vec![first];

        for (index, section) in sections.iter().enumerate() {
            let end = sections
                .get(index + 1)
                .map(|next| next.offset)
                .unwrap_or(self.body.len());
            let text = &self.body[section.offset..end];
            let source = suffixed_source(&self.source, index + 2);

            let mut document = Document::parse(source, self.kind, text)
                .map_err(|e| shift_error(e, section.line - 1))?;
            document.full_source = suffixed_path(&self.full_source, index + 2);
            documents.push(document);
        }

        Ok(documents)
    }
}

/// Find the byte offsets of extra sections in a body
///
/// A section starts at a `---` line outside any fenced code block whose
/// header parses as a mapping naming a layout or a title.
pub fn find_sections(body: &str) -> Vec<(usize, FrontMatter)> {
    let code: Vec<_> = fences::scan(body).into_iter().map(|b| b.range).collect();
    let in_code = |offset: usize| code.iter().any(|r| r.contains(&offset));

    let mut sections = Vec::new();
    let mut resume_at = 0;

    for (offset, line) in frontmatter::lines_with_offsets(body) {
        if offset < resume_at || !frontmatter::is_delimiter(line) || in_code(offset) {
            continue;
        }

        let Ok(split) = frontmatter::split(&body[offset..]) else {
            continue;
        };
        match FrontMatter::parse(split.header, 2) {
            Ok(fm) if fm.is_identifying() => {
                resume_at = offset + split.header_len();
                sections.push((offset, fm));
            }
            _ => {}
        }
    }

    sections
}

fn suffixed_source(source: &str, n: usize) -> String {
    let path = Path::new(source);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("untitled");
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}-{}.{}", stem, n, ext),
        None => format!("{}-{}", stem, n),
    };
    match source.rfind('/') {
        Some(pos) => format!("{}/{}", &source[..pos], name),
        None => name,
    }
}

fn suffixed_path(path: &Path, n: usize) -> PathBuf {
    let name = suffixed_source(
        path.file_name().and_then(|s| s.to_str()).unwrap_or("untitled"),
        n,
    );
    path.with_file_name(name)
}

fn shift_error(error: ContentError, by: usize) -> ContentError {
    match error {
        ContentError::MissingFrontMatter => ContentError::MissingFrontMatter,
        ContentError::UnclosedFrontMatter { line } => {
            ContentError::UnclosedFrontMatter { line: line + by }
        }
        ContentError::MalformedFrontMatter { line, message } => {
            ContentError::MalformedFrontMatter {
                line: line + by,
                message,
            }
        }
    }
}
