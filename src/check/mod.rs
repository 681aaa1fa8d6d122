//! Content integrity checks
//!
//! Every document is checked for a well-formed front-matter block carrying
//! the required keys, balanced code fences, a faithful re-serialization,
//! a valid post file name, concatenated duplicate sections and permalinks
//! that no other document claims.

mod report;

pub use report::{Diagnostic, Issue, Report, Severity};

use anyhow::Result;
use std::collections::BTreeMap;

use crate::config::SiteConfig;
use crate::content::loader::{ContentLoader, LoadedSite, SourceFile};
use crate::content::permalink::{self, parse_post_name};
use crate::content::{ContentError, Document, DocumentKind, FrontMatter};
use crate::Folio;

/// Check every document of the site
pub fn run(folio: &Folio) -> Result<Report> {
    let start = std::time::Instant::now();
    let site = ContentLoader::new(folio).load()?;
    let report = check_site(&site, &folio.config);
    tracing::info!(
        "Checked {} documents in {:.2}s",
        report.documents,
        start.elapsed().as_secs_f64()
    );
    Ok(report)
}

/// Check already loaded content
pub fn check_site(site: &LoadedSite, config: &SiteConfig) -> Report {
    let mut report = Report::default();
    // output path -> (source, permalink) of every document routed there
    let mut routes: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();

    for failure in &site.failures {
        report.documents += 1;
        report.push(Diagnostic::new(
            &failure.source,
            None,
            Severity::Error,
            Issue::Unreadable {
                message: failure.message.clone(),
            },
        ));
    }

    for file in &site.files {
        report.documents += 1;
        let document = match file.parse() {
            Ok(document) => document,
            Err(e) => {
                report.push(parse_failure(file, e));
                continue;
            }
        };

        check_document(&document, &file.text, config, &mut report);

        if !document.is_published() {
            continue;
        }
        if let Some(link) = permalink::derive(&document, config) {
            routes
                .entry(link.output_path())
                .or_default()
                .push((document.source.clone(), link.to_string()));
        }
    }

    for claimants in routes.values().filter(|c| c.len() > 1) {
        for (source, link) in claimants {
            let others: Vec<String> = claimants
                .iter()
                .filter(|(other, _)| other != source)
                .map(|(other, _)| other.clone())
                .collect();
            report.push(Diagnostic::new(
                source,
                None,
                Severity::Error,
                Issue::PermalinkCollision {
                    permalink: link.clone(),
                    others,
                },
            ));
        }
    }

    report.sort();
    report
}

fn parse_failure(file: &SourceFile, error: ContentError) -> Diagnostic {
    let line = Some(error.line());
    let issue = match error {
        ContentError::MissingFrontMatter => Issue::MissingFrontMatter,
        ContentError::UnclosedFrontMatter { .. } => Issue::UnclosedFrontMatter,
        ContentError::MalformedFrontMatter { message, .. } => {
            Issue::MalformedFrontMatter { message }
        }
    };
    Diagnostic::new(&file.source, line, Severity::Error, issue)
}

/// Run the per-document checks
pub fn check_document(
    document: &Document,
    original: &str,
    config: &SiteConfig,
    report: &mut Report,
) {
    let source = document.source.as_str();
    let fm = &document.front_matter;

    for key in &config.required_keys {
        if !fm.has_key(key) {
            report.push(Diagnostic::new(
                source,
                Some(1),
                Severity::Error,
                Issue::MissingKey { key: key.clone() },
            ));
        }
    }

    if let Some(layout) = document.layout() {
        if !config.layouts.is_empty() && !config.layouts.iter().any(|l| l == layout) {
            report.push(Diagnostic::new(
                source,
                Some(1),
                Severity::Warning,
                Issue::UnknownLayout {
                    layout: layout.to_string(),
                },
            ));
        }
    }

    if document.kind == DocumentKind::Post && parse_post_name(document.stem()).is_none() {
        report.push(Diagnostic::new(
            source,
            None,
            Severity::Error,
            Issue::InvalidPostFilename,
        ));
    }

    for block in document.code_blocks().into_iter().filter(|b| !b.closed) {
        report.push(Diagnostic::new(
            source,
            Some(block.line),
            Severity::Error,
            Issue::UnclosedFence {
                marker: block.marker,
            },
        ));
    }

    if let Some(line) = round_trip_mismatch(document, original) {
        report.push(Diagnostic::new(
            source,
            Some(line),
            Severity::Error,
            Issue::RoundTripMismatch,
        ));
    }

    for section in document.sections() {
        let same_title =
            section.front_matter.title.is_some() && section.front_matter.title == fm.title;
        report.push(Diagnostic::new(
            source,
            Some(section.line),
            config.duplicate_sections,
            Issue::DuplicateSection { same_title },
        ));
    }
}

/// First line where re-serialization departs from the original
///
/// Trailing whitespace and trailing blank lines are ignored. The parsed
/// header must also survive being written back out as YAML.
pub fn round_trip_mismatch(document: &Document, original: &str) -> Option<usize> {
    if let Some(line) = first_differing_line(original, &document.to_source()) {
        return Some(line);
    }

    let reparsed = document
        .front_matter
        .to_yaml()
        .ok()
        .and_then(|yaml| FrontMatter::parse(&yaml, 2).ok());
    if reparsed.as_ref() != Some(&document.front_matter) {
        return Some(1);
    }

    None
}

fn first_differing_line(a: &str, b: &str) -> Option<usize> {
    let normalize = |text: &str| {
        let mut lines: Vec<String> = text.lines().map(|l| l.trim_end().to_string()).collect();
        while lines.last().map(|l| l.is_empty()).unwrap_or(false) {
            lines.pop();
        }
        lines
    };
    let a = normalize(a);
    let b = normalize(b);

    let max = a.len().max(b.len());
    (0..max).find(|&i| a.get(i) != b.get(i)).map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::loader::{classify, LoadFailure};

    fn site(files: &[(&str, &str)]) -> LoadedSite {
        LoadedSite {
            files: files
                .iter()
                .map(|(source, text)| SourceFile {
                    source: source.to_string(),
                    full_source: source.into(),
                    kind: classify(source),
                    text: text.to_string(),
                })
                .collect(),
            failures: Vec::new(),
        }
    }

    fn issues(report: &Report) -> Vec<&Issue> {
        report.diagnostics.iter().map(|d| &d.issue).collect()
    }

    #[test]
    fn test_clean_site_passes() {
        let report = check_site(
            &site(&[
                ("about.md", "---\nlayout: page\ntitle: About Me\npermalink: /about/\n---\nHi\n"),
                (
                    "_posts/2016-02-01-optionals.md",
                    "---\nlayout: post\ntitle: Optionals\n---\n```swift\nlet x: Int? = nil\n```\n",
                ),
            ]),
            &SiteConfig::default(),
        );
        assert_eq!(report.documents, 2);
        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
        assert!(!report.has_errors());
    }

    #[test]
    fn test_missing_layout_and_header_problems() {
        let report = check_site(
            &site(&[
                ("a.md", "---\ntitle: No Layout\n---\n"),
                ("b.md", "# No header\n"),
                ("c.md", "---\nlayout: page\n"),
                ("d.md", "---\n- not\n- a mapping\n---\n"),
            ]),
            &SiteConfig::default(),
        );
        assert_eq!(
            issues(&report),
            vec![
                &Issue::MissingKey {
                    key: "layout".to_string()
                },
                &Issue::MissingFrontMatter,
                &Issue::UnclosedFrontMatter,
                &Issue::MalformedFrontMatter {
                    message: "front-matter must be a mapping of `key: value` pairs".to_string()
                },
            ]
        );
        assert_eq!(report.errors(), 4);
    }

    #[test]
    fn test_unclosed_fence_line() {
        let report = check_site(
            &site(&[(
                "_posts/2016-02-01-operators.md",
                "---\nlayout: post\n---\n\nText\n\n```swift\ninfix operator **\n",
            )]),
            &SiteConfig::default(),
        );
        assert_eq!(report.diagnostics.len(), 1);
        let diagnostic = &report.diagnostics[0];
        assert_eq!(diagnostic.line, Some(7));
        assert_eq!(
            diagnostic.issue,
            Issue::UnclosedFence {
                marker: "```".to_string()
            }
        );
    }

    #[test]
    fn test_permalink_collision() {
        let report = check_site(
            &site(&[
                ("about.md", "---\nlayout: page\npermalink: /about/\n---\n"),
                ("about/index.md", "---\nlayout: page\n---\n"),
                ("contact.md", "---\nlayout: page\n---\n"),
                ("_drafts/about.md", "---\nlayout: page\npermalink: /about/\n---\n"),
            ]),
            &SiteConfig::default(),
        );
        let collisions: Vec<_> = report
            .diagnostics
            .iter()
            .filter(|d| matches!(d.issue, Issue::PermalinkCollision { .. }))
            .map(|d| d.path.as_str())
            .collect();
        assert_eq!(collisions, vec!["about.md", "about/index.md"]);
    }

    #[test]
    fn test_duplicate_section_severity_follows_config() {
        let text = "---\nlayout: post\ntitle: Optionals\n---\nFirst\n---\nlayout: post\ntitle: Optionals\n---\nSecond\n";
        let files = site(&[("_posts/2016-02-01-optionals.md", text)]);

        let report = check_site(&files, &SiteConfig::default());
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].line, Some(6));
        assert_eq!(report.diagnostics[0].severity, Severity::Error);
        assert_eq!(
            report.diagnostics[0].issue,
            Issue::DuplicateSection { same_title: true }
        );

        let config = SiteConfig {
            duplicate_sections: Severity::Warning,
            ..Default::default()
        };
        let report = check_site(&files, &config);
        assert_eq!(report.warnings(), 1);
        assert!(!report.has_errors());
    }

    #[test]
    fn test_invalid_post_filename_and_unknown_layout() {
        let config = SiteConfig {
            layouts: vec!["page".to_string(), "post".to_string()],
            ..Default::default()
        };
        let report = check_site(
            &site(&[("_posts/optionals.md", "---\nlayout: article\n---\n")]),
            &config,
        );
        assert_eq!(
            issues(&report),
            vec![
                &Issue::InvalidPostFilename,
                &Issue::UnknownLayout {
                    layout: "article".to_string()
                },
            ]
        );
        assert_eq!(report.errors(), 1);
        assert_eq!(report.warnings(), 1);
    }

    #[test]
    fn test_unreadable_files_are_reported() {
        let mut loaded = site(&[]);
        loaded.failures.push(LoadFailure {
            source: "binary.md".to_string(),
            message: "stream did not contain valid UTF-8".to_string(),
        });
        let report = check_site(&loaded, &SiteConfig::default());
        assert_eq!(report.documents, 1);
        assert!(report.has_errors());
    }

    #[test]
    fn test_first_differing_line_ignores_trailing_whitespace() {
        assert_eq!(first_differing_line("a  \nb\n\n\n", "a\nb"), None);
        assert_eq!(first_differing_line("a\nb\nc\n", "a\nB\nc\n"), Some(2));
        assert_eq!(first_differing_line("a\n", "a\nb\n"), Some(2));
    }

    #[test]
    fn test_round_trip_of_parsed_document() {
        let text = "---\nlayout: post\ntitle: \"Custom Operators ➕\"\ntags: [swift]\n---\n\nBody   \n";
        let document = Document::parse("_posts/2016-02-01-ops.md", DocumentKind::Post, text).unwrap();
        assert_eq!(round_trip_mismatch(&document, text), None);
        assert_eq!(round_trip_mismatch(&document, "---\nlayout: page\n---\n"), Some(2));
    }
}
