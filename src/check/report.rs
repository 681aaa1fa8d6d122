//! Check findings and their rendering

use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// What is wrong with a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    Unreadable { message: String },
    MissingFrontMatter,
    UnclosedFrontMatter,
    MalformedFrontMatter { message: String },
    MissingKey { key: String },
    UnknownLayout { layout: String },
    InvalidPostFilename,
    UnclosedFence { marker: String },
    RoundTripMismatch,
    PermalinkCollision { permalink: String, others: Vec<String> },
    DuplicateSection { same_title: bool },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::Unreadable { message } => write!(f, "cannot read file: {}", message),
            Issue::MissingFrontMatter => {
                f.write_str("missing front-matter: the document must start with a `---` line")
            }
            Issue::UnclosedFrontMatter => f.write_str("front-matter block is never closed"),
            Issue::MalformedFrontMatter { message } => {
                write!(f, "malformed front-matter: {}", message)
            }
            Issue::MissingKey { key } => write!(f, "front-matter has no `{}`", key),
            Issue::UnknownLayout { layout } => write!(f, "unknown layout `{}`", layout),
            Issue::InvalidPostFilename => {
                f.write_str("post file name should look like YYYY-MM-DD-title.md")
            }
            Issue::UnclosedFence { marker } => {
                write!(f, "code fence {} is never closed", marker)
            }
            Issue::RoundTripMismatch => {
                f.write_str("re-serializing the document does not reproduce the file")
            }
            Issue::PermalinkCollision { permalink, others } => write!(
                f,
                "permalink {} is also claimed by {}",
                permalink,
                others.join(", ")
            ),
            Issue::DuplicateSection { same_title: true } => f.write_str(
                "a second front-matter section with the same title is concatenated here; \
                 split it with `folio migrate --split` or remove it",
            ),
            Issue::DuplicateSection { same_title: false } => f.write_str(
                "a second front-matter section is concatenated here; \
                 split it with `folio migrate --split` or remove it",
            ),
        }
    }
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Source path relative to the site source
    pub path: String,
    pub line: Option<usize>,
    pub severity: Severity,
    pub issue: Issue,
    pub message: String,
}

impl Diagnostic {
    pub fn new(path: &str, line: Option<usize>, severity: Severity, issue: Issue) -> Self {
        Self {
            path: path.to_string(),
            line,
            severity,
            message: issue.to_string(),
            issue,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}: {}:{}: {}", self.severity, self.path, line, self.message),
            None => write!(f, "{}: {}: {}", self.severity, self.path, self.message),
        }
    }
}

/// Result of checking a site
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    /// Number of content files examined
    pub documents: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Order by path, then line; file-level findings come first
    pub fn sort(&mut self) {
        self.diagnostics
            .sort_by(|a, b| a.path.cmp(&b.path).then(a.line.cmp(&b.line)));
    }

    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors() > 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Human readable rendering, one finding per line plus a summary
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for diagnostic in &self.diagnostics {
            out.push_str(&diagnostic.to_string());
            out.push('\n');
        }
        out.push_str(&format!(
            "Checked {} {}: {} {}, {} {}\n",
            self.documents,
            plural(self.documents, "document"),
            self.errors(),
            plural(self.errors(), "error"),
            self.warnings(),
            plural(self.warnings(), "warning"),
        ));
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        let mut report = Report {
            documents: 3,
            ..Default::default()
        };
        report.push(Diagnostic::new(
            "_posts/2016-02-01-optionals.md",
            Some(12),
            Severity::Error,
            Issue::UnclosedFence {
                marker: "```".to_string(),
            },
        ));
        report.push(Diagnostic::new(
            "about.md",
            None,
            Severity::Warning,
            Issue::UnknownLayout {
                layout: "bio".to_string(),
            },
        ));
        report
    }

    #[test]
    fn test_render_text() {
        let text = sample().render_text();
        assert_eq!(
            text,
            "error: _posts/2016-02-01-optionals.md:12: code fence ``` is never closed\n\
             warning: about.md: unknown layout `bio`\n\
             Checked 3 documents: 1 error, 1 warning\n"
        );
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["documents"], 3);
        let first = &json["diagnostics"][0];
        assert_eq!(first["severity"], "error");
        assert_eq!(first["line"], 12);
        assert_eq!(first["issue"]["kind"], "unclosed_fence");
        assert_eq!(first["issue"]["marker"], "```");
        assert_eq!(json["diagnostics"][1]["line"], serde_json::Value::Null);
    }

    #[test]
    fn test_sort_puts_file_level_first() {
        let mut report = sample();
        report.push(Diagnostic::new(
            "_posts/2016-02-01-optionals.md",
            None,
            Severity::Error,
            Issue::InvalidPostFilename,
        ));
        report.sort();
        assert_eq!(report.diagnostics[0].issue, Issue::InvalidPostFilename);
        assert_eq!(report.diagnostics[2].path, "about.md");
    }

    #[test]
    fn test_severity_from_config_value() {
        let severity: Severity = serde_yaml::from_str("warning").unwrap();
        assert_eq!(severity, Severity::Warning);
    }
}
