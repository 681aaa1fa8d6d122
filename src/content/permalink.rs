//! Permalink derivation
//!
//! Mirrors the routing conventions of Jekyll-style generators: an explicit
//! `permalink` wins, posts are dated by their `YYYY-MM-DD-slug` filename and
//! routed through the site permalink style, and pages map to their path.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use serde::Serialize;
use std::fmt;

use super::{Document, DocumentKind};
use crate::config::SiteConfig;

lazy_static! {
    static ref POST_NAME: Regex =
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2})-(.+)$").expect("post name pattern is valid");
}

/// Characters escaped when a permalink is turned into a URL
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Extension of rendered pages
const OUTPUT_EXT: &str = ".html";

/// Date and slug encoded in a post filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostName {
    pub date: NaiveDate,
    pub slug: String,
}

/// Parse a `YYYY-MM-DD-slug` file stem
pub fn parse_post_name(stem: &str) -> Option<PostName> {
    let caps = POST_NAME.captures(stem)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    Some(PostName {
        date: NaiveDate::from_ymd_opt(year, month, day)?,
        slug: caps[4].to_string(),
    })
}

/// A URL path relative to the site root, always starting with `/`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Permalink(String);

impl Permalink {
    pub fn new(path: &str) -> Self {
        let path = path.trim();
        if path.starts_with('/') {
            Self(path.to_string())
        } else {
            Self(format!("/{}", path))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File a generator writes for this permalink
    ///
    /// `/x/` -> `x/index.html`, `/x` -> `x.html`, `/x.html` -> `x.html`.
    /// Two documents collide when these are equal.
    pub fn output_path(&self) -> String {
        let path = self.0.trim_start_matches('/');
        if path.is_empty() || path.ends_with('/') {
            return format!("{}index.html", path);
        }
        let last = path.rsplit('/').next().unwrap_or(path);
        if last.contains('.') {
            path.to_string()
        } else {
            format!("{}{}", path, OUTPUT_EXT)
        }
    }

    /// Full URL: site `url` + `baseurl` + percent-encoded path
    pub fn url(&self, config: &SiteConfig) -> String {
        format!(
            "{}{}{}",
            config.url.trim_end_matches('/'),
            config.normalized_baseurl(),
            utf8_percent_encode(&self.0, PATH)
        )
    }
}

impl fmt::Display for Permalink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Expand a permalink style name into its pattern
fn style_pattern(style: &str) -> &str {
    match style {
        "date" => "/:categories/:year/:month/:day/:title:output_ext",
        "pretty" => "/:categories/:year/:month/:day/:title/",
        "ordinal" => "/:categories/:year/:y_day/:title:output_ext",
        "none" => "/:categories/:title:output_ext",
        custom => custom,
    }
}

/// Derive the permalink of a document
///
/// Returns `None` for a post whose date can be read neither from its file
/// name nor from its front-matter.
pub fn derive(document: &Document, config: &SiteConfig) -> Option<Permalink> {
    if let Some(explicit) = &document.front_matter.permalink {
        return Some(Permalink::new(explicit));
    }

    match document.kind {
        DocumentKind::Page => Some(page_permalink(&document.source, config)),
        DocumentKind::Post | DocumentKind::Draft => {
            let parsed = parse_post_name(document.stem());
            let date = document
                .front_matter
                .parse_date()
                .map(|dt| dt.date())
                .or_else(|| parsed.as_ref().map(|p| p.date));
            if date.is_none() && document.kind == DocumentKind::Post {
                return None;
            }
            let slug = parsed
                .map(|p| p.slug)
                .unwrap_or_else(|| document.stem().to_string());
            let categories = categories(document);
            Some(expand(style_pattern(&config.permalink), date, &slug, &categories))
        }
    }
}

/// Categories from the directories above `_posts`/`_drafts` plus front-matter
fn categories(document: &Document) -> Vec<String> {
    let mut categories: Vec<String> = document
        .source
        .split('/')
        .take_while(|dir| *dir != "_posts" && *dir != "_drafts")
        .filter(|dir| !dir.is_empty())
        .map(str::to_string)
        .collect();
    // no container directory: the walk ran to the file name
    if categories.len() == document.source.split('/').count() {
        categories.clear();
    }

    for category in &document.front_matter.categories {
        if !categories.contains(category) {
            categories.push(category.clone());
        }
    }
    categories.iter().map(|c| slug::slugify(c)).collect()
}

fn expand(pattern: &str, date: Option<NaiveDate>, title: &str, categories: &[String]) -> Permalink {
    let field = |fmt: &str| {
        date.map(|d| d.format(fmt).to_string())
            .unwrap_or_default()
    };

    let path = pattern
        .replace(":output_ext", OUTPUT_EXT)
        .replace(":categories", &categories.join("/"))
        .replace(":short_year", &field("%y"))
        .replace(":i_month", &field("%-m"))
        .replace(":i_day", &field("%-d"))
        .replace(":y_day", &field("%j"))
        .replace(":year", &field("%Y"))
        .replace(":month", &field("%m"))
        .replace(":day", &field("%d"))
        .replace(":title", title)
        .replace(":slug", &slug::slugify(title));

    Permalink::new(&collapse_slashes(&path))
}

/// Drop empty segments left by unset placeholders
fn collapse_slashes(path: &str) -> String {
    let trailing = path.ends_with('/');
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut out = format!("/{}", segments.join("/"));
    if trailing && !segments.is_empty() {
        out.push('/');
    }
    out
}

fn page_permalink(source: &str, config: &SiteConfig) -> Permalink {
    let without_ext = match source.rfind('.') {
        Some(pos) if !source[pos..].contains('/') => &source[..pos],
        _ => source,
    };

    if without_ext == "index" || without_ext.ends_with("/index") {
        return Permalink::new(without_ext.trim_end_matches("index"));
    }

    if config.permalink == "pretty" || config.permalink.ends_with('/') {
        Permalink::new(&format!("{}/", without_ext))
    } else {
        Permalink::new(&format!("{}{}", without_ext, OUTPUT_EXT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(source: &str, header: &str) -> Document {
        Document::parse(
            source,
            DocumentKind::Post,
            &format!("---\nlayout: post\n{}---\nBody\n", header),
        )
        .unwrap()
    }

    fn page(source: &str, header: &str) -> Document {
        Document::parse(
            source,
            DocumentKind::Page,
            &format!("---\nlayout: page\n{}---\nBody\n", header),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_post_name() {
        let name = parse_post_name("2016-02-01-swift-optionals").unwrap();
        assert_eq!(name.date, NaiveDate::from_ymd_opt(2016, 2, 1).unwrap());
        assert_eq!(name.slug, "swift-optionals");
        assert!(parse_post_name("swift-optionals").is_none());
        assert!(parse_post_name("2016-13-01-bad-month").is_none());
    }

    #[test]
    fn test_explicit_permalink_wins() {
        let config = SiteConfig::default();
        let about = page("about.md", "permalink: /about/\n");
        assert_eq!(derive(&about, &config).unwrap().as_str(), "/about/");
    }

    #[test]
    fn test_post_date_style() {
        let config = SiteConfig::default();
        let doc = post("_posts/2016-02-01-swift-optionals.md", "");
        assert_eq!(
            derive(&doc, &config).unwrap().as_str(),
            "/2016/02/01/swift-optionals.html"
        );
    }

    #[test]
    fn test_post_styles_and_categories() {
        let mut config = SiteConfig::default();
        let doc = post(
            "swift/_posts/2016-02-01-custom-operators.md",
            "categories: [Language Tips]\n",
        );

        config.permalink = "pretty".to_string();
        assert_eq!(
            derive(&doc, &config).unwrap().as_str(),
            "/swift/language-tips/2016/02/01/custom-operators/"
        );

        config.permalink = "ordinal".to_string();
        assert_eq!(
            derive(&doc, &config).unwrap().as_str(),
            "/swift/language-tips/2016/032/custom-operators.html"
        );

        config.permalink = "/blog/:i_month/:title/".to_string();
        assert_eq!(
            derive(&doc, &config).unwrap().as_str(),
            "/blog/2/custom-operators/"
        );
    }

    #[test]
    fn test_post_without_date_has_no_permalink() {
        let config = SiteConfig::default();
        let doc = post("_posts/optionals.md", "");
        assert!(derive(&doc, &config).is_none());

        let dated = post("_posts/optionals.md", "date: 2016-05-04\n");
        assert_eq!(
            derive(&dated, &config).unwrap().as_str(),
            "/2016/05/04/optionals.html"
        );
    }

    #[test]
    fn test_undated_draft_collapses_segments() {
        let config = SiteConfig::default();
        let doc = Document::parse("_drafts/idea.md", DocumentKind::Draft, "---\nlayout: post\n---\n")
            .unwrap();
        assert_eq!(derive(&doc, &config).unwrap().as_str(), "/idea.html");
    }

    #[test]
    fn test_page_permalinks() {
        let mut config = SiteConfig::default();
        assert_eq!(derive(&page("index.md", ""), &config).unwrap().as_str(), "/");
        assert_eq!(
            derive(&page("projects/index.md", ""), &config).unwrap().as_str(),
            "/projects/"
        );
        assert_eq!(
            derive(&page("contact.md", ""), &config).unwrap().as_str(),
            "/contact.html"
        );
        config.permalink = "pretty".to_string();
        assert_eq!(
            derive(&page("contact.md", ""), &config).unwrap().as_str(),
            "/contact/"
        );
    }

    #[test]
    fn test_output_path() {
        assert_eq!(Permalink::new("/").output_path(), "index.html");
        assert_eq!(Permalink::new("/about/").output_path(), "about/index.html");
        assert_eq!(Permalink::new("/about").output_path(), "about.html");
        assert_eq!(Permalink::new("/about.html").output_path(), "about.html");
        assert_eq!(Permalink::new("feed.xml").output_path(), "feed.xml");
    }

    #[test]
    fn test_url_is_encoded() {
        let config = SiteConfig {
            url: "https://example.github.io/".to_string(),
            baseurl: "blog".to_string(),
            ..Default::default()
        };
        assert_eq!(
            Permalink::new("/about me/").url(&config),
            "https://example.github.io/blog/about%20me/"
        );
        assert_eq!(
            Permalink::new("/🤔/").url(&config),
            "https://example.github.io/blog/%F0%9F%A4%94/"
        );
    }
}
