//! Front-matter splitting and parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use super::ContentError;

/// Line that opens and closes a front-matter block
pub const DELIMITER: &str = "---";

/// YAML document-end marker, accepted as a closing delimiter
const DOCUMENT_END: &str = "...";

/// First line of the YAML header inside a document
const HEADER_LINE: usize = 2;

/// Custom deserializer that handles both a space separated string and a list of strings
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrList;

    impl<'de> Visitor<'de> for StringOrList {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.split_whitespace().map(str::to_string).collect())
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut list = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                list.push(item);
            }
            Ok(list)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrList)
}

/// Accept any YAML scalar as a string, so `title: 1984` stays a title
fn string_or_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct StringOrScalar;

    impl<'de> Visitor<'de> for StringOrScalar {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number or boolean")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(StringOrScalar)
}

/// Booleans as YAML 1.1 writes them (`yes`, `no`, `on`, `off`, ...)
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct LenientBool;

    impl<'de> Visitor<'de> for LenientBool {
        type Value = Option<bool>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a boolean such as true, false, yes or no")
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            match value.to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "on" => Ok(Some(true)),
                "false" | "no" | "n" | "off" => Ok(Some(false)),
                _ => Err(E::invalid_value(de::Unexpected::Str(value), &self)),
            }
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(LenientBool)
}

/// Front-matter data from a post or page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(
        deserialize_with = "string_or_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub layout: Option<String>,
    #[serde(
        deserialize_with = "string_or_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(
        deserialize_with = "string_or_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub permalink: Option<String>,
    #[serde(
        deserialize_with = "string_or_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<String>,
    #[serde(
        deserialize_with = "string_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub categories: Vec<String>,
    #[serde(
        deserialize_with = "string_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,
    /// Documents are published unless they opt out
    #[serde(deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,

    /// Additional custom fields, in header order
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self {
            layout: None,
            title: None,
            permalink: None,
            date: None,
            categories: Vec::new(),
            tags: Vec::new(),
            published: None,
            extra: IndexMap::new(),
        }
    }
}

/// A document cut at its front-matter delimiters
///
/// Every piece borrows from the source, so concatenating them (after the
/// optional BOM) gives back the input byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSource<'a> {
    pub bom: bool,
    /// Opening delimiter line, including its line ending
    pub opening: &'a str,
    /// YAML text between the delimiters
    pub header: &'a str,
    /// Closing delimiter line, including its line ending when there is one
    pub closing: &'a str,
    pub body: &'a str,
    /// Line (1-based) on which the body starts
    pub body_line: usize,
}

impl SplitSource<'_> {
    /// Length in bytes of everything up to the body, BOM excluded
    pub fn header_len(&self) -> usize {
        self.opening.len() + self.header.len() + self.closing.len()
    }
}

/// Iterate lines together with their byte offsets, keeping line endings
pub(crate) fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_inclusive('\n').scan(0, |offset, line| {
        let start = *offset;
        *offset += line.len();
        Some((start, line))
    })
}

/// Whether a line is a front-matter delimiter (trailing whitespace allowed)
pub fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

fn is_closing(line: &str) -> bool {
    let line = line.trim_end();
    line == DELIMITER || line == DOCUMENT_END
}

/// Split a document into its front-matter block and body
pub fn split(source: &str) -> Result<SplitSource<'_>, ContentError> {
    let (bom, text) = match source.strip_prefix('\u{feff}') {
        Some(rest) => (true, rest),
        None => (false, source),
    };

    let mut lines = lines_with_offsets(text);
    let opening_end = match lines.next() {
        Some((_, first)) if is_delimiter(first) => first.len(),
        _ => return Err(ContentError::MissingFrontMatter),
    };

    for (index, (offset, line)) in lines.enumerate() {
        if is_closing(line) {
            let closing_end = offset + line.len();
            return Ok(SplitSource {
                bom,
                opening: &text[..opening_end],
                header: &text[opening_end..offset],
                closing: &text[offset..closing_end],
                body: &text[closing_end..],
                body_line: index + HEADER_LINE + 1,
            });
        }
    }

    Err(ContentError::UnclosedFrontMatter { line: 1 })
}

impl FrontMatter {
    /// Parse the YAML between the delimiters
    ///
    /// `first_line` is the document line the header starts on, used to
    /// point errors at the right place.
    pub fn parse(header: &str, first_line: usize) -> Result<Self, ContentError> {
        let malformed = |e: serde_yaml::Error| ContentError::MalformedFrontMatter {
            line: e
                .location()
                .map(|loc| first_line + loc.line().saturating_sub(1))
                .unwrap_or(first_line),
            message: e.to_string(),
        };

        let value: serde_yaml::Value = serde_yaml::from_str(header).map_err(malformed)?;
        match value {
            serde_yaml::Value::Null => Ok(FrontMatter::default()),
            serde_yaml::Value::Mapping(_) => serde_yaml::from_value(value).map_err(malformed),
            _ => Err(ContentError::MalformedFrontMatter {
                line: first_line,
                message: "front-matter must be a mapping of `key: value` pairs".to_string(),
            }),
        }
    }

    /// Split a whole document and parse its header
    /// Returns (front_matter, body)
    pub fn parse_document(source: &str) -> Result<(Self, &str), ContentError> {
        let split = split(source)?;
        let fm = Self::parse(split.header, HEADER_LINE)?;
        Ok((fm, split.body))
    }

    /// Re-emit the mapping as YAML, without delimiters
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Whether the header sets `key` to a non-empty value
    pub fn has_key(&self, key: &str) -> bool {
        match key {
            "layout" => self.layout.is_some(),
            "title" => self.title.is_some(),
            "permalink" => self.permalink.is_some(),
            "date" => self.date.is_some(),
            "categories" => !self.categories.is_empty(),
            "tags" => !self.tags.is_empty(),
            "published" => self.published.is_some(),
            other => self
                .extra
                .get(other)
                .map(|v| !v.is_null())
                .unwrap_or(false),
        }
    }

    /// Whether the header leaves the document published
    pub fn is_published(&self) -> bool {
        self.published.unwrap_or(true)
    }

    /// Whether this header identifies a document on its own (layout or title)
    pub fn is_identifying(&self) -> bool {
        self.layout.is_some() || self.title.is_some()
    }

    /// Parse the date string
    pub fn parse_date(&self) -> Option<NaiveDateTime> {
        self.date.as_deref().and_then(parse_date_string)
    }
}

/// Parse a date string in the formats static-site front-matter commonly uses
fn parse_date_string(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    let zoned = ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M %z"];
    for fmt in zoned {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_local());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    let naive = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];
    for fmt in naive {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    None
}
