//! Fenced code block scanning

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};
use serde::Serialize;
use std::ops::Range;

/// Indentation a fence may carry relative to its container
const MAX_FENCE_INDENT: usize = 3;

/// A fenced code block found in a document body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    /// First word of the info string (`swift`, `bash`, ...)
    pub language: Option<String>,
    /// Line (1-based, relative to the scanned text) of the opening fence
    pub line: usize,
    /// The opening fence, e.g. "```" or "~~~~"
    pub marker: String,
    /// Whether a matching closing fence was found
    pub closed: bool,
    /// Byte range of the whole block in the scanned text
    #[serde(skip)]
    pub range: Range<usize>,
}

/// Scan text for fenced code blocks
///
/// CommonMark lets an unclosed fence run to the end of its container, so a
/// block counts as closed only when its last line is a fence made of the
/// opening character and at least as long as the opener.
pub fn scan(text: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();

    for (event, range) in Parser::new_ext(text, Options::empty()).into_offset_iter() {
        let info = match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => info,
            _ => continue,
        };

        let line_start = text[..range.start].rfind('\n').map_or(0, |i| i + 1);
        let opener = text[line_start..].lines().next().unwrap_or("");
        let Some((marker, indent)) = opening_fence(opener) else {
            continue;
        };

        let closed = text[range.clone()]
            .lines()
            .skip(1)
            .filter(|line| !line.trim().is_empty())
            .last()
            .map(|last| is_closing_fence(last, &marker, indent + MAX_FENCE_INDENT))
            .unwrap_or(false);

        let language = info
            .split_whitespace()
            .next()
            .map(|lang| lang.to_string());

        blocks.push(CodeBlock {
            language,
            line: line_of(text, range.start),
            marker,
            closed,
            range,
        });
    }

    blocks
}

/// 1-based line number of a byte offset
pub(crate) fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

/// Drop blockquote markers in front of a line
fn strip_quotes(line: &str) -> &str {
    let mut rest = line;
    loop {
        let trimmed = rest.trim_start_matches(' ');
        match trimmed.strip_prefix('>') {
            Some(after) => rest = after.strip_prefix(' ').unwrap_or(after),
            None => return rest,
        }
    }
}

/// Display width of a line prefix, tabs stopping every four columns
fn width(prefix: &str) -> usize {
    prefix.chars().fold(0, |col, c| match c {
        '\t' => col + 4 - col % 4,
        _ => col + 1,
    })
}

/// The fence on an opening line and the column it starts at
fn opening_fence(line: &str) -> Option<(String, usize)> {
    let line = strip_quotes(line);
    let start = line.find(|c: char| c == '`' || c == '~')?;
    let fence_char = line[start..].chars().next()?;
    let len = line[start..].chars().take_while(|c| *c == fence_char).count();
    if len < 3 {
        return None;
    }
    Some((fence_char.to_string().repeat(len), width(&line[..start])))
}

/// A closing fence may be indented at most `max_indent` columns
fn is_closing_fence(line: &str, marker: &str, max_indent: usize) -> bool {
    let Some(fence_char) = marker.chars().next() else {
        return false;
    };
    let line = strip_quotes(line).trim_end();
    let fence = line.trim_start_matches(|c: char| c == ' ' || c == '\t');
    if width(&line[..line.len() - fence.len()]) > max_indent {
        return false;
    }
    !fence.is_empty()
        && fence.chars().all(|c| c == fence_char)
        && fence.chars().count() >= marker.chars().count()
}
