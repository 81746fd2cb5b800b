//! Balanced placeholder block location.
//!
//! A placeholder is an element such as `<div id="header-placeholder">` that
//! starts a line (optionally indented). Its block runs from the start of that
//! line to the end of the *matching* closing tag, which is found by counting
//! depth over the open/close events of the same element type:
//!
//! ```text
//!     <div id="header-placeholder">      depth 1   ← range starts at line start
//!       <div class="nav">                depth 2
//!         <div class="dropdown"></div>   depth 3 → 2
//!       </div>                           depth 1
//!     </div>                             depth 0   ← range ends after this `>`
//! ```
//!
//! The scanner only understands tags of one element name. It assumes the block
//! interior has no such tags hidden inside comments or scripts; a fragment that
//! breaks that assumption will be cut at the wrong place.

use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("no matching </{element}> for placeholder `{id}` opened at byte {offset}")]
    Unbalanced {
        element: String,
        id: String,
        offset: usize,
    },
}

/// A located placeholder block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderBlock {
    /// Whitespace between the line start and the opening tag.
    pub indent: String,
    /// Half-open byte range: line start through one past the closing `>`.
    pub range: Range<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Open,
    Close,
}

/// An opening or closing tag of the tracked element, by byte offset of its `<`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagEvent {
    pub kind: TagKind,
    pub start: usize,
}

/// Iterator over open/close events for a single element name.
///
/// Matching is ASCII case-insensitive and requires the name to end at a
/// non-word character, so `<div` matches `<div>` and `<DIV class="x">` but
/// not `<divider>`.
pub struct TagEvents<'a> {
    html: &'a str,
    element: &'a str,
    pos: usize,
}

impl<'a> TagEvents<'a> {
    pub fn new(html: &'a str, element: &'a str, from: usize) -> Self {
        Self {
            html,
            element,
            pos: from.min(html.len()),
        }
    }
}

impl Iterator for TagEvents<'_> {
    type Item = TagEvent;

    fn next(&mut self) -> Option<TagEvent> {
        let bytes = self.html.as_bytes();
        let name = self.element.as_bytes();

        while let Some(offset) = self.html[self.pos..].find('<') {
            let start = self.pos + offset;
            self.pos = start + 1;

            let (kind, name_at) = if bytes.get(start + 1) == Some(&b'/') {
                (TagKind::Close, start + 2)
            } else {
                (TagKind::Open, start + 1)
            };
            let name_end = name_at + name.len();
            if name_end > bytes.len() || !bytes[name_at..name_end].eq_ignore_ascii_case(name) {
                continue;
            }
            if bytes
                .get(name_end)
                .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
            {
                continue;
            }
            return Some(TagEvent { kind, start });
        }

        self.pos = self.html.len();
        None
    }
}

/// Find the placeholder opening tag `<element id="id">` at the start of a line.
///
/// Returns `(line_start, tag_start)`. Whitespace between `<element` and `id`
/// may be any non-empty run, line breaks included; everything else must
/// match exactly.
pub fn find_opening_tag(html: &str, element: &str, id: &str) -> Option<(usize, usize)> {
    let attr = format!("id=\"{id}\">");
    let mut line_start = 0;

    for line in html.split_inclusive('\n') {
        let trimmed = line.trim_start_matches([' ', '\t']);
        let tag_start = line_start + (line.len() - trimmed.len());
        // The attribute may continue on a following line.
        if let Some(rest) = html[tag_start..]
            .strip_prefix('<')
            .and_then(|r| r.strip_prefix(element))
        {
            let after_ws = rest.trim_start();
            if after_ws.len() < rest.len() && after_ws.starts_with(&attr) {
                return Some((line_start, tag_start));
            }
        }
        line_start += line.len();
    }
    None
}

/// Byte offset one past the `>` of the tag that closes the element opened at `from`.
///
/// `from` must point at (or before) the opening tag. Returns `None` when the
/// document ends before depth returns to zero.
pub fn matching_close_end(html: &str, element: &str, from: usize) -> Option<usize> {
    let mut depth = 0usize;
    for event in TagEvents::new(html, element, from) {
        match event.kind {
            TagKind::Open => depth += 1,
            TagKind::Close => {
                let Some(remaining) = depth.checked_sub(1) else {
                    continue;
                };
                depth = remaining;
                if depth == 0 {
                    let end = match html[event.start..].find('>') {
                        Some(i) => event.start + i + 1,
                        None => event.start + 2 + element.len(),
                    };
                    return Some(end);
                }
            }
        }
    }
    None
}

/// Locate the placeholder block for `id`.
///
/// `Ok(None)` means the document has no such placeholder; an opening tag
/// without a balanced close is an error.
pub fn locate_block(
    html: &str,
    element: &str,
    id: &str,
) -> Result<Option<PlaceholderBlock>, BlockError> {
    let Some((line_start, tag_start)) = find_opening_tag(html, element, id) else {
        return Ok(None);
    };

    let end = matching_close_end(html, element, tag_start).ok_or_else(|| {
        BlockError::Unbalanced {
            element: element.to_string(),
            id: id.to_string(),
            offset: tag_start,
        }
    })?;

    Ok(Some(PlaceholderBlock {
        indent: html[line_start..tag_start].to_string(),
        range: line_start..end,
    }))
}
