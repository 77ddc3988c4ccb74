//! List splitting.
//!
//! Breaks "Heading: • item • item" text into a heading block and one block
//! per item, whether the items sit on the heading's line, on the lines after
//! it, or several marker lines were grouped into one block.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::classify::parse_marker;
use crate::config::{LIST_HEADING_MAX_LENGTH, SHORT_TEXT_MAX};
use crate::model::{Block, BlockOrigin, ElementType, Line, ListMarker, MarkerStyle};

lazy_static! {
    /// `Heading: • first item ...` on one line.
    static ref INLINE_LIST: Regex =
        Regex::new(r"^(.*?:)\s+([•◦▪●■\-–*]|\d{1,3}[.)])\s+(.*)$").unwrap();

    /// Later numbered markers inside an inline list.
    static ref INLINE_NUMBER: Regex = Regex::new(r" (\d{1,3}[.)]) ").unwrap();
}

/// One list item cut out of a block.
struct Item {
    marker: ListMarker,
    lines: Vec<Line>,
}

/// Split every eligible block; other blocks pass through unchanged.
pub fn split_list_blocks(blocks: Vec<Block>) -> Vec<Block> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        match split_block(&block) {
            Some(pieces) => {
                debug!(
                    "Split block on page {} into {} pieces: {:.40}",
                    block.page_num,
                    pieces.len(),
                    block.text
                );
                out.extend(pieces);
            }
            None => out.push(block),
        }
    }
    out
}

/// Split one block into a heading and item blocks, when it holds a list.
pub fn split_block(block: &Block) -> Option<Vec<Block>> {
    if block.list_marker.is_some()
        || block.origin == BlockOrigin::TableFragment
        || block.element_type() == Some(ElementType::Table)
    {
        return None;
    }

    let mut prefix: Vec<Line> = Vec::new();
    let mut items: Vec<Item> = Vec::new();
    let mut inline = false;

    for (i, line) in block.lines.iter().enumerate() {
        if i == 0 {
            if let Some((head, found)) = split_inline(line) {
                prefix.push(head);
                items.extend(found);
                inline = true;
                continue;
            }
        }
        if let Some((marker, rest)) = parse_marker(&line.text) {
            items.push(Item {
                marker,
                lines: vec![line.fragment(rest, line.x)],
            });
            continue;
        }
        match items.last_mut() {
            Some(item) => item.lines.push(line.clone()),
            None => prefix.push(line.clone()),
        }
    }

    if items.is_empty() {
        return None;
    }
    let split = inline
        || items.len() >= 2
        || (prefix.len() == 1 && is_heading_like(&prefix[0]));
    if !split || (prefix.is_empty() && items.len() < 2) {
        return None;
    }

    let mut pieces = Vec::with_capacity(items.len() + 1);
    if !prefix.is_empty() {
        let mut head = Block::from_lines(prefix).ok()?;
        head.followed_by_list = true;
        head.is_list_heading = head.text.trim_end().ends_with(':');
        pieces.push(head);
    }
    for item in items {
        let mut piece = Block::from_lines(item.lines).ok()?;
        piece.list_marker = Some(item.marker);
        pieces.push(piece);
    }
    Some(pieces)
}

/// Short line, or one that ends with a colon.
fn is_heading_like(line: &Line) -> bool {
    let text = line.text.trim();
    let length = text.chars().count();
    (text.ends_with(':') && length <= LIST_HEADING_MAX_LENGTH) || length <= SHORT_TEXT_MAX / 2
}

/// Split "Heading: • a • b" into a heading fragment and item fragments.
fn split_inline(line: &Line) -> Option<(Line, Vec<Item>)> {
    let text = line.text.trim();
    if parse_marker(text).is_some() {
        return None;
    }
    let caps = INLINE_LIST.captures(text)?;
    let head = caps.get(1)?;
    let first = caps.get(2)?;
    let rest = caps.get(3)?.as_str();

    let head_text = head.as_str().trim();
    if head_text.chars().count() > LIST_HEADING_MAX_LENGTH || !head_text.chars().any(char::is_alphabetic) {
        return None;
    }

    // A lone number after a colon reads as prose ("Ratio: 3. Then ...").
    let entries = split_items(first.as_str(), rest);
    let needed = if is_numbered(first.as_str()) { 2 } else { 1 };
    if entries.len() < needed {
        return None;
    }

    let chars = line.char_count().max(1) as f32;
    let char_width = line.width() / chars;
    let item_x = line.x + text[..first.start()].chars().count() as f32 * char_width;

    let items = entries
        .into_iter()
        .map(|(glyph, body)| Item {
            marker: marker_for(&glyph),
            lines: vec![line.fragment(&body, item_x)],
        })
        .collect();
    Some((line.fragment(head_text, line.x), items))
}

/// Cut the text after the first marker at each later marker of the same kind.
fn split_items(first_glyph: &str, rest: &str) -> Vec<(String, String)> {
    let normalized = rest.split_whitespace().collect::<Vec<_>>().join(" ");

    let separators: Vec<(usize, usize, String)> = if is_numbered(first_glyph) {
        INLINE_NUMBER
            .captures_iter(&normalized)
            .filter_map(|c| {
                let whole = c.get(0)?;
                Some((whole.start(), whole.end(), c.get(1)?.as_str().to_string()))
            })
            .collect()
    } else {
        let separator = format!(" {first_glyph} ");
        normalized
            .match_indices(&separator)
            .map(|(i, s)| (i, i + s.len(), first_glyph.to_string()))
            .collect()
    };

    let mut entries = Vec::new();
    let mut glyph = first_glyph.to_string();
    let mut start = 0;
    for (sep_start, sep_end, next_glyph) in separators {
        let body = normalized[start..sep_start].trim();
        if !body.is_empty() {
            entries.push((glyph, body.to_string()));
        }
        glyph = next_glyph;
        start = sep_end;
    }
    let body = normalized[start..].trim();
    if !body.is_empty() {
        entries.push((glyph, body.to_string()));
    }
    entries
}

fn is_numbered(glyph: &str) -> bool {
    glyph.starts_with(|c: char| c.is_ascii_digit())
}

fn marker_for(glyph: &str) -> ListMarker {
    if is_numbered(glyph) {
        ListMarker::numbered(glyph, MarkerStyle::Decimal)
    } else {
        ListMarker::bullet(glyph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(lines: &[(&str, f32)]) -> Block {
        Block::from_lines(
            lines
                .iter()
                .enumerate()
                .map(|(i, (t, x))| Line::new(*t, *x, 100.0 + i as f32 * 14.0, 12.0))
                .collect(),
        )
        .unwrap()
    }

    fn texts(blocks: &[Block]) -> Vec<&str> {
        blocks.iter().map(|b| b.text.as_str()).collect()
    }

    #[test]
    fn test_inline_bullets() {
        let b = block(&[("Key Parameters: • CPU: 4 cores • RAM: 16GB", 72.0)]);
        let pieces = split_block(&b).unwrap();
        assert_eq!(texts(&pieces), vec!["Key Parameters:", "CPU: 4 cores", "RAM: 16GB"]);
        assert!(pieces[0].is_list_heading);
        assert!(pieces[0].followed_by_list);
        assert!(pieces[0].list_marker.is_none());
        assert_eq!(pieces[1].list_marker.as_ref().unwrap().glyph, "•");
        assert_eq!(pieces[1].x, pieces[2].x);
        assert!(pieces[1].x > pieces[0].x);
    }

    #[test]
    fn test_inline_numbers() {
        let b = block(&[("Steps: 1. Download 2. Install 3) Run", 72.0)]);
        let pieces = split_block(&b).unwrap();
        assert_eq!(texts(&pieces), vec!["Steps:", "Download", "Install", "Run"]);
        assert_eq!(pieces[3].list_marker.as_ref().unwrap().glyph, "3)");
        assert!(pieces[2].list_marker.as_ref().unwrap().is_ordered());
    }

    #[test]
    fn test_lone_number_after_colon_is_prose() {
        assert!(split_block(&block(&[("Ratio: 3. Then more text follows", 72.0)])).is_none());
        let pieces = split_block(&block(&[("Steps: 1. Download 2. Install", 72.0)])).unwrap();
        assert_eq!(texts(&pieces), vec!["Steps:", "Download", "Install"]);
    }

    #[test]
    fn test_two_line_pattern() {
        let b = block(&[("Requirements:", 72.0), ("• A recent compiler", 72.0)]);
        let pieces = split_block(&b).unwrap();
        assert_eq!(texts(&pieces), vec!["Requirements:", "A recent compiler"]);
    }

    #[test]
    fn test_multi_marker_block_with_continuation() {
        let b = block(&[
            ("1. Open the settings panel and", 72.0),
            ("choose the network tab.", 84.0),
            ("2. Enter the address.", 72.0),
        ]);
        let pieces = split_block(&b).unwrap();
        assert_eq!(
            texts(&pieces),
            vec!["Open the settings panel and choose the network tab.", "Enter the address."]
        );
        assert_eq!(pieces[0].line_count(), 2);
    }

    #[test]
    fn test_single_item_block_untouched() {
        assert!(split_block(&block(&[("• Only one item here", 72.0)])).is_none());
        assert!(split_block(&block(&[("Plain paragraph text without markers.", 72.0)])).is_none());
        assert!(split_block(&block(&[("Ratio: 3.5 to 1", 72.0)])).is_none());
    }

    #[test]
    fn test_paragraph_then_single_item_untouched() {
        let b = block(&[
            ("This is a longer introductory sentence that runs on for a while", 72.0),
            ("• one item", 72.0),
        ]);
        assert!(split_block(&b).is_none());
    }

    #[test]
    fn test_split_list_blocks_keeps_order() {
        let blocks = vec![
            block(&[("Before the list.", 72.0)]),
            block(&[("Options: - fast - cheap", 72.0)]),
            block(&[("After the list.", 72.0)]),
        ];
        let out = split_list_blocks(blocks);
        assert_eq!(
            texts(&out),
            vec!["Before the list.", "Options:", "fast", "cheap", "After the list."]
        );
    }
}
