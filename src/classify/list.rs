//! List classifier and marker parsing.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{Algorithm, Block, Classification, ClassificationResult, ListMarker, MarkerStyle};

lazy_static! {
    /// `1.` `12)` `(3)` `a.` `B)` `iv.` followed by text.
    static ref ORDERED_MARKER: Regex =
        Regex::new(r"^(\(?(\d{1,3}|[ivx]{1,5}|[IVX]{1,5}|[a-zA-Z])[.)])\s+(\S.*)$").unwrap();
}

/// Bullets that may touch the item text.
const STRONG_BULLETS: &[char] = &[
    '•', '◦', '▪', '▫', '●', '○', '■', '□', '►', '▸', '‣', '⁃', '∙',
];

/// Bullets that need a following space to count.
const WEAK_BULLETS: &[char] = &['-', '–', '—', '*', '+'];

/// Parse a leading list marker.
///
/// Returns the marker and the item text after it.
pub fn parse_marker(text: &str) -> Option<(ListMarker, &str)> {
    let text = text.trim_start();
    let first = text.chars().next()?;

    if STRONG_BULLETS.contains(&first) {
        let rest = text[first.len_utf8()..].trim_start();
        return (!rest.is_empty()).then(|| (ListMarker::bullet(first.to_string()), rest));
    }

    if WEAK_BULLETS.contains(&first) {
        let after = &text[first.len_utf8()..];
        if !after.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = after.trim_start();
        return (!rest.is_empty()).then(|| (ListMarker::bullet(first.to_string()), rest));
    }

    let caps = ORDERED_MARKER.captures(text)?;
    let glyph = caps.get(1)?.as_str();
    let core = caps.get(2)?.as_str();
    let rest = caps.get(3)?.as_str();
    Some((ListMarker::numbered(glyph, marker_style(core)), rest))
}

fn marker_style(core: &str) -> MarkerStyle {
    if core.chars().all(|c| c.is_ascii_digit()) {
        return MarkerStyle::Decimal;
    }
    let roman_lower = core.chars().all(|c| matches!(c, 'i' | 'v' | 'x'));
    let roman_upper = core.chars().all(|c| matches!(c, 'I' | 'V' | 'X'));
    if core.len() > 1 || matches!(core, "i" | "v" | "x" | "I" | "V" | "X") {
        if roman_lower {
            return MarkerStyle::LowerRoman;
        }
        if roman_upper {
            return MarkerStyle::UpperRoman;
        }
    }
    if core.chars().all(char::is_lowercase) {
        MarkerStyle::LowerAlpha
    } else {
        MarkerStyle::UpperAlpha
    }
}

/// Nesting level suggested by the marker glyph alone.
pub fn nesting_hint(marker: &ListMarker) -> u8 {
    match marker.style {
        MarkerStyle::Bullet => match marker.glyph.as_str() {
            "◦" | "○" | "–" => 1,
            "▪" | "▫" | "■" | "□" => 2,
            _ => 0,
        },
        MarkerStyle::Decimal => 0,
        _ => 1,
    }
}

fn is_strong_bullet(marker: &ListMarker) -> bool {
    marker.style == MarkerStyle::Bullet
        && marker
            .glyph
            .chars()
            .next()
            .is_some_and(|c| STRONG_BULLETS.contains(&c))
}

/// Score a block as a list item.
pub fn classify_list(block: &Block) -> Result<ClassificationResult> {
    let first = block.lines.first().ok_or(Error::EmptyBlock)?;
    if block.text.trim().is_empty() {
        return Err(Error::EmptyBlock);
    }

    if let Some(marker) = &block.list_marker {
        let hint = nesting_hint(marker);
        return Ok(ClassificationResult::new(
            Algorithm::List,
            0.9,
            Classification::List {
                ordered: marker.is_ordered(),
                marker: Some(marker.clone()),
                nesting_hint: hint,
            },
        )
        .with_detail("marker_source", "split"));
    }

    let marker_lines = block
        .lines
        .iter()
        .filter(|l| parse_marker(&l.text).is_some())
        .count();

    let Some((marker, _)) = parse_marker(&first.text) else {
        let confidence = if marker_lines > 0 { 0.2 } else { 0.0 };
        return Ok(ClassificationResult::new(
            Algorithm::List,
            confidence,
            Classification::List {
                ordered: false,
                marker: None,
                nesting_hint: 0,
            },
        )
        .with_detail("marker_lines", marker_lines));
    };

    let mut confidence: f32 = if marker.glyph == "-" { 0.55 } else { 0.6 };
    if is_strong_bullet(&marker) {
        confidence += 0.2;
    }
    if marker.is_ordered() {
        confidence += 0.15;
    }
    if marker_lines >= 2 {
        confidence += 0.1;
    }

    let hint = nesting_hint(&marker);
    Ok(ClassificationResult::new(
        Algorithm::List,
        confidence.min(1.0),
        Classification::List {
            ordered: marker.is_ordered(),
            marker: Some(marker),
            nesting_hint: hint,
        },
    )
    .with_detail("marker_lines", marker_lines))
}
