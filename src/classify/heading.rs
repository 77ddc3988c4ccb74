//! Heading classifier.

use lazy_static::lazy_static;
use regex::Regex;

use super::{ends_sentence, parse_marker, ClassifierContext, Neighborhood};
use crate::config::{
    IMPLICIT_HEADING_GAP_RATIO, IMPLICIT_HEADING_MAX_LENGTH, IMPLICIT_HEADING_NEXT_RATIO,
    LONG_TEXT_MIN, MARKEDLY_LARGER_FONT_RATIO, SHORT_TEXT_MAX, SLIGHTLY_LARGER_FONT_RATIO,
    VERY_SHORT_TEXT_MAX,
};
use crate::error::{Error, Result};
use crate::model::{Algorithm, Block, Classification, ClassificationResult};

lazy_static! {
    /// "2.1 Scope", "Chapter 3", "Section IV".
    static ref NUMBERED_HEADING: Regex =
        Regex::new(r"^(\d+(\.\d+)+\.?\s+\p{Lu}|(Chapter|Section|Part|CHAPTER|SECTION|PART)\s+[\dIVXLC]+\b)")
            .unwrap();
}

/// Score a block as a heading.
pub fn classify_heading(block: &Block, ctx: &ClassifierContext<'_>, neighborhood: &Neighborhood<'_>) -> Result<ClassificationResult> {
    let text = block.text.trim();
    if block.lines.is_empty() || text.is_empty() {
        return Err(Error::EmptyBlock);
    }

    let length = text.chars().count();
    let ratio = ctx.font_ratio(block.font_size);
    let level = ctx.metrics().font_stats().heading_level(block.font_size);
    let heading = |confidence: f32, implicit: bool| {
        ClassificationResult::new(
            Algorithm::Heading,
            confidence,
            Classification::Heading { level, implicit },
        )
        .with_detail("length", length)
        .with_detail("font_ratio", ratio)
    };

    if length > LONG_TEXT_MIN {
        return Ok(heading(0.05, false));
    }

    let mut confidence: f32 = 0.0;

    confidence += if length <= VERY_SHORT_TEXT_MAX {
        0.3
    } else if length <= SHORT_TEXT_MAX {
        0.2
    } else {
        0.05
    };

    if ratio >= 1.5 {
        confidence += 0.4;
    } else if ratio >= MARKEDLY_LARGER_FONT_RATIO {
        confidence += 0.3;
    } else if ratio >= SLIGHTLY_LARGER_FONT_RATIO {
        confidence += 0.15;
    } else if ratio < 0.95 {
        confidence -= 0.1;
    }

    if block.bold {
        confidence += 0.2;
    }
    if block.underline {
        confidence += 0.1;
    }
    if block.lines.iter().all(|l| l.is_uppercase()) {
        confidence += 0.1;
    }

    if text.ends_with('.') {
        confidence -= 0.15;
    } else if text.ends_with(':') {
        confidence += 0.05;
    } else if !ends_sentence(text) {
        confidence += 0.1;
    }

    match block.line_count() {
        1 => confidence += 0.05,
        n if n > 3 => confidence -= 0.2,
        _ => {}
    }

    if NUMBERED_HEADING.is_match(text) {
        confidence += 0.15;
    }
    if block.list_marker.is_some() || parse_marker(text).is_some() {
        confidence -= 0.3;
    }

    let mut confidence = confidence.clamp(0.0, 1.0);
    let mut implicit = false;

    if ctx.structure().is_flat() {
        if is_implicit_heading(block, text, length, neighborhood) {
            confidence = confidence.max(0.7);
            implicit = true;
        } else {
            confidence *= 0.5;
        }
    }

    Ok(heading(confidence, implicit))
}

/// First block of a uniform document, short, unpunctuated, followed by a
/// clear gap and a much longer block.
fn is_implicit_heading(block: &Block, text: &str, length: usize, neighborhood: &Neighborhood<'_>) -> bool {
    if !neighborhood.is_first_block || length > IMPLICIT_HEADING_MAX_LENGTH {
        return false;
    }
    if ends_sentence(text) || text.ends_with([',', ';']) {
        return false;
    }
    let gap_ok = neighborhood
        .gap_after
        .distance()
        .is_some_and(|gap| gap >= neighborhood.normal_gap * IMPLICIT_HEADING_GAP_RATIO);
    let next_ok = neighborhood
        .next
        .is_some_and(|next| next.char_count() as f32 >= length as f32 * IMPLICIT_HEADING_NEXT_RATIO);
    gap_ok && next_ok && block.list_marker.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{DocumentStructure, Metrics};
    use crate::model::{GapAfter, Line};

    fn block(text: &str, size: f32) -> Block {
        Block::from_lines(vec![Line::new(text, 72.0, 100.0, size)]).unwrap()
    }

    fn flat_metrics() -> Metrics {
        Metrics::new(12.0).with_structure(DocumentStructure {
            homogeneous: true,
            likely_has_headings: false,
            distinct_sizes: 1,
        })
    }

    #[test]
    fn test_large_short_text() {
        let metrics = Metrics::new(12.0);
        let ctx = ClassifierContext::new(&metrics);
        let result = classify_heading(&block("Introduction", 18.0), &ctx, &Neighborhood::isolated(12.0)).unwrap();
        // 0.3 length + 0.4 size + 0.1 no punctuation + 0.05 single line
        assert!((result.confidence - 0.85).abs() < 1e-4);
    }

    #[test]
    fn test_sentence_scores_low() {
        let metrics = Metrics::new(12.0);
        let ctx = ClassifierContext::new(&metrics);
        let text = "This is an ordinary sentence of body text that ends with a period.";
        let result = classify_heading(&block(text, 12.0), &ctx, &Neighborhood::isolated(12.0)).unwrap();
        assert!(result.confidence < 0.2);
    }

    #[test]
    fn test_long_text() {
        let metrics = Metrics::new(12.0);
        let ctx = ClassifierContext::new(&metrics);
        let text = "word ".repeat(40);
        let result = classify_heading(&block(&text, 24.0), &ctx, &Neighborhood::isolated(12.0)).unwrap();
        assert_eq!(result.confidence, 0.05);
    }

    #[test]
    fn test_numbered_heading_and_marker() {
        let metrics = Metrics::new(12.0);
        let ctx = ClassifierContext::new(&metrics);
        let n = Neighborhood::isolated(12.0);
        let numbered = classify_heading(&block("2.1 Scope of work", 12.0), &ctx, &n).unwrap();
        let plain = classify_heading(&block("Scope of work", 12.0), &ctx, &n).unwrap();
        let bullet = classify_heading(&block("• Scope of work", 12.0), &ctx, &n).unwrap();
        assert!(numbered.confidence > plain.confidence);
        assert!(bullet.confidence < plain.confidence);
    }

    #[test]
    fn test_flat_document_dampens() {
        let metrics = flat_metrics();
        let ctx = ClassifierContext::new(&metrics);
        let result = classify_heading(&block("Introduction", 12.0), &ctx, &Neighborhood::isolated(12.0)).unwrap();
        // (0.3 + 0.1 + 0.05) halved
        assert!((result.confidence - 0.225).abs() < 1e-4);
        assert!(matches!(
            result.classification,
            Classification::Heading { implicit: false, .. }
        ));
    }

    #[test]
    fn test_implicit_heading() {
        let metrics = flat_metrics();
        let ctx = ClassifierContext::new(&metrics);
        let next = Block::from_lines(vec![
            Line::new("A long body paragraph follows the title and keeps going.", 72.0, 130.0, 12.0),
            Line::new("It has several lines of ordinary text in the same size.", 72.0, 144.4, 12.0),
        ])
        .unwrap();
        let neighborhood = Neighborhood {
            is_first_block: true,
            gap_after: GapAfter::Distance(30.0),
            next: Some(&next),
            normal_gap: 14.4,
        };
        let result = classify_heading(&block("Project Notes", 12.0), &ctx, &neighborhood).unwrap();
        assert_eq!(result.confidence, 0.7);
        assert!(matches!(
            result.classification,
            Classification::Heading { implicit: true, .. }
        ));

        let not_first = Neighborhood {
            is_first_block: false,
            ..neighborhood
        };
        let result = classify_heading(&block("Project Notes", 12.0), &ctx, &not_first).unwrap();
        assert!(result.confidence < 0.5);
    }
}
