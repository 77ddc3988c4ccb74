//! Paragraph classifier.

use lazy_static::lazy_static;
use regex::Regex;

use super::{ends_sentence, parse_marker, ClassifierContext};
use crate::config::VERY_LONG_TEXT_MIN;
use crate::error::{Error, Result};
use crate::model::{Algorithm, Block, Classification, ClassificationResult};

lazy_static! {
    static ref SENTENCE_BOUNDARY: Regex = Regex::new(r"[.!?]\s+\p{Lu}").unwrap();
}

/// Score a block as a paragraph.
pub fn classify_paragraph(block: &Block, ctx: &ClassifierContext<'_>) -> Result<ClassificationResult> {
    let text = block.text.trim();
    if block.lines.is_empty() || text.is_empty() {
        return Err(Error::EmptyBlock);
    }

    let length = text.chars().count();
    if length > VERY_LONG_TEXT_MIN {
        return Ok(ClassificationResult::new(
            Algorithm::Paragraph,
            0.95,
            Classification::Paragraph { very_long: true },
        )
        .with_detail("length", length));
    }

    let mut confidence: f32 = 0.3;

    confidence += if length >= 150 {
        0.35
    } else if length >= 80 {
        0.25
    } else if length >= 40 {
        0.15
    } else {
        0.0
    };

    if ends_sentence(text) {
        confidence += 0.2;
    }
    if SENTENCE_BOUNDARY.is_match(text) {
        confidence += 0.1;
    }
    if block.line_count() >= 2 {
        confidence += 0.1;
    }

    let ratio = ctx.font_ratio(block.font_size);
    if (0.9..=1.1).contains(&ratio) {
        confidence += 0.1;
    } else if ratio >= 1.2 {
        confidence -= 0.2;
    }
    if block.bold {
        confidence -= 0.1;
    }
    if block.list_marker.is_some() || parse_marker(text).is_some() {
        confidence -= 0.2;
    }

    Ok(ClassificationResult::new(
        Algorithm::Paragraph,
        confidence.clamp(0.0, 1.0),
        Classification::Paragraph { very_long: false },
    )
    .with_detail("length", length)
    .with_detail("font_ratio", ratio))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metrics;
    use crate::model::Line;

    fn block(lines: &[&str], size: f32) -> Block {
        Block::from_lines(
            lines
                .iter()
                .enumerate()
                .map(|(i, t)| Line::new(*t, 72.0, 100.0 + i as f32 * 14.0, size))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_very_long_short_circuits() {
        let metrics = Metrics::new(12.0);
        let ctx = ClassifierContext::new(&metrics);
        let text = "lorem ipsum ".repeat(30);
        let result = classify_paragraph(&block(&[&text], 30.0), &ctx).unwrap();
        assert_eq!(result.confidence, 0.95);
        assert!(matches!(
            result.classification,
            Classification::Paragraph { very_long: true }
        ));
    }

    #[test]
    fn test_body_paragraph() {
        let metrics = Metrics::new(12.0);
        let ctx = ClassifierContext::new(&metrics);
        let result = classify_paragraph(
            &block(
                &[
                    "The committee met on Tuesday to review the budget. Several",
                    "members raised concerns about the timeline for delivery.",
                ],
                12.0,
            ),
            &ctx,
        )
        .unwrap();
        // 0.3 + 0.25 length + 0.2 period + 0.1 boundary + 0.1 lines + 0.1 font
        assert!((result.confidence - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_title_scores_low() {
        let metrics = Metrics::new(12.0);
        let ctx = ClassifierContext::new(&metrics);
        let mut b = block(&["Annual Report"], 20.0);
        b.bold = true;
        let result = classify_paragraph(&b, &ctx).unwrap();
        assert!(result.confidence < 0.05);
    }
}
