//! Element decider.
//!
//! Ordered rules over the four classifier results; the first rule that
//! matches wins.

use super::ClassifierContext;
use crate::config::{
    CONFIDENCE_GAP_BAND, HEADING_NONTRIVIAL_CONFIDENCE, LIST_HEADING_CONFIDENCE_FLOOR,
    LIST_HEADING_MAX_LENGTH, LIST_HEADING_MIN_CONFIDENCE, LIST_MIN_CONFIDENCE,
    LIST_PARAGRAPH_MARGIN, LIST_STRONG_CONFIDENCE, LONG_TEXT_MIN, MARKEDLY_LARGER_FONT_RATIO,
    SHORT_TEXT_MAX, SLIGHTLY_LARGER_FONT_RATIO, TABLE_TRUST_CONFIDENCE, VERY_LONG_TEXT_MIN,
    VERY_SHORT_TEXT_MAX,
};
use crate::error::{Error, Result};
use crate::model::{Block, Classification, ClassificationResult, Decision, ElementType};

/// Decide a block's element type. Never fails: errors become a paragraph.
pub fn decide(
    block: &Block,
    heading: &ClassificationResult,
    paragraph: &ClassificationResult,
    list: &ClassificationResult,
    table: &ClassificationResult,
    ctx: &ClassifierContext<'_>,
) -> Decision {
    try_decide(block, heading, paragraph, list, table, ctx)
        .unwrap_or_else(|e| Decision::fallback(format!("decision failed: {e}")))
}

fn try_decide(
    block: &Block,
    heading: &ClassificationResult,
    paragraph: &ClassificationResult,
    list: &ClassificationResult,
    table: &ClassificationResult,
    ctx: &ClassifierContext<'_>,
) -> Result<Decision> {
    let text = block.text.trim();
    if text.is_empty() {
        return Err(Error::EmptyBlock);
    }
    let length = text.chars().count();
    let (h, p, l, t) = (
        heading.confidence,
        paragraph.confidence,
        list.confidence,
        table.confidence,
    );

    if length >= VERY_LONG_TEXT_MIN {
        return Ok(Decision::new(ElementType::Paragraph, p.max(0.9), "very long text"));
    }

    if t > ctx.metrics().table_min_confidence() && (t > p || t > TABLE_TRUST_CONFIDENCE) {
        return Ok(Decision::new(ElementType::Table, t, "table vote"));
    }

    let list_rule = || {
        (l >= LIST_MIN_CONFIDENCE && (l >= LIST_STRONG_CONFIDENCE || l >= p - LIST_PARAGRAPH_MARGIN))
            .then(|| Decision::new(ElementType::List, l, "list marker"))
    };

    if ctx.structure().is_flat() && !block.is_list_heading {
        let implicit = matches!(
            heading.classification,
            Classification::Heading { implicit: true, .. }
        );
        if implicit && h > p + CONFIDENCE_GAP_BAND {
            return Ok(Decision::new(ElementType::Heading, h, "implicit heading"));
        }
        return Ok(list_rule()
            .unwrap_or_else(|| Decision::new(ElementType::Paragraph, p, "uniform document")));
    }

    if let Some(decision) = list_rule() {
        return Ok(decision);
    }

    let decision = if let Some(boosted) = list_heading_confidence(block, text, length, h) {
        Decision::new(ElementType::Heading, boosted, "list heading")
    } else {
        heading_or_paragraph(length, ctx.font_ratio(block.font_size), h, p)
    };

    if decision.element_type == ElementType::Heading && length >= LONG_TEXT_MIN {
        return Ok(Decision::new(ElementType::Paragraph, p, "too long for a heading"));
    }
    Ok(decision)
}

/// Boosted heading confidence for "Options:"-style blocks, when high enough.
fn list_heading_confidence(block: &Block, text: &str, length: usize, heading: f32) -> Option<f32> {
    let colon = text.ends_with(':') && length <= LIST_HEADING_MAX_LENGTH;
    let before_list = block.followed_by_list && length <= SHORT_TEXT_MAX;
    if !colon && !before_list {
        return None;
    }

    let boosted = if block.followed_by_list || block.is_list_heading {
        heading.max(LIST_HEADING_CONFIDENCE_FLOOR)
    } else {
        (heading + CONFIDENCE_GAP_BAND).min(1.0)
    };
    (boosted > LIST_HEADING_MIN_CONFIDENCE).then_some(boosted)
}

fn heading_or_paragraph(length: usize, ratio: f32, h: f32, p: f32) -> Decision {
    if length <= VERY_SHORT_TEXT_MAX && ratio >= SLIGHTLY_LARGER_FONT_RATIO {
        return Decision::new(ElementType::Heading, h, "short text, larger font");
    }
    if length <= SHORT_TEXT_MAX && ratio >= MARKEDLY_LARGER_FONT_RATIO {
        return Decision::new(ElementType::Heading, h, "markedly larger font");
    }
    if h > p {
        return Decision::new(ElementType::Heading, h, "heading confidence");
    }
    if (h - p).abs() <= CONFIDENCE_GAP_BAND && h >= HEADING_NONTRIVIAL_CONFIDENCE {
        return Decision::new(ElementType::Heading, h, "close call");
    }
    Decision::new(ElementType::Paragraph, p, "paragraph confidence")
}
