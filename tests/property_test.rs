//! Property tests over generated lines.

use proptest::prelude::*;

use pagestruct::classify::{classify_block, ClassifierContext, Neighborhood};
use pagestruct::layout::{cluster_values, ColumnDetector, ElementGrouper, GapAnalysis};
use pagestruct::lists::split_list_blocks;
use pagestruct::table::{split_table_fragments, ColumnMerger};
use pagestruct::{Block, Line, Metrics};

/// A word-ish line: text, x, font size.
fn line_spec() -> impl Strategy<Value = (String, f32, f32)> {
    (
        prop_oneof![
            "[A-Za-z]{1,12}( [a-z]{1,10}){0,8}",
            "(•|-|1\\.|2\\)|a\\.) [A-Za-z]{2,10}( [a-z]{1,8}){0,5}",
            "[A-Z][a-z]{2,10}:",
            "[0-9]{1,4}(\\.[0-9]{1,2})?",
        ],
        prop_oneof![Just(72.0f32), Just(90.0), Just(172.0), Just(340.0), 60.0f32..500.0],
        prop_oneof![Just(12.0f32), Just(10.0), Just(18.0), 6.0f32..30.0],
    )
}

/// A row of one to three cells sharing a baseline, sometimes an inline list.
fn row_spec() -> impl Strategy<Value = (Vec<(String, f32)>, f32)> {
    let cell = prop_oneof![
        "[A-Za-z]{1,10}( [a-z]{1,8}){0,3}",
        "[0-9]{1,3}(\\.[0-9]{2})?",
        "[A-Z][a-z]{2,8}: (• [a-z]{2,6} ){0,2}• [a-z]{2,6}",
        "[A-Z][a-z]{2,8}: 1\\. [a-z]{2,6}( 2\\. [a-z]{2,6})?",
    ];
    (
        prop::sample::subsequence(vec![72.0f32, 340.0, 460.0], 1..=3)
            .prop_flat_map(move |xs| {
                let n = xs.len();
                (Just(xs), prop::collection::vec(cell.clone(), n))
            })
            .prop_map(|(xs, texts)| texts.into_iter().zip(xs).collect()),
        prop_oneof![Just(12.0f32), Just(10.0), 8.0f32..20.0],
    )
}

/// Sorted alphanumeric characters, the content no pipeline step may drop.
fn content(texts: impl IntoIterator<Item = String>) -> Vec<char> {
    let mut chars: Vec<char> = texts
        .into_iter()
        .flat_map(|t| t.chars().filter(|c| c.is_alphanumeric()).collect::<Vec<_>>())
        .collect();
    chars.sort_unstable();
    chars
}

/// Lines stacked down the page from `y = 100`.
fn stacked(specs: &[(String, f32, f32)], spacing: f32) -> Vec<Line> {
    specs
        .iter()
        .enumerate()
        .map(|(i, (text, x, size))| Line::new(text.clone(), *x, 100.0 + i as f32 * spacing, *size))
        .collect()
}

proptest! {
    #[test]
    fn confidences_stay_in_unit_range(
        specs in prop::collection::vec(line_spec(), 1..8),
        spacing in 8.0f32..40.0,
    ) {
        let metrics = Metrics::new(12.0);
        let ctx = ClassifierContext::new(&metrics);
        let block = Block::from_lines(stacked(&specs, spacing)).unwrap();
        let classification = classify_block(&block, &ctx, &Neighborhood::isolated(12.0));

        for result in classification.results() {
            prop_assert!(
                (0.0..=1.0).contains(&result.confidence),
                "{:?} confidence {} out of range",
                result.algorithm,
                result.confidence
            );
        }
        prop_assert!((0.0..=1.0).contains(&classification.decision.confidence));
    }

    #[test]
    fn clustering_ignores_input_order(
        values in prop::collection::vec(0.0f32..600.0, 1..40)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
        tolerance in 0.5f32..20.0,
    ) {
        let (original, shuffled) = values;
        let a = cluster_values(&original, tolerance);
        let b = cluster_values(&shuffled, tolerance);

        prop_assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            prop_assert_eq!(x.len(), y.len());
            prop_assert_eq!(x.center, y.center);
        }
        prop_assert_eq!(a.iter().map(|c| c.len()).sum::<usize>(), original.len());
    }

    #[test]
    fn grouping_keeps_every_line(
        specs in prop::collection::vec(line_spec(), 1..40),
        spacing in prop::collection::vec(10.0f32..60.0, 40),
    ) {
        let mut y = 100.0;
        let mut lines = Vec::with_capacity(specs.len());
        for (i, (text, x, size)) in specs.iter().enumerate() {
            lines.push(Line::new(text.clone(), *x, y, *size));
            y += spacing[i];
        }
        let count = lines.len();

        let metrics = Metrics::new(12.0);
        ColumnDetector::new(metrics.column_tolerance()).assign(&mut lines);
        let gaps = GapAnalysis::analyze(&lines, metrics.base_font_size());
        let blocks = ElementGrouper::new(metrics.base_font_size()).group(lines, &gaps);

        prop_assert_eq!(blocks.iter().map(Block::line_count).sum::<usize>(), count);
        prop_assert!(blocks.iter().all(|b| b.line_count() > 0));
    }

    #[test]
    fn block_pipeline_keeps_every_line(
        rows in prop::collection::vec(row_spec(), 1..24),
        spacing in prop::collection::vec(12.0f32..40.0, 24),
    ) {
        let mut y = 100.0;
        let mut lines = Vec::new();
        for (i, (cells, size)) in rows.iter().enumerate() {
            for (text, x) in cells {
                lines.push(Line::new(text.clone(), *x, y, *size));
            }
            y += spacing[i];
        }
        let expected = content(lines.iter().map(|l| l.text.clone()));

        let metrics = Metrics::new(12.0);
        let base = metrics.base_font_size();
        ColumnDetector::new(metrics.column_tolerance()).assign(&mut lines);
        let gaps = GapAnalysis::analyze(&lines, base);
        let ctx = ClassifierContext::new(&metrics);
        let grouper = ElementGrouper::new(base);
        let mut blocks = grouper.group(lines, &gaps);
        grouper.classify(&mut blocks, &ctx, &gaps, true);

        let blocks = split_list_blocks(blocks);
        let blocks = split_table_fragments(blocks, metrics.y_key_tolerance());
        let outcome = ColumnMerger::new(&ctx).merge(blocks);

        let mut found: Vec<String> = Vec::new();
        for block in &outcome.blocks {
            if let Some(marker) = &block.list_marker {
                found.push(marker.glyph.clone());
            }
            found.extend(block.lines.iter().map(|l| l.text.clone()));
        }
        for placed in &outcome.tables {
            found.extend(placed.table.rows.iter().flatten().cloned());
        }
        prop_assert_eq!(content(found), expected);
    }
}
