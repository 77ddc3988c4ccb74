//! Table classifier.
//!
//! Three sub-algorithms vote with fixed weights:
//!
//! - **grid pattern**: X and Y clustering of the items into a grid
//! - **column alignment**: how many items start on a shared column
//! - **row structure**: regularity of the row spacing
//!
//! Only algorithms with a non-zero confidence take part; weights are
//! renormalized over them. Text alignment alone is capped below certainty;
//! border lines around the block lift the cap.

use log::debug;

use super::{parse_marker, ClassifierContext};
use crate::config::{
    COLUMN_ALIGNMENT_CAP, COLUMN_ALIGNMENT_WEIGHT, GRAPHICS_TABLE_BONUS, GRID_PATTERN_WEIGHT,
    ROW_CV_MAX, ROW_LONG_LINE_CHARS, ROW_MEDIUM_LINE_CHARS, ROW_STRUCTURE_WEIGHT,
    TABLE_BORDER_MARGIN, TABLE_MIN_BORDER_LINES, TABLE_MIN_COLUMNS, TABLE_MIN_ROWS,
    TEXT_ONLY_TABLE_CEILING,
};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::layout::clustering::{
    cluster_values, coefficient_of_variation, nearest_cluster, Cluster,
};
use crate::model::{Algorithm, Classification, ClassificationResult, Line};

/// Penalty when every row holds a single item.
const SINGLE_ITEM_ROW_PENALTY: f32 = 0.3;

/// Penalty for blocks that look like bulleted or numbered lists.
const LIST_PATTERN_PENALTY: f32 = 0.3;

/// The clustered shape of a set of lines.
struct GridShape<'a> {
    columns: Vec<Cluster>,
    rows: Vec<Vec<&'a Line>>,
    row_centers: Vec<f32>,
    item_count: usize,
    avg_chars: f32,
}

impl<'a> GridShape<'a> {
    fn new(lines: &'a [Line], column_tolerance: f32, row_tolerance: f32) -> Self {
        let xs: Vec<f32> = lines.iter().map(|l| l.x).collect();
        let ys: Vec<f32> = lines.iter().map(|l| l.y).collect();
        let columns = cluster_values(&xs, column_tolerance);
        let y_clusters = cluster_values(&ys, row_tolerance);

        let mut rows: Vec<Vec<&Line>> = vec![Vec::new(); y_clusters.len()];
        for line in lines {
            if let Some(row) = nearest_cluster(&y_clusters, line.y) {
                rows[row].push(line);
            }
        }
        for row in &mut rows {
            row.sort_by(|a, b| a.x.total_cmp(&b.x));
        }

        let total_chars: usize = lines.iter().map(Line::char_count).sum();
        Self {
            columns,
            rows,
            row_centers: y_clusters.iter().map(|c| c.center).collect(),
            item_count: lines.len(),
            avg_chars: total_chars as f32 / lines.len().max(1) as f32,
        }
    }

    fn significant_columns(&self) -> impl Iterator<Item = &Cluster> {
        self.columns.iter().filter(|c| c.len() >= 2)
    }

    fn significant_column_count(&self) -> usize {
        self.significant_columns().count()
    }

    fn multi_item_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.len() >= 2).count()
    }

    fn single_item_rows_only(&self) -> bool {
        self.multi_item_rows() == 0
    }
}

/// Score a set of lines as a table.
pub fn classify_table(lines: &[Line], ctx: &ClassifierContext<'_>) -> Result<ClassificationResult> {
    if lines.is_empty() {
        return Err(Error::EmptyBlock);
    }

    let shape = GridShape::new(lines, ctx.column_tolerance(), ctx.row_tolerance());
    let sub_results = vec![grid_pattern(&shape), column_alignment(&shape), row_structure(&shape)];

    let (weighted, weights) = sub_results
        .iter()
        .filter(|r| r.confidence > 0.0)
        .map(|r| (r.confidence * weight_of(r.algorithm), weight_of(r.algorithm)))
        .fold((0.0, 0.0), |(s, w), (c, wt)| (s + c, w + wt));
    let combined = if weights > 0.0 { weighted / weights } else { 0.0 };

    let has_borders = match (ctx.graphics(), lines_bbox(lines)) {
        (Some(graphics), Some(area)) => {
            graphics.has_table_borders(&area, TABLE_BORDER_MARGIN, TABLE_MIN_BORDER_LINES)
        }
        _ => false,
    };

    let mut confidence = if has_borders && combined > 0.0 {
        (combined + GRAPHICS_TABLE_BONUS).min(1.0)
    } else {
        combined.min(TEXT_ONLY_TABLE_CEILING)
    };

    let list_like = is_list_pattern(&shape);
    if list_like {
        confidence *= LIST_PATTERN_PENALTY;
    }

    let columns = shape.significant_column_count();
    let rows = shape.rows.len();
    let is_table = confidence > ctx.metrics().table_min_confidence();
    debug!(
        "Table vote: {:.2} (grid {:.2}, align {:.2}, rows {:.2}), {}x{}, borders={}, list_like={}",
        confidence,
        sub_results[0].confidence,
        sub_results[1].confidence,
        sub_results[2].confidence,
        rows,
        columns,
        has_borders,
        list_like
    );

    Ok(ClassificationResult::new(
        Algorithm::Table,
        confidence,
        Classification::Table {
            is_table,
            columns,
            rows,
            has_borders,
            sub_results,
        },
    )
    .with_detail("list_pattern", list_like))
}

fn weight_of(algorithm: Algorithm) -> f32 {
    match algorithm {
        Algorithm::GridPattern => GRID_PATTERN_WEIGHT,
        Algorithm::ColumnAlignment => COLUMN_ALIGNMENT_WEIGHT,
        Algorithm::RowStructure => ROW_STRUCTURE_WEIGHT,
        _ => 0.0,
    }
}

fn table_payload(columns: usize, rows: usize) -> Classification {
    Classification::Table {
        is_table: false,
        columns,
        rows,
        has_borders: false,
        sub_results: Vec::new(),
    }
}

fn grid_pattern(shape: &GridShape<'_>) -> ClassificationResult {
    let columns = shape.significant_column_count();
    let rows = shape.rows.len();
    if columns < TABLE_MIN_COLUMNS || rows < TABLE_MIN_ROWS {
        return ClassificationResult::new(Algorithm::GridPattern, 0.0, table_payload(columns, rows));
    }

    let aligned_items: usize = shape.significant_columns().map(Cluster::len).sum();
    let aligned = aligned_items as f32 / shape.item_count as f32;
    let size = ((columns as f32 / 3.0).min(1.0) + (rows as f32 / 4.0).min(1.0)) / 2.0;
    let row_fill = shape.multi_item_rows() as f32 / rows as f32;
    let confidence = (0.7 * aligned + 0.3 * size) * row_fill;

    ClassificationResult::new(Algorithm::GridPattern, confidence, table_payload(columns, rows))
        .with_detail("aligned", aligned)
        .with_detail("row_fill", row_fill)
}

fn column_alignment(shape: &GridShape<'_>) -> ClassificationResult {
    let columns = shape.significant_column_count();
    let rows = shape.rows.len();
    if columns < TABLE_MIN_COLUMNS {
        return ClassificationResult::new(
            Algorithm::ColumnAlignment,
            0.0,
            table_payload(columns, rows),
        );
    }

    let landed_items: usize = shape.significant_columns().map(Cluster::len).sum();
    let landed = landed_items as f32 / shape.item_count as f32;
    let mut confidence =
        (0.6 * landed + 0.4 * (columns as f32 / 3.0).min(1.0)).min(COLUMN_ALIGNMENT_CAP);
    if shape.avg_chars > ROW_LONG_LINE_CHARS {
        confidence *= 0.5;
    }
    if shape.single_item_rows_only() {
        confidence *= SINGLE_ITEM_ROW_PENALTY;
    }

    ClassificationResult::new(Algorithm::ColumnAlignment, confidence, table_payload(columns, rows))
        .with_detail("landed", landed)
}

fn row_structure(shape: &GridShape<'_>) -> ClassificationResult {
    let columns = shape.significant_column_count();
    let rows = shape.rows.len();
    let gaps: Vec<f32> = shape.row_centers.windows(2).map(|w| w[1] - w[0]).collect();

    let Some((mean_gap, cv)) = coefficient_of_variation(&gaps) else {
        return ClassificationResult::new(Algorithm::RowStructure, 0.0, table_payload(columns, rows));
    };

    let mut confidence = (1.0 - cv / ROW_CV_MAX).max(0.0);
    if shape.avg_chars > ROW_LONG_LINE_CHARS {
        confidence *= 0.2;
    } else if shape.avg_chars > ROW_MEDIUM_LINE_CHARS {
        confidence *= 0.6;
    }
    if shape.single_item_rows_only() {
        confidence *= SINGLE_ITEM_ROW_PENALTY;
    }

    ClassificationResult::new(Algorithm::RowStructure, confidence, table_payload(columns, rows))
        .with_detail("mean_gap", mean_gap)
        .with_detail("cv", cv)
        .with_detail("avg_chars", shape.avg_chars)
}

/// Rows led by list markers are a list drawn with aligned columns, not a table.
fn is_list_pattern(shape: &GridShape<'_>) -> bool {
    let columns = shape.significant_column_count();
    if columns < TABLE_MIN_COLUMNS || shape.rows.is_empty() {
        return false;
    }

    let mut bullet_count = 0;
    let mut number_count = 0;
    for row in &shape.rows {
        let Some(first) = row.first() else {
            continue;
        };
        let text = first.text.trim();
        if is_bullet_marker(text) {
            bullet_count += 1;
        } else if is_number_marker(text) {
            number_count += 1;
        } else if let Some((marker, _)) = parse_marker(text) {
            if marker.is_ordered() {
                number_count += 1;
            } else {
                bullet_count += 1;
            }
        }
    }

    let rows = shape.rows.len() as f32;
    let bullet_ratio = bullet_count as f32 / rows;
    let total_ratio = (bullet_count + number_count) as f32 / rows;

    bullet_ratio >= 0.5 || (columns == 2 && total_ratio >= 0.5)
}

/// A standalone bullet glyph.
fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "▹" | "►" | "■" | "●" | "※"
            | "□" | "◆" | "◇" | "▶" | "▷" | "☞" | "➤" | "➜"
    )
}

/// A standalone number or letter marker ("1.", "12)", "3", "a.").
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    if let Some(pos) = cleaned.find(|c: char| !c.is_ascii_digit()) {
        let (prefix, suffix) = cleaned.split_at(pos);
        if !prefix.is_empty() && (suffix == "." || suffix == ")") {
            return true;
        }
    }

    if cleaned.parse::<u32>().is_ok() {
        return true;
    }

    let chars: Vec<char> = cleaned.chars().collect();
    chars.len() == 2 && chars[0].is_alphabetic() && (chars[1] == '.' || chars[1] == ')')
}

/// Bounding box of a set of lines.
pub fn lines_bbox(lines: &[Line]) -> Option<Rect> {
    let first = lines.first()?;
    let init = Rect::from_corners(first.x, first.top(), first.right, first.bottom());
    Some(lines[1..].iter().fold(init, |acc, l| {
        acc.union(&Rect::from_corners(l.x, l.top(), l.right, l.bottom()))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metrics;
    use crate::model::{GraphicsData, GraphicsLine};
    use std::sync::Arc;

    fn grid(rows: usize, cols: usize) -> Vec<Line> {
        let mut lines = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let text = format!("R{r}C{c}");
                lines.push(Line::new(text, 72.0 + c as f32 * 100.0, 100.0 + r as f32 * 15.0, 10.0));
            }
        }
        lines
    }

    #[test]
    fn test_four_by_three_grid() {
        let metrics = Metrics::new(10.0);
        let ctx = ClassifierContext::new(&metrics).with_tolerances(20.0, 5.0);
        let result = classify_table(&grid(4, 3), &ctx).unwrap();

        assert!(result.is_table());
        assert!(result.confidence > crate::config::TABLE_MIN_CONFIDENCE);
        assert!((result.confidence - TEXT_ONLY_TABLE_CEILING).abs() < 1e-4);
        let Classification::Table { columns, rows, .. } = &result.classification else {
            panic!("expected table payload");
        };
        assert_eq!((*columns, *rows), (3, 4));
        assert_eq!(result.sub_results().len(), 3);
    }

    #[test]
    fn test_borders_lift_ceiling() {
        let metrics = Metrics::new(10.0);
        let lines = grid(4, 3);
        let area = lines_bbox(&lines).unwrap();
        let graphics = GraphicsData {
            lines: vec![
                GraphicsLine::horizontal(area.x0, area.x1, area.y0 - 2.0, 0.5),
                GraphicsLine::horizontal(area.x0, area.x1, area.y1 + 2.0, 0.5),
                GraphicsLine::vertical(area.x0 - 2.0, area.y0, area.y1, 0.5),
            ],
            rectangles: vec![],
        };
        let ctx = ClassifierContext::new(&metrics)
            .with_tolerances(20.0, 5.0)
            .with_graphics(Arc::new(graphics));
        let result = classify_table(&lines, &ctx).unwrap();
        assert!(result.confidence > TEXT_ONLY_TABLE_CEILING);
        assert!(matches!(
            result.classification,
            Classification::Table { has_borders: true, .. }
        ));
    }

    #[test]
    fn test_paragraph_is_not_table() {
        let metrics = Metrics::new(12.0);
        let ctx = ClassifierContext::new(&metrics);
        let lines: Vec<Line> = (0..5)
            .map(|i| {
                Line::new(
                    "An ordinary line of paragraph text that runs across the page.",
                    72.0,
                    100.0 + i as f32 * 14.4,
                    12.0,
                )
            })
            .collect();
        let result = classify_table(&lines, &ctx).unwrap();
        assert!(!result.is_table());
        assert!(result.confidence < 0.3);
    }

    #[test]
    fn test_numbered_list_not_table() {
        let metrics = Metrics::new(12.0);
        let ctx = ClassifierContext::new(&metrics);
        let mut lines = Vec::new();
        for (i, text) in ["Setup", "Objects", "Routing", "VPN", "Operations"].iter().enumerate() {
            let y = 100.0 + i as f32 * 30.0;
            lines.push(Line::new(format!("{}.", i + 1), 50.0, y, 12.0));
            lines.push(Line::new(*text, 80.0, y, 12.0));
        }
        let result = classify_table(&lines, &ctx).unwrap();
        assert!(!result.is_table());
        assert_eq!(result.details["list_pattern"], serde_json::json!(true));
    }

    #[test]
    fn test_bullet_list_not_table() {
        let metrics = Metrics::new(12.0);
        let ctx = ClassifierContext::new(&metrics);
        let mut lines = Vec::new();
        for (i, text) in ["Management", "Interface/Service Option", "Firmware"].iter().enumerate() {
            let y = 100.0 + i as f32 * 30.0;
            lines.push(Line::new("-", 50.0, y, 12.0));
            lines.push(Line::new(*text, 80.0, y, 12.0));
        }
        assert!(!classify_table(&lines, &ctx).unwrap().is_table());
    }

    #[test]
    fn test_markers() {
        assert!(is_number_marker("1."));
        assert!(is_number_marker("12."));
        assert!(is_number_marker("1)"));
        assert!(is_number_marker("1 ."));
        assert!(is_number_marker("3"));
        assert!(is_number_marker("a."));
        assert!(is_number_marker("B)"));
        assert!(is_bullet_marker("•"));
        assert!(is_bullet_marker("–"));
        assert!(!is_number_marker("Name"));
        assert!(!is_bullet_marker("Alice"));
        assert!(!is_number_marker(""));
    }

    #[test]
    fn test_empty_errors() {
        let metrics = Metrics::new(12.0);
        let ctx = ClassifierContext::new(&metrics);
        assert!(matches!(classify_table(&[], &ctx), Err(Error::EmptyBlock)));
    }
}
