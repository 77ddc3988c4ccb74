//! Cross-column table merging.
//!
//! Lines from table fragments and from short-text blocks of the other
//! columns are grouped by normalized Y. Groups spanning at least two columns
//! are row candidates; consecutive rows with the same column count and a
//! small vertical gap chain into a table candidate, which must then pass
//! [`validate_table_structure`].

use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::debug;

use super::block_splitter::contiguous_runs;
use super::{detect_header, is_paragraph_like, y_key};
use crate::classify::{classify_table, fallback_classification, ClassifierContext};
use crate::classify::table::lines_bbox;
use crate::config::{
    TABLE_BORDER_MARGIN, TABLE_MAX_AVG_CELL_CHARS, TABLE_MAX_CELL_CHARS, TABLE_MERGE_MIN_CONFIDENCE,
    TABLE_MERGE_RELAXED_CONFIDENCE, TABLE_MIN_BORDER_LINES, TABLE_MIN_ROWS,
    TABLE_MIN_SHORT_CELL_RATIO, TABLE_RELAXED_AVG_CELL_CHARS, TABLE_RELAXED_MAX_CELL_CHARS,
    TABLE_SHORT_CELL_CHARS,
};
use crate::layout::clustering::{cluster_values, nearest_cluster, Cluster};
use crate::model::{Block, BlockOrigin, ElementType, Line, Table};

/// A merged table and where it belongs in reading order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedTable {
    /// The table
    pub table: Table,
    /// Leftmost column the table covers
    pub column: usize,
    /// Baseline of the first row
    pub y: f32,
}

/// Result of a merge pass.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Accepted tables
    pub tables: Vec<PlacedTable>,
    /// Blocks with the consumed lines removed
    pub blocks: Vec<Block>,
}

/// A line taking part in row grouping.
#[derive(Debug, Clone, Copy)]
struct LineRef {
    block: usize,
    line: usize,
    column: usize,
}

/// One row candidate: lines sharing a Y key across columns.
#[derive(Debug, Clone)]
struct Row {
    y: f32,
    columns: BTreeSet<usize>,
    members: Vec<LineRef>,
}

/// Joins table rows split across detected columns.
pub struct ColumnMerger<'c, 'm> {
    ctx: &'c ClassifierContext<'m>,
}

impl<'c, 'm> ColumnMerger<'c, 'm> {
    /// Create a merger over a page's classifier context.
    pub fn new(ctx: &'c ClassifierContext<'m>) -> Self {
        Self { ctx }
    }

    /// Find cross-column tables and take their lines out of the blocks.
    pub fn merge(&self, blocks: Vec<Block>) -> MergeOutcome {
        let metrics = self.ctx.metrics();
        let y_tolerance = metrics.y_key_tolerance();

        let rows = self.row_candidates(&blocks, y_tolerance);
        let chains = chain_rows(rows, metrics.row_gap_tolerance());

        let mut tables = Vec::new();
        let mut consumed: HashSet<(usize, usize)> = HashSet::new();
        for chain in chains {
            let row_lines: Vec<Vec<&Line>> = chain
                .iter()
                .map(|row| {
                    let mut lines: Vec<&Line> = row
                        .members
                        .iter()
                        .map(|m| &blocks[m.block].lines[m.line])
                        .collect();
                    lines.sort_by(|a, b| a.x.total_cmp(&b.x));
                    lines
                })
                .collect();

            let Some(confidence) = validate_table_structure(&row_lines, self.ctx) else {
                continue;
            };

            let table = build_table(&chain, &blocks, confidence, self.ctx.column_tolerance());
            debug!(
                "Merged cross-column table: {}x{} at y={:.1}",
                table.row_count, table.column_count, chain[0].y
            );
            for row in &chain {
                consumed.extend(row.members.iter().map(|m| (m.block, m.line)));
            }
            tables.push(PlacedTable {
                column: chain[0].columns.iter().next().copied().unwrap_or(0),
                y: chain[0].y,
                table,
            });
        }

        MergeOutcome {
            tables,
            blocks: rebuild_blocks(blocks, &consumed),
        }
    }

    fn row_candidates(&self, blocks: &[Block], y_tolerance: f32) -> Vec<Row> {
        let mut groups: BTreeMap<i64, Vec<LineRef>> = BTreeMap::new();
        for (bi, block) in blocks.iter().enumerate() {
            let eligible = match block.origin {
                BlockOrigin::TableFragment => true,
                BlockOrigin::Regular => {
                    block.column > 0
                        && block.list_marker.is_none()
                        && !is_paragraph_like(block)
                        && block.element_type() != Some(ElementType::Heading)
                }
            };
            if !eligible {
                continue;
            }
            for (li, line) in block.lines.iter().enumerate() {
                groups.entry(y_key(line.y, y_tolerance)).or_default().push(LineRef {
                    block: bi,
                    line: li,
                    column: line.column,
                });
            }
        }

        groups
            .into_values()
            .filter_map(|members| {
                let columns: BTreeSet<usize> = members.iter().map(|m| m.column).collect();
                if columns.len() < 2 {
                    return None;
                }
                let y = members
                    .iter()
                    .map(|m| blocks[m.block].lines[m.line].y)
                    .sum::<f32>()
                    / members.len() as f32;
                Some(Row { y, columns, members })
            })
            .collect()
    }
}

/// Chain rows with equal column counts and small gaps; keep chains long enough for a table.
fn chain_rows(rows: Vec<Row>, max_gap: f32) -> Vec<Vec<Row>> {
    let mut chains: Vec<Vec<Row>> = Vec::new();
    for row in rows {
        let extend = chains.last().and_then(|c| c.last()).is_some_and(|last| {
            last.columns.len() == row.columns.len() && row.y - last.y < max_gap
        });
        if extend {
            if let Some(chain) = chains.last_mut() {
                chain.push(row);
            }
        } else {
            chains.push(vec![row]);
        }
    }
    chains.retain(|c| c.len() >= TABLE_MIN_ROWS);
    chains
}

/// Check a candidate table's rows.
///
/// Returns the table confidence when the candidate is accepted. Border lines
/// near the candidate lower the confidence bar and relax the cell-length
/// checks.
pub fn validate_table_structure(rows: &[Vec<&Line>], ctx: &ClassifierContext<'_>) -> Option<f32> {
    let pooled: Vec<Line> = rows.iter().flatten().map(|l| (*l).clone()).collect();
    if pooled.is_empty() {
        return None;
    }

    let has_borders = match (ctx.graphics(), lines_bbox(&pooled)) {
        (Some(graphics), Some(area)) => {
            graphics.has_table_borders(&area, TABLE_BORDER_MARGIN, TABLE_MIN_BORDER_LINES)
        }
        _ => false,
    };

    let confidence = classify_table(&pooled, ctx).ok()?.confidence;
    let required = if has_borders {
        TABLE_MERGE_RELAXED_CONFIDENCE
    } else {
        TABLE_MERGE_MIN_CONFIDENCE
    };
    if confidence < required {
        debug!("Rejected table candidate: confidence {:.2} < {:.2}", confidence, required);
        return None;
    }

    let lengths: Vec<usize> = pooled.iter().map(|l| l.text.trim().chars().count()).collect();
    let avg = lengths.iter().sum::<usize>() as f32 / lengths.len() as f32;
    let max = lengths.iter().copied().max().unwrap_or(0);
    let short_ratio =
        lengths.iter().filter(|&&n| n <= TABLE_SHORT_CELL_CHARS).count() as f32 / lengths.len() as f32;

    let accepted = if has_borders {
        avg <= TABLE_RELAXED_AVG_CELL_CHARS && max <= TABLE_RELAXED_MAX_CELL_CHARS
    } else {
        avg <= TABLE_MAX_AVG_CELL_CHARS
            && max <= TABLE_MAX_CELL_CHARS
            && short_ratio >= TABLE_MIN_SHORT_CELL_RATIO
    };
    if !accepted {
        debug!(
            "Rejected table candidate: avg={:.1}, max={}, short={:.2}, borders={}",
            avg, max, short_ratio, has_borders
        );
        return None;
    }
    Some(confidence)
}

/// Lay out a chain's cells.
///
/// Within each layout column the member X positions are clustered again, so a
/// column holding several table columns yields one table column per cluster.
fn build_table(chain: &[Row], blocks: &[Block], confidence: f32, column_tolerance: f32) -> Table {
    let line_of = |m: LineRef| &blocks[m.block].lines[m.line];
    let page = blocks
        .get(chain[0].members[0].block)
        .map(|b| b.page_num)
        .unwrap_or(1);

    let mut xs_by_column: BTreeMap<usize, Vec<f32>> = BTreeMap::new();
    for member in chain.iter().flat_map(|r| &r.members) {
        xs_by_column.entry(member.column).or_default().push(line_of(*member).x);
    }
    // (layout column, clusters, index of its first table column)
    let mut layout: Vec<(usize, Vec<Cluster>, usize)> = Vec::with_capacity(xs_by_column.len());
    let mut width = 0;
    for (column, xs) in xs_by_column {
        let clusters = cluster_values(&xs, column_tolerance);
        let strong: Vec<Cluster> = clusters.iter().filter(|c| c.len() >= 2).cloned().collect();
        let clusters = if strong.is_empty() { clusters } else { strong };
        let count = clusters.len();
        layout.push((column, clusters, width));
        width += count;
    }

    let mut positions = vec![f32::MAX; width];
    let mut rows = Vec::with_capacity(chain.len());
    let mut first_row_lines: Vec<&Line> = Vec::new();

    for (ri, row) in chain.iter().enumerate() {
        let mut cells: Vec<Vec<&Line>> = vec![Vec::new(); width];
        for member in &row.members {
            let line = line_of(*member);
            let slot = layout
                .iter()
                .find(|(column, _, _)| *column == member.column)
                .and_then(|(_, clusters, first)| nearest_cluster(clusters, line.x).map(|c| first + c));
            if let Some(ci) = slot {
                cells[ci].push(line);
                positions[ci] = positions[ci].min(line.x);
            }
            if ri == 0 {
                first_row_lines.push(line);
            }
        }
        rows.push(
            cells
                .into_iter()
                .map(|mut cell| {
                    cell.sort_by(|a, b| a.x.total_cmp(&b.x));
                    cell.iter().map(|l| l.text.trim()).collect::<Vec<_>>().join(" ")
                })
                .collect::<Vec<String>>(),
        );
    }

    // A cluster no line landed in keeps its own left edge.
    for (_, clusters, first) in &layout {
        for (ci, cluster) in clusters.iter().enumerate() {
            if positions[first + ci] == f32::MAX {
                positions[first + ci] = cluster.min();
            }
        }
    }

    let has_header = detect_header(&rows, &first_row_lines);
    Table::from_rows(rows, page)
        .with_header(has_header)
        .with_column_positions(positions)
        .with_confidence(confidence)
}

/// Remove consumed lines; what remains of a block is rebuilt as contiguous pieces.
///
/// Table fragments that no table used become paragraphs.
fn rebuild_blocks(blocks: Vec<Block>, consumed: &HashSet<(usize, usize)>) -> Vec<Block> {
    let mut out = Vec::with_capacity(blocks.len());
    for (bi, block) in blocks.into_iter().enumerate() {
        let flags: Vec<bool> = (0..block.lines.len()).map(|li| consumed.contains(&(bi, li))).collect();
        let touched = flags.iter().any(|f| *f);
        let fragment = block.origin == BlockOrigin::TableFragment;

        if !touched {
            if fragment {
                out.push(into_paragraph(block));
            } else {
                out.push(block);
            }
            continue;
        }

        for (used, lines) in contiguous_runs(block.lines, &flags) {
            if used {
                continue;
            }
            if let Ok(piece) = Block::from_lines(lines) {
                out.push(if fragment { into_paragraph(piece) } else { piece });
            }
        }
    }
    out
}

fn into_paragraph(mut block: Block) -> Block {
    block.origin = BlockOrigin::Regular;
    block.classification = Some(fallback_classification("unused table fragment"));
    block
}
