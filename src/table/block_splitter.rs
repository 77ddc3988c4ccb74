//! Table fragment splitting.
//!
//! When a table spans several detected columns, its first column lands in
//! column 0 and is grouped with whatever text sits above or below it. Lines
//! of a column-0 block whose normalized Y matches content in another column
//! are cut out as table fragments, for the column merger to pick up.

use std::collections::HashSet;

use log::debug;

use super::{is_paragraph_like, y_key};
use crate::model::{Block, BlockOrigin, ElementType, Line};

/// Partition column-0 blocks into table-fragment and regular sub-blocks.
///
/// Blocks that are not touched keep their classification; new sub-blocks are
/// unclassified.
pub fn split_table_fragments(blocks: Vec<Block>, y_tolerance: f32) -> Vec<Block> {
    let other_keys: HashSet<i64> = blocks
        .iter()
        .filter(|b| b.column > 0)
        .flat_map(|b| b.lines.iter())
        .map(|l| y_key(l.y, y_tolerance))
        .collect();
    if other_keys.is_empty() {
        return blocks;
    }

    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        if block.column != 0
            || block.origin == BlockOrigin::TableFragment
            || block.list_marker.is_some()
            || block.element_type() == Some(ElementType::Heading)
            || is_paragraph_like(&block)
        {
            out.push(block);
            continue;
        }

        let flags: Vec<bool> = block
            .lines
            .iter()
            .map(|l| other_keys.contains(&y_key(l.y, y_tolerance)))
            .collect();
        if !flags.iter().any(|f| *f) {
            out.push(block);
            continue;
        }

        let pieces = contiguous_runs(block.lines, &flags);
        debug!("Split column-0 block into {} table/regular pieces", pieces.len());
        for (fragment, lines) in pieces {
            if let Ok(mut piece) = Block::from_lines(lines) {
                if fragment {
                    piece.origin = BlockOrigin::TableFragment;
                }
                out.push(piece);
            }
        }
    }
    out
}

/// Cut lines into maximal runs sharing the same flag.
pub(crate) fn contiguous_runs(lines: Vec<Line>, flags: &[bool]) -> Vec<(bool, Vec<Line>)> {
    let mut runs: Vec<(bool, Vec<Line>)> = Vec::new();
    for (line, &flag) in lines.into_iter().zip(flags) {
        match runs.last_mut() {
            Some((current, run)) if *current == flag => run.push(line),
            _ => runs.push((flag, vec![line])),
        }
    }
    runs
}
