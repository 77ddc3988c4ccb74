//! List splitting and grouping.
//!
//! [`splitter`] cuts heading-plus-items text into separate blocks before
//! classification settles; [`grouper`] assembles the resulting items into
//! nested lists once every block has an element type.

pub mod grouper;
pub mod splitter;

pub use grouper::{Flow, ListEntry, ListGrouper};
pub use splitter::{split_block, split_list_blocks};
