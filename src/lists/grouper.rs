//! List grouping.
//!
//! Consecutive list items become one [`List`]. Indentation relative to the
//! first item decides the nesting level; an ordered item can resume an
//! earlier ordered list even when an unrelated list came in between.

use log::debug;

use crate::config::{LIST_INDENT_MIN, LIST_INDENT_RATIO, LIST_MAX_LEVEL};
use crate::model::{Element, List, ListItem, ListMarker};

/// A list item waiting to be placed in a list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    /// Item text without its marker
    pub text: String,
    /// Marker, when one was found
    pub marker: Option<ListMarker>,
    /// Numbered item
    pub ordered: bool,
    /// Left edge of the item
    pub x: f32,
    /// 1-indexed page number
    pub page: u32,
}

/// Page content in reading order, before lists are assembled.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// A finished element
    Element(Element),
    /// One list item
    Item(ListEntry),
}

/// Assembles list items into lists.
#[derive(Debug, Clone)]
pub struct ListGrouper {
    indent_unit: f32,
}

impl ListGrouper {
    /// Create a grouper; one nesting level per `max(base × 0.15, 10)` points.
    pub fn new(base_font_size: f32) -> Self {
        Self {
            indent_unit: (base_font_size * LIST_INDENT_RATIO).max(LIST_INDENT_MIN),
        }
    }

    /// Points of indentation per nesting level.
    pub fn indent_unit(&self) -> f32 {
        self.indent_unit
    }

    /// Nesting level of an item at `x` in a list whose first item sits at `base_x`.
    pub fn level_for(&self, x: f32, base_x: f32) -> u8 {
        let steps = ((x - base_x) / self.indent_unit).floor();
        steps.clamp(0.0, LIST_MAX_LEVEL as f32) as u8
    }

    /// Replace runs of items with lists; other elements keep their place.
    pub fn group(&self, flow: Vec<Flow>) -> Vec<Element> {
        let mut out: Vec<Element> = Vec::with_capacity(flow.len());
        // Lists of the current run, in creation order.
        let mut open: Vec<usize> = Vec::new();
        let mut current: Option<usize> = None;
        let mut base_x: Option<f32> = None;

        for piece in flow {
            let entry = match piece {
                Flow::Element(element) => {
                    out.push(element);
                    open.clear();
                    current = None;
                    base_x = None;
                    continue;
                }
                Flow::Item(entry) => entry,
            };

            if current.is_none() {
                if let Some(Element::Heading(heading)) = out.last_mut() {
                    heading.introduces_list = true;
                }
            }

            let base = match base_x {
                Some(base) if entry.x >= base - self.indent_unit / 2.0 => base,
                _ => {
                    base_x = Some(entry.x);
                    entry.x
                }
            };
            let level = self.level_for(entry.x, base);

            let target = match current {
                Some(index) if level > 0 || list_at(&out, index).is_some_and(|l| l.ordered == entry.ordered) => index,
                _ => {
                    let resumed = entry
                        .ordered
                        .then(|| {
                            open.iter()
                                .rev()
                                .copied()
                                .find(|&i| list_at(&out, i).is_some_and(|l| l.ordered))
                        })
                        .flatten();
                    match resumed {
                        Some(index) => {
                            debug!("Resuming ordered list at element {}", index);
                            index
                        }
                        None => {
                            out.push(Element::List(List::new(entry.ordered, entry.page)));
                            let index = out.len() - 1;
                            open.push(index);
                            index
                        }
                    }
                }
            };
            current = Some(target);

            if let Some(Element::List(list)) = out.get_mut(target) {
                let mut item = ListItem::new(entry.text, level, entry.ordered);
                item.marker = entry.marker.map(|m| m.glyph);
                list.push(item);
            }
        }

        out
    }
}

fn list_at(elements: &[Element], index: usize) -> Option<&List> {
    match elements.get(index) {
        Some(Element::List(list)) => Some(list),
        _ => None,
    }
}
