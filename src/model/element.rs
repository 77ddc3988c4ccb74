//! Output elements.

use serde::{Deserialize, Serialize};

use super::classification::ElementType;
use super::table::Table;

/// One reconstructed structural unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    /// A heading
    Heading(Heading),
    /// A paragraph
    Paragraph(Paragraph),
    /// A (possibly nested) list
    List(List),
    /// A table
    Table(Table),
}

impl Element {
    /// Element type.
    pub fn element_type(&self) -> ElementType {
        match self {
            Element::Heading(_) => ElementType::Heading,
            Element::Paragraph(_) => ElementType::Paragraph,
            Element::List(_) => ElementType::List,
            Element::Table(_) => ElementType::Table,
        }
    }

    /// Page the element starts on.
    pub fn page(&self) -> u32 {
        match self {
            Element::Heading(h) => h.page,
            Element::Paragraph(p) => p.page,
            Element::List(l) => l.page,
            Element::Table(t) => t.page,
        }
    }

    /// Plain text content.
    pub fn plain_text(&self) -> String {
        match self {
            Element::Heading(h) => h.text.clone(),
            Element::Paragraph(p) => p.text.clone(),
            Element::List(l) => l
                .items
                .iter()
                .map(|i| i.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            Element::Table(t) => t.plain_text(),
        }
    }

    /// Check if this is a heading.
    pub fn is_heading(&self) -> bool {
        matches!(self, Element::Heading(_))
    }

    /// Check if this is a list.
    pub fn is_list(&self) -> bool {
        matches!(self, Element::List(_))
    }

    /// Check if this is a table.
    pub fn is_table(&self) -> bool {
        matches!(self, Element::Table(_))
    }
}

/// A heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading text
    pub text: String,
    /// Level (1-6)
    pub level: u8,
    /// Bold text
    pub bold: bool,
    /// Italic text
    pub italic: bool,
    /// Underlined text
    pub underline: bool,
    /// The heading introduces a list
    pub introduces_list: bool,
    /// 1-indexed page number
    pub page: u32,
    /// Decision confidence
    pub confidence: f32,
}

impl Heading {
    /// Create a heading.
    pub fn new(text: impl Into<String>, level: u8, page: u32) -> Self {
        Self {
            text: text.into(),
            level: level.clamp(1, 6),
            bold: false,
            italic: false,
            underline: false,
            introduces_list: false,
            page,
            confidence: 1.0,
        }
    }
}

/// A paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Paragraph text
    pub text: String,
    /// Predominantly bold
    pub bold: bool,
    /// Predominantly italic
    pub italic: bool,
    /// 1-indexed page number
    pub page: u32,
    /// Decision confidence
    pub confidence: f32,
}

impl Paragraph {
    /// Create a paragraph.
    pub fn new(text: impl Into<String>, page: u32) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
            page,
            confidence: 1.0,
        }
    }
}

/// A list with its items in document order.
///
/// Nested items follow their parent item and carry a higher `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    /// Items
    pub items: Vec<ListItem>,
    /// Top-level items are ordered
    pub ordered: bool,
    /// 1-indexed page number of the first item
    pub page: u32,
}

impl List {
    /// Create an empty list.
    pub fn new(ordered: bool, page: u32) -> Self {
        Self {
            items: Vec::new(),
            ordered,
            page,
        }
    }

    /// Append an item, assigning its position.
    pub fn push(&mut self, mut item: ListItem) {
        item.position = self.items.len();
        self.items.push(item);
    }

    /// Items at nesting level 0.
    pub fn top_level(&self) -> impl Iterator<Item = &ListItem> {
        self.items.iter().filter(|i| i.level == 0)
    }

    /// Items nested under the top-level item at `index` (0-based among top-level items).
    pub fn children_of(&self, index: usize) -> Vec<&ListItem> {
        let Some(start) = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, i)| i.level == 0)
            .nth(index)
            .map(|(pos, _)| pos)
        else {
            return Vec::new();
        };
        self.items[start + 1..]
            .iter()
            .take_while(|i| i.level > 0)
            .collect()
    }
}

/// One list item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// Item text without its marker
    pub text: String,
    /// Nesting level (0 = top level)
    pub level: u8,
    /// Belongs to an ordered sequence
    pub ordered: bool,
    /// Marker as written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    /// Position within the list
    pub position: usize,
}

impl ListItem {
    /// Create an item.
    pub fn new(text: impl Into<String>, level: u8, ordered: bool) -> Self {
        Self {
            text: text.into(),
            level,
            ordered,
            marker: None,
            position: 0,
        }
    }

    /// Set the marker.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_tagging() {
        let element = Element::Heading(Heading::new("Title", 1, 1));
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["type"], "heading");
        assert_eq!(json["level"], 1);

        let back: Element = serde_json::from_value(json).unwrap();
        assert_eq!(back, element);
    }

    #[test]
    fn test_heading_level_clamped() {
        assert_eq!(Heading::new("x", 0, 1).level, 1);
        assert_eq!(Heading::new("x", 9, 1).level, 6);
    }

    #[test]
    fn test_list_children() {
        let mut list = List::new(true, 1);
        list.push(ListItem::new("one", 0, true));
        list.push(ListItem::new("two", 0, true));
        list.push(ListItem::new("a", 1, false));
        list.push(ListItem::new("b", 1, false));

        assert_eq!(list.items[3].position, 3);
        assert_eq!(list.top_level().count(), 2);
        assert!(list.children_of(0).is_empty());
        let children: Vec<_> = list.children_of(1).iter().map(|i| i.text.as_str()).collect();
        assert_eq!(children, vec!["a", "b"]);
    }

    #[test]
    fn test_plain_text() {
        let mut list = List::new(false, 1);
        list.push(ListItem::new("first", 0, false));
        list.push(ListItem::new("second", 0, false));
        assert_eq!(Element::List(list).plain_text(), "first\nsecond");
    }
}
