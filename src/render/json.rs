//! JSON rendering for reconstructed layouts.

use serde::Serialize;

use crate::error::Result;
use crate::page::DocumentLayout;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

fn serialize<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value)?,
        JsonFormat::Compact => serde_json::to_string(value)?,
    };
    Ok(json)
}

/// Convert a layout to JSON, one entry per page.
pub fn to_json(layout: &DocumentLayout, format: JsonFormat) -> Result<String> {
    serialize(layout, format)
}

/// Convert a layout to a flat JSON array of elements in page order.
pub fn elements_to_json(layout: &DocumentLayout, format: JsonFormat) -> Result<String> {
    let elements: Vec<_> = layout.elements().collect();
    serialize(&elements, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, Heading, Paragraph};
    use crate::page::PageLayout;

    fn layout() -> DocumentLayout {
        DocumentLayout {
            pages: vec![
                PageLayout::complete(1, vec![Element::Heading(Heading::new("Overview", 1, 1))]),
                PageLayout::complete(2, vec![Element::Paragraph(Paragraph::new("Body text.", 2))]),
            ],
        }
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&layout(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"pageNum\": 1"));
        assert!(json.contains("\"type\": \"heading\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&layout(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains("\"status\":\"complete\""));
    }

    #[test]
    fn test_elements_flat_in_page_order() {
        let json = elements_to_json(&layout(), JsonFormat::Compact).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["type"], "heading");
        assert_eq!(array[1]["text"], "Body text.");
    }

    #[test]
    fn test_round_trip() {
        let json = to_json(&layout(), JsonFormat::Compact).unwrap();
        let back: DocumentLayout = serde_json::from_str(&json).unwrap();
        assert_eq!(back, layout());
    }
}
