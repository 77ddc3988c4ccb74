//! Integration tests for table reconstruction.

mod common;

use common::{bold, grid_rows, single_page, tables, text};
use pagestruct::classify::{classify_table, ClassifierContext};
use pagestruct::table::{y_key, TableExtractor};
use pagestruct::{process, Block, Element, LayoutOptions, Line, Metrics};

const ROWS: [[&str; 3]; 4] = [
    ["Name", "Version", "License"],
    ["serde", "1.0", "MIT"],
    ["regex", "1.11", "MIT"],
    ["rayon", "1.10", "MIT"],
];

#[test]
fn test_grid_block_classifies_as_table() {
    let mut lines = Vec::new();
    for r in 0..4 {
        for c in 0..3 {
            lines.push(Line::new(format!("r{r}c{c}"), 72.0 + c as f32 * 100.0, 100.0 + r as f32 * 15.0, 10.0));
        }
    }
    let metrics = Metrics::new(10.0);
    let ctx = ClassifierContext::new(&metrics).with_tolerances(20.0, 5.0);
    let result = classify_table(&lines, &ctx).unwrap();

    assert!(result.is_table());
    assert!(result.confidence > pagestruct::config::TABLE_MIN_CONFIDENCE);
}

#[test]
fn test_single_column_table() {
    // A full-width title keeps the page in one column.
    let mut items = vec![bold("Installed packages and their versions", 72.0, 80.0, 12.0)];
    items.extend(grid_rows(&ROWS, 110.0));
    let layout = process(&single_page(items));
    let elements = &layout.pages[0].elements;

    let found = tables(elements);
    assert_eq!(found.len(), 1, "elements: {:?}", elements);
    let table = found[0];
    assert_eq!(table.row_count, 4);
    assert_eq!(table.column_count, 3);
    assert!(table.has_header);
    assert_eq!(table.rows[1], vec!["serde", "1.0", "MIT"]);
    assert!(table.is_rectangular());
}

#[test]
fn test_table_split_across_columns_is_merged() {
    let layout = process(&single_page(grid_rows(&ROWS, 100.0)));
    let elements = &layout.pages[0].elements;

    let found = tables(elements);
    assert_eq!(found.len(), 1, "elements: {:?}", elements);
    let table = found[0];
    assert_eq!(table.rows.len(), 4);
    assert_eq!(table.rows[0], vec!["Name", "Version", "License"]);
    assert_eq!(table.rows[3], vec!["rayon", "1.10", "MIT"]);
    assert!(table.has_header);
    assert_eq!(table.column_positions.as_ref().map(Vec::len), Some(3));

    // Every cell went into the table.
    assert_eq!(elements.len(), 1);
}

#[test]
fn test_tables_disabled() {
    let mut items = vec![bold("Installed packages and their versions", 72.0, 80.0, 12.0)];
    items.extend(grid_rows(&ROWS, 110.0));
    let options = LayoutOptions::new().with_tables(false);
    let layout = pagestruct::process_with_options(&single_page(items), options);

    assert!(tables(&layout.pages[0].elements).is_empty());
    let all_text: String = layout.elements().map(Element::plain_text).collect::<Vec<_>>().join(" ");
    assert!(all_text.contains("serde"));
}

#[test]
fn test_side_by_side_prose_is_not_a_table() {
    let left = [
        "the first column carries running text",
        "that wraps across several lines with a",
        "steady leading and no cell structure",
        "until the paragraph finally ends here.",
    ];
    let right = [
        "the second column does the same thing",
        "with its own sentences sitting on the",
        "same baselines as the column next to it",
        "and it should remain a plain paragraph.",
    ];
    let mut items = Vec::new();
    for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
        let y = 100.0 + i as f32 * 14.0;
        items.push(text(l, 72.0, y, 12.0));
        items.push(text(r, 340.0, y, 12.0));
    }
    let layout = process(&single_page(items));
    let elements = &layout.pages[0].elements;

    assert!(tables(elements).is_empty());
    let paragraphs: Vec<String> = elements
        .iter()
        .filter_map(|e| match e {
            Element::Paragraph(p) => Some(p.text.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(paragraphs.len(), 2, "elements: {:?}", elements);
    assert!(paragraphs[0].starts_with("the first column"));
    assert!(paragraphs[1].starts_with("the second column"));
}

#[test]
fn test_merged_table_keeps_every_column() {
    let left = [
        "the first column carries running text",
        "that wraps across several lines with a",
        "steady leading and no cell structure",
        "until the paragraph finally ends here.",
    ];
    let right = [
        "the second column does the same thing",
        "with its own sentences sitting on the",
        "same baselines as the column next to it",
        "and it should remain a plain paragraph.",
    ];
    let mut items = Vec::new();
    for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
        let y = 100.0 + i as f32 * 14.0;
        items.push(text(l, 72.0, y, 12.0));
        items.push(text(r, 340.0, y, 12.0));
    }
    let rows = [
        ["Name", "Qty", "Price"],
        ["Apple", "4", "1.20"],
        ["Pear", "7", "0.80"],
        ["Plum", "2", "0.50"],
    ];
    for (r, row) in rows.iter().enumerate() {
        let y = 200.0 + r as f32 * 15.0;
        for (cell, x) in row.iter().zip([72.0, 340.0, 460.0]) {
            items.push(text(cell, x, y, 12.0));
        }
    }

    let layout = process(&single_page(items));
    let elements = &layout.pages[0].elements;
    let found = tables(elements);
    assert_eq!(found.len(), 1, "elements: {:?}", elements);
    let table = found[0];
    assert_eq!(table.column_count, 3);
    assert_eq!(table.rows[0], vec!["Name", "Qty", "Price"]);
    assert_eq!(table.rows[3], vec!["Plum", "2", "0.50"]);
    let positions = table.column_positions.clone().unwrap_or_default();
    assert_eq!(positions.len(), 3);
    for (got, want) in positions.iter().zip([72.0, 340.0, 460.0]) {
        assert!((got - want).abs() < 1.0, "positions: {:?}", positions);
    }
}

#[test]
fn test_cross_column_y_keys() {
    assert_eq!(y_key(100.0, 1.2), y_key(100.04, 1.2));
    assert_ne!(y_key(100.0, 1.2), y_key(105.0, 1.2));
}

#[test]
fn test_extractor_on_block() {
    let mut lines = Vec::new();
    for (r, row) in ROWS.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            lines.push(Line::new(*cell, 72.0 + c as f32 * 100.0, 100.0 + r as f32 * 15.0, 12.0));
        }
    }
    let block = Block::from_lines(lines).unwrap();
    let table = TableExtractor::new(18.0, 4.8).extract(&block).unwrap();

    assert_eq!((table.row_count, table.column_count), (4, 3));
    assert_eq!(table.header().map(|h| h.to_vec()), Some(vec!["Name".to_string(), "Version".to_string(), "License".to_string()]));
}
