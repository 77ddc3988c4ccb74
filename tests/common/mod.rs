//! Shared builders for synthetic decoder output.

#![allow(dead_code)]

use pagestruct::{DocumentInput, Element, PageInput, TextItem, Viewport};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

/// A text item placed by its view-space baseline (y grows downward).
pub fn text(content: &str, x: f32, y: f32, size: f32) -> TextItem {
    let width = content.chars().count() as f32 * size * 0.5;
    TextItem::new(content, x, PAGE_HEIGHT - y, width, size).with_font("Helvetica")
}

/// Same as [`text`], in a bold face.
pub fn bold(content: &str, x: f32, y: f32, size: f32) -> TextItem {
    text(content, x, y, size).with_font("Helvetica-Bold")
}

/// A letter-size page holding `items`.
pub fn page(num: u32, items: Vec<TextItem>) -> PageInput {
    let mut page = PageInput::new(num, Viewport::for_page(PAGE_WIDTH, PAGE_HEIGHT));
    for item in items {
        page.push_text(item);
    }
    page
}

/// A one-page document.
pub fn single_page(items: Vec<TextItem>) -> DocumentInput {
    DocumentInput {
        pages: vec![page(1, items)],
    }
}

/// Grid rows at x = 72, 172, 272, starting at `top` with 15pt spacing.
pub fn grid_rows(rows: &[[&str; 3]], top: f32) -> Vec<TextItem> {
    let mut items = Vec::new();
    for (r, row) in rows.iter().enumerate() {
        let y = top + r as f32 * 15.0;
        for (c, cell) in row.iter().enumerate() {
            items.push(text(cell, 72.0 + c as f32 * 100.0, y, 12.0));
        }
    }
    items
}

pub fn tables(elements: &[Element]) -> Vec<&pagestruct::Table> {
    elements
        .iter()
        .filter_map(|e| match e {
            Element::Table(t) => Some(t),
            _ => None,
        })
        .collect()
}

pub fn lists(elements: &[Element]) -> Vec<&pagestruct::List> {
    elements
        .iter()
        .filter_map(|e| match e {
            Element::List(l) => Some(l),
            _ => None,
        })
        .collect()
}
