//! Text runs and visual lines in page-view space.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::input::{TextItem, Viewport};
use crate::config::PAGE_PLAUSIBLE_MARGIN;
use crate::error::{Error, Result};

/// A text run with position and style information, in page-view space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline, grows downward)
    pub y: f32,
    /// Width of the text
    pub width: f32,
    /// Font size in points
    pub font_size: f32,
    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,
    /// Whether the font appears to be bold
    pub bold: bool,
    /// Whether the font appears to be italic
    pub italic: bool,
    /// Whether a border line sits under the run
    pub underline: bool,
    /// 1-indexed page number
    pub page_num: u32,
}

impl TextRun {
    /// Create a run with no font name.
    ///
    /// A zero width is replaced by an estimate of half the font size per character.
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32, font_size: f32) -> Self {
        let text = text.into();
        let width = if width > 0.0 {
            width
        } else {
            estimate_width(&text, font_size)
        };
        Self {
            text,
            x,
            y,
            width,
            font_size,
            font_name: String::new(),
            bold: false,
            italic: false,
            underline: false,
            page_num: 1,
        }
    }

    /// Set the font name and derive bold/italic from it.
    pub fn with_font(mut self, font_name: impl Into<String>) -> Self {
        self.font_name = font_name.into();
        (self.bold, self.italic) = font_style(&self.font_name);
        self
    }

    /// Set the page number.
    pub fn on_page(mut self, page_num: u32) -> Self {
        self.page_num = page_num;
        self
    }

    /// Convert a decoder text item into view space.
    pub fn from_item(item: &TextItem, viewport: &Viewport) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidTextItem {
            page: item.page_num,
            reason: reason.to_string(),
        };

        if item.text.trim().is_empty() {
            return Err(invalid("empty text"));
        }
        if !item.x.is_finite() || !item.y.is_finite() {
            return Err(invalid("non-finite position"));
        }
        if !item.font_size.is_finite() || item.font_size <= 0.0 {
            return Err(invalid("non-positive font size"));
        }

        let matrix = viewport.matrix();
        let (x, y) = matrix.transform_point(item.x, item.y);
        if !viewport.is_plausible(x, y, PAGE_PLAUSIBLE_MARGIN) {
            return Err(invalid("outside the page"));
        }
        let horizontal_scale = (matrix.a * matrix.a + matrix.b * matrix.b).sqrt();
        let font_size = item.font_size * matrix.scale_factor();
        let width = if item.width.is_finite() {
            item.width.abs() * horizontal_scale
        } else {
            0.0
        };

        Ok(TextRun::new(normalize_text(&item.text), x, y, width, font_size)
            .with_font(item.font_name.clone())
            .on_page(item.page_num))
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Approximate top of the glyphs (ascender).
    pub fn top(&self) -> f32 {
        self.y - self.font_size * 0.8
    }

    /// Approximate bottom of the glyphs (descender).
    pub fn bottom(&self) -> f32 {
        self.y + self.font_size * 0.2
    }

    /// Number of characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// A visual line: runs sharing a baseline band within one column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// The runs in this line, sorted by X position
    pub runs: Vec<TextRun>,
    /// Combined text with inferred spacing
    pub text: String,
    /// Leftmost X position
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Rightmost X position
    pub right: f32,
    /// Dominant font size (weighted by character count)
    pub font_size: f32,
    /// Predominantly bold
    pub bold: bool,
    /// Predominantly italic
    pub italic: bool,
    /// Predominantly underlined
    pub underline: bool,
    /// 1-indexed page number
    pub page_num: u32,
    /// Column index, assigned by column detection
    pub column: usize,
}

impl Line {
    /// Create a single-run line; handy for synthetic input.
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32) -> Self {
        Self::from_runs(vec![TextRun::new(text, x, y, 0.0, font_size)])
    }

    /// Create a line from runs.
    pub fn from_runs(mut runs: Vec<TextRun>) -> Self {
        if runs.is_empty() {
            return Self::default();
        }

        runs.sort_by(|a, b| a.x.total_cmp(&b.x));

        let total_chars: usize = runs.iter().map(TextRun::char_count).sum();
        let font_size = if total_chars > 0 {
            char_weighted(&runs, total_chars, |r| r.font_size)
        } else {
            runs[0].font_size
        };
        let flag = |set: bool| if set { 1.0 } else { 0.0 };
        let bold = char_weighted(&runs, total_chars, |r| flag(r.bold)) > 0.5;
        let italic = char_weighted(&runs, total_chars, |r| flag(r.italic)) > 0.5;
        let underline = char_weighted(&runs, total_chars, |r| flag(r.underline)) > 0.5;

        let text = assemble_text(&runs);
        let x = runs[0].x;
        let y = runs[0].y;
        let right = runs.iter().map(TextRun::right).fold(f32::MIN, f32::max);
        let page_num = runs[0].page_num;

        Self {
            runs,
            text,
            x,
            y,
            right,
            font_size,
            bold,
            italic,
            underline,
            page_num,
            column: 0,
        }
    }

    /// Set bold on every run and on the line.
    pub fn bold(mut self) -> Self {
        for run in &mut self.runs {
            run.bold = true;
        }
        self.bold = true;
        self
    }

    /// Set the page number on every run and on the line.
    pub fn on_page(mut self, page_num: u32) -> Self {
        for run in &mut self.runs {
            run.page_num = page_num;
        }
        self.page_num = page_num;
        self
    }

    /// Set the column index.
    pub fn in_column(mut self, column: usize) -> Self {
        self.column = column;
        self
    }

    /// Mark the line underlined.
    pub fn set_underline(&mut self) {
        for run in &mut self.runs {
            run.underline = true;
        }
        self.underline = true;
    }

    /// A new line carrying part of this line's text at `x`, keeping its style.
    pub fn fragment(&self, text: &str, x: f32) -> Line {
        let mut run = TextRun::new(text, x, self.y, 0.0, self.font_size).on_page(self.page_num);
        run.bold = self.bold;
        run.italic = self.italic;
        run.underline = self.underline;
        let mut line = Line::from_runs(vec![run]);
        line.column = self.column;
        line
    }

    /// Horizontal extent.
    pub fn width(&self) -> f32 {
        (self.right - self.x).max(0.0)
    }

    /// Approximate top of the glyphs.
    pub fn top(&self) -> f32 {
        self.y - self.font_size * 0.8
    }

    /// Approximate bottom of the glyphs.
    pub fn bottom(&self) -> f32 {
        self.y + self.font_size * 0.2
    }

    /// Number of characters of combined text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Check if the line appears to be uppercase.
    pub fn is_uppercase(&self) -> bool {
        let mut letters = self.text.chars().filter(|c| c.is_alphabetic()).peekable();
        letters.peek().is_some() && letters.all(char::is_uppercase)
    }

    /// Whether the line has no visible text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Bold and italic flags inferred from a font name.
pub fn font_style(font_name: &str) -> (bool, bool) {
    let lower = font_name.to_lowercase();
    let bold = lower.contains("bold") || lower.contains("black") || lower.contains("heavy");
    let italic = lower.contains("italic") || lower.contains("oblique");
    (bold, italic)
}

fn char_weighted(runs: &[TextRun], total_chars: usize, value: impl Fn(&TextRun) -> f32) -> f32 {
    if total_chars == 0 {
        return 0.0;
    }
    runs.iter()
        .map(|r| value(r) * r.char_count() as f32)
        .sum::<f32>()
        / total_chars as f32
}

/// Presentation-form ligatures decoders pass through from font encodings.
const LIGATURES: &[(char, &str)] = &[
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

/// NFC-normalize decoder text and expand ligatures.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfc() {
        match LIGATURES.iter().find(|(ligature, _)| *ligature == c) {
            Some((_, expanded)) => out.push_str(expanded),
            None => out.push(c),
        }
    }
    out
}

fn estimate_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.5
}

/// Join runs, inserting spaces where the X gap is wide enough.
///
/// No space is inserted between two characters of a script that does not
/// separate words with spaces.
fn assemble_text(runs: &[TextRun]) -> String {
    let mut result = String::new();

    for (i, run) in runs.iter().enumerate() {
        if i == 0 {
            result.push_str(&run.text);
            continue;
        }

        let prev = &runs[i - 1];
        let gap = run.x - prev.right();

        let char_count = run.char_count();
        let avg_char_width = if char_count > 0 && run.width > 0.0 {
            run.width / char_count as f32
        } else {
            run.font_size * 0.5
        };

        let should_insert_space = if gap > avg_char_width * 0.2 {
            let prev_spaceless = prev
                .text
                .chars()
                .last()
                .map(is_spaceless_script_char)
                .unwrap_or(false);
            let curr_spaceless = run
                .text
                .chars()
                .next()
                .map(is_spaceless_script_char)
                .unwrap_or(false);
            !(prev_spaceless && curr_spaceless)
        } else {
            false
        };

        let prev_ends_with_space = prev.text.ends_with(' ') || prev.text.ends_with('\u{00A0}');
        let curr_starts_with_space = run.text.starts_with(' ') || run.text.starts_with('\u{00A0}');

        if should_insert_space && !prev_ends_with_space && !curr_starts_with_space {
            result.push(' ');
        }

        result.push_str(&run.text);
    }

    result
}

/// Chinese and Japanese don't use spaces between words, but Korean does.
pub(crate) fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        // Hiragana, Katakana
        || (0x3040..=0x30FF).contains(&code)
        // CJK Symbols and Punctuation
        || (0x3000..=0x303F).contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_run_style_from_font() {
        let run = TextRun::new("Test", 0.0, 0.0, 20.0, 12.0).with_font("Helvetica-Bold");
        assert!(run.bold);
        assert!(!run.italic);

        let run = TextRun::new("Test", 0.0, 0.0, 20.0, 12.0).with_font("Times-Oblique");
        assert!(!run.bold);
        assert!(run.italic);
    }

    #[test]
    fn test_from_item_flips_y() {
        let item = TextItem::new("Hello", 72.0, 720.0, 30.0, 12.0);
        let run = TextRun::from_item(&item, &Viewport::for_page(612.0, 792.0)).unwrap();
        assert_eq!(run.x, 72.0);
        assert_eq!(run.y, 72.0);
        assert_eq!(run.font_size, 12.0);
    }

    #[test]
    fn test_from_item_rejects_bad_items() {
        let viewport = Viewport::default();
        assert!(TextRun::from_item(&TextItem::new("  ", 0.0, 0.0, 1.0, 12.0), &viewport).is_err());
        assert!(
            TextRun::from_item(&TextItem::new("x", f32::NAN, 0.0, 1.0, 12.0), &viewport).is_err()
        );
        assert!(TextRun::from_item(&TextItem::new("x", 0.0, 0.0, 1.0, 0.0), &viewport).is_err());
        assert!(TextRun::from_item(&TextItem::new("x", 1.0e10, 100.0, 1.0, 12.0), &viewport).is_err());
        assert!(TextRun::from_item(&TextItem::new("x", 100.0, -5.0e9, 1.0, 12.0), &viewport).is_err());
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("\u{FB01}nding \u{FB02}owers"), "finding flowers");
        assert_eq!(normalize_text("cafe\u{0301}"), "caf\u{00E9}");
        assert_eq!(normalize_text("plain"), "plain");
    }

    #[test]
    fn test_line_text_spacing() {
        let runs = vec![
            TextRun::new("World", 60.0, 100.0, 30.0, 12.0),
            TextRun::new("Hello", 0.0, 100.0, 30.0, 12.0),
        ];
        let line = Line::from_runs(runs);
        assert_eq!(line.text, "Hello World");
        assert_eq!(line.x, 0.0);
        assert_eq!(line.right, 90.0);
    }

    #[test]
    fn test_line_text_adjacent_runs() {
        let runs = vec![
            TextRun::new("Hel", 0.0, 100.0, 18.0, 12.0),
            TextRun::new("lo", 18.0, 100.0, 12.0, 12.0),
        ];
        assert_eq!(Line::from_runs(runs).text, "Hello");
    }

    #[test]
    fn test_line_text_cjk() {
        let runs = vec![
            TextRun::new("日本", 0.0, 100.0, 24.0, 12.0),
            TextRun::new("語", 30.0, 100.0, 12.0, 12.0),
        ];
        assert_eq!(Line::from_runs(runs).text, "日本語");
    }

    #[test]
    fn test_line_bold_majority() {
        let runs = vec![
            TextRun::new("Bold text", 0.0, 100.0, 54.0, 12.0).with_font("Arial-Bold"),
            TextRun::new("x", 60.0, 100.0, 6.0, 12.0),
        ];
        let line = Line::from_runs(runs);
        assert!(line.bold);
        assert!(!line.italic);
    }

    #[test]
    fn test_fragment_keeps_style() {
        let line = Line::new("Key: • a • b", 10.0, 50.0, 14.0).bold().in_column(2);
        let fragment = line.fragment("a", 40.0);
        assert_eq!(fragment.text, "a");
        assert_eq!(fragment.y, 50.0);
        assert!(fragment.bold);
        assert_eq!(fragment.column, 2);
    }

    #[test]
    fn test_uppercase() {
        assert!(Line::new("INTRODUCTION 1", 0.0, 0.0, 12.0).is_uppercase());
        assert!(!Line::new("Introduction", 0.0, 0.0, 12.0).is_uppercase());
        assert!(!Line::new("123", 0.0, 0.0, 12.0).is_uppercase());
    }
}
