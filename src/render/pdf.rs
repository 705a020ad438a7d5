//! PDF renderer using printpdf with the built-in Helvetica fonts.

use super::{DocumentRenderer, OutputFormat};
use crate::error::{LecternError, Result};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// US letter.
const PAGE_WIDTH_MM: f32 = 215.9;
const PAGE_HEIGHT_MM: f32 = 279.4;
const MARGIN_MM: f32 = 25.4;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 11.0;
const LINE_SPACING: f32 = 1.4;
/// Vertical gap after each paragraph, in points.
const PARAGRAPH_GAP_PT: f32 = 12.0;

const PT_TO_MM: f32 = 0.352_778;
/// Average Helvetica glyph width relative to the font size.
const AVG_CHAR_WIDTH_EM: f32 = 0.5;

/// A line positioned on a page.
#[derive(Debug, Clone, PartialEq)]
struct PlacedLine {
    text: String,
    font_size: f32,
    bold: bool,
    /// Baseline, measured from the bottom of the page.
    y_mm: f32,
}

/// Renders notes to a paginated PDF.
pub struct PdfRenderer {
    page_width_mm: f32,
    page_height_mm: f32,
    margin_mm: f32,
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self {
            page_width_mm: PAGE_WIDTH_MM,
            page_height_mm: PAGE_HEIGHT_MM,
            margin_mm: MARGIN_MM,
        }
    }

    fn usable_width_mm(&self) -> f32 {
        self.page_width_mm - 2.0 * self.margin_mm
    }

    /// Characters that fit on one line at `font_size`.
    fn chars_per_line(&self, font_size: f32) -> usize {
        let char_width_mm = font_size * AVG_CHAR_WIDTH_EM * PT_TO_MM;
        ((self.usable_width_mm() / char_width_mm).floor() as usize).max(1)
    }

    /// Lay out the title and paragraphs into pages of positioned lines.
    fn layout(&self, title: &str, paragraphs: &[String]) -> Vec<Vec<PlacedLine>> {
        let top = self.page_height_mm - self.margin_mm;
        let mut pages: Vec<Vec<PlacedLine>> = vec![Vec::new()];
        let mut y = top;

        let place = |pages: &mut Vec<Vec<PlacedLine>>, y: &mut f32, text: String, font_size: f32, bold: bool| {
            let line_height = font_size * LINE_SPACING * PT_TO_MM;
            if *y - line_height < self.margin_mm && pages.last().is_some_and(|p| !p.is_empty()) {
                pages.push(Vec::new());
                *y = top;
            }
            *y -= line_height;
            if let Some(page) = pages.last_mut() {
                page.push(PlacedLine { text, font_size, bold, y_mm: *y });
            }
        };

        for line in wrap_text(&pdf_safe(title), self.chars_per_line(TITLE_SIZE)) {
            place(&mut pages, &mut y, line, TITLE_SIZE, true);
        }
        y -= PARAGRAPH_GAP_PT * PT_TO_MM;

        for paragraph in paragraphs {
            for source_line in paragraph.lines() {
                let (text, size, bold) = match heading_text(source_line) {
                    Some(heading) => (heading, HEADING_SIZE, true),
                    None => (source_line, BODY_SIZE, false),
                };
                for line in wrap_text(&pdf_safe(text), self.chars_per_line(size)) {
                    place(&mut pages, &mut y, line, size, bold);
                }
            }
            y -= PARAGRAPH_GAP_PT * PT_TO_MM;
        }

        pages
    }
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, title: &str, paragraphs: &[String], path: &Path) -> Result<()> {
        let pages = self.layout(title, paragraphs);
        debug!("Rendering {} PDF pages to {:?}", pages.len(), path);

        let (doc, first_page, first_layer) = PdfDocument::new(
            title,
            Mm(self.page_width_mm),
            Mm(self.page_height_mm),
            "Layer 1",
        );
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| LecternError::Render(format!("Failed to load font: {}", e)))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| LecternError::Render(format!("Failed to load font: {}", e)))?;

        for (i, lines) in pages.iter().enumerate() {
            let (page, layer) = if i == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(Mm(self.page_width_mm), Mm(self.page_height_mm), "Layer 1")
            };
            let layer = doc.get_page(page).get_layer(layer);

            for line in lines {
                let font = if line.bold { &bold } else { &regular };
                layer.use_text(
                    line.text.clone(),
                    line.font_size,
                    Mm(self.margin_mm),
                    Mm(line.y_mm),
                    font,
                );
            }
        }

        let file = File::create(path)
            .map_err(|e| LecternError::Render(format!("Failed to create {}: {}", path.display(), e)))?;
        doc.save(&mut BufWriter::new(file))
            .map_err(|e| LecternError::Render(format!("Failed to write PDF: {}", e)))?;

        Ok(())
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Pdf
    }
}

/// Text of a Markdown heading line, without the leading `#` marks.
fn heading_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('#') {
        return None;
    }
    let text = trimmed.trim_start_matches('#').trim();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Greedy word wrap. Words longer than a line are split.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() { word.len() } else { current_len + 1 + word.len() };
        if needed > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Map text onto characters the built-in (WinAnsi) fonts can show.
fn pdf_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => '"',
            '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
            '\u{2022}' | '\u{25CF}' | '\u{25E6}' => '-',
            '\u{2026}' => '.',
            '\t' => ' ',
            c if (' '..='~').contains(&c) || ('\u{A0}'..='\u{FF}').contains(&c) => c,
            _ => '?',
        })
        .collect()
}
