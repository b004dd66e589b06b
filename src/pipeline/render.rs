//! PDF output: lay translated text out line by line and serialise it with lopdf.
//!
//! The layout is plain: one PDF text line per `\n` in the input,
//! every line at the same x offset, baselines stepping down by a fixed
//! leading. There is no word wrap, so long lines run off the right edge.
//! When the next baseline would fall below the bottom margin a new page is
//! started and the cursor returns to the top.
//!
//! Text is drawn in the standard Helvetica Type1 font with WinAnsiEncoding,
//! which needs no embedded font file. Characters outside that code page are
//! written as `?`.
//!
//! Everything here is synchronous; callers run it on the blocking pool.

use crate::config::PageLayout;
use crate::error::DocTranslateError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

/// A serialised PDF ready to be sent or written.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// One line placed on a page: baseline y and the text to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub y: f32,
    pub text: String,
}

/// Distribute `text` over pages according to `layout`.
///
/// Splits on `\n` (a trailing `\r` on each line is dropped). Always returns
/// at least one page, even for empty text.
pub fn layout_pages(text: &str, layout: &PageLayout) -> Vec<Vec<PlacedLine>> {
    let top = layout.first_baseline();
    let mut pages: Vec<Vec<PlacedLine>> = vec![Vec::new()];
    let mut y = top;

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(page) = pages.last_mut() {
            page.push(PlacedLine {
                y,
                text: line.to_string(),
            });
        }
        y -= layout.line_height;
        if y < layout.margin_bottom {
            pages.push(Vec::new());
            y = top;
        }
    }

    // The last line may have exactly filled a page.
    if pages.len() > 1 && pages.last().is_some_and(Vec::is_empty) {
        pages.pop();
    }
    pages
}

/// Render `text` into a complete PDF document.
pub fn create_pdf(text: &str, layout: &PageLayout) -> Result<RenderedPdf, DocTranslateError> {
    let pages = layout_pages(text, layout);
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for lines in &pages {
        let page_id = add_page(&mut doc, pages_id, lines, layout)?;
        kids.push(page_id.into());
    }

    let page_count = kids.len();
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            layout.page_width.into(),
            layout.page_height.into(),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| DocTranslateError::RenderFailed(e.to_string()))?;

    debug!("Rendered {} page(s), {} bytes", page_count, bytes.len());
    Ok(RenderedPdf { bytes, page_count })
}

fn add_page(
    doc: &mut Document,
    parent: ObjectId,
    lines: &[PlacedLine],
    layout: &PageLayout,
) -> Result<ObjectId, DocTranslateError> {
    let mut operations = Vec::with_capacity(lines.len() * 5);
    for line in lines {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec!["F1".into(), layout.font_size.into()],
        ));
        operations.push(Operation::new(
            "Td",
            vec![layout.margin_left.into(), line.y.into()],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_win_ansi(&line.text))],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    let content = Content { operations }
        .encode()
        .map_err(|e| DocTranslateError::RenderFailed(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => parent,
        "Contents" => content_id,
    }))
}

/// Encode text for a WinAnsiEncoding font. Unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        '\t' => b' ',
        ' '..='~' => c as u8,
        '\u{A0}'..='\u{FF}' => c as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '•' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => b'?',
    }
}
