//! Markdown to paginated documents.
//!
//! Markdown is parsed line by line into [`Element`]s (headings, styled
//! paragraphs, numbered and bulleted list items, tables, images), which are
//! then serialized to Typst markup and compiled to PDF.

mod block;
mod config;
mod error;
mod fence;
mod image;
pub mod inline;
pub mod list;
mod parser;
mod render;
pub mod table;
mod typst;

pub use block::{
    Border, BorderEdges, Color, Element, Font, Heading, Image, Inline, LineHeight, ListMarker,
    ListParagraph, Paragraph, Spacing, Table, TableCell, TextRun,
};
pub use config::{Alignment, Config, ConfigError, Direction, DocumentType, Style};
pub use error::{Error, Result};
pub use image::{FsImageResolver, ImageData, ImageError, ImageFormat, ImageRef, ImageResolver};
pub use render::bookmark_id;

use std::path::Path;

use typst_as_lib::TypstEngine;
use typst_as_lib::typst_kit_options::TypstKitFontOptions;
use typst_pdf::PdfOptions;

/// Load a style configuration file, or the bundled default when no path is
/// given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None => Ok(Config::compiled_default()),
    }
}

/// Parse markdown text into document elements, resolving images through
/// `images`.
pub fn parse(markdown: &str, config: &Config, images: &dyn ImageResolver) -> Vec<Element> {
    parser::parse(markdown, config, images)
}

/// Serialize already parsed elements to Typst markup.
pub fn elements_to_typst(elements: &[Element], config: &Config) -> String {
    typst::elements_to_typst(elements, config)
}

/// Convert markdown to Typst markup, loading images relative to the
/// working directory.
pub fn markdown_to_typst(markdown: &str, config: &Config) -> String {
    markdown_to_typst_with(markdown, config, &FsImageResolver::default())
}

pub fn markdown_to_typst_with(
    markdown: &str,
    config: &Config,
    images: &dyn ImageResolver,
) -> String {
    let elements = parse(markdown, config, images);
    log::debug!("parsed {} elements", elements.len());
    typst::elements_to_typst(&elements, config)
}

/// Convert markdown to PDF bytes.
pub fn markdown_to_pdf(
    markdown: &str,
    config: &Config,
    images: &dyn ImageResolver,
) -> Result<Vec<u8>> {
    use typst_library::layout::PagedDocument;

    let typst_content = markdown_to_typst_with(markdown, config, images);

    let font_options = TypstKitFontOptions::new()
        .include_embedded_fonts(true)
        .include_system_fonts(false);

    let engine = TypstEngine::builder()
        .main_file(typst_content)
        .search_fonts_with(font_options)
        .build();

    let doc: PagedDocument = engine
        .compile()
        .output
        .map_err(|e| Error::Compile(format!("{:?}", e)))?;

    typst_pdf::pdf(&doc, &PdfOptions::default()).map_err(|e| Error::Pdf(format!("{:?}", e)))
}
