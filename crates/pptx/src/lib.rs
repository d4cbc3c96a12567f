//! PPTX (Office Open XML) backend for résumé decks.
//!
//! A .pptx is a ZIP archive of XML parts. The template is held in memory
//! as a package plus parsed slide trees, edited through the core's
//! `SlideDeck` and `TableDeck` traits, and written back as a new archive.

pub mod deck;
pub mod package;
pub mod render;
pub mod slide;
pub mod xml;

#[cfg(test)]
mod fixture;

pub use deck::PptxDeck;
pub use package::Package;
pub use render::{basic_info_lines, format_birth_date, PaperStats, TemplateRenderer};
pub use slide::PptxTable;
pub use xml::{Element, Node, XmlDocument};
