//! Core domain types, pagination planning, and slide assembly
//! for résumé presentation decks.

pub mod assemble;
pub mod error;
pub mod extract;
pub mod fill;
pub mod index;
pub mod layout;
pub mod plan;
pub mod types;

#[cfg(test)]
mod testing;

pub use assemble::{assemble, SlideDeck, SlideSetBuilder};
pub use error::{Error, Result};
pub use extract::{achievement_items, extract, grant_items, paper_items};
pub use fill::{fill_table, truncate, TableDeck, TableFiller, TableSink};
pub use index::{SectionSpan, SlideIndexMap};
pub use layout::{
    CapacitySchedule, FieldCaps, Section, SectionConfig, TemplateLayout, TemplateMarkers,
};
pub use plan::{page_window, plan, SectionPlan};
pub use types::{
    Award, FlatItem, GrantGroup, GroupedRecord, ItemKind, OtherAchievement, PaperGroup, School,
    Subject, BLANK, UNKNOWN,
};
