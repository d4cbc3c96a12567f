//! Table filling: write each page's window of items into its slide table.

use crate::assemble::SlideDeck;
use crate::error::{Error, Result};
use crate::index::SlideIndexMap;
use crate::layout::FieldCaps;
use crate::plan::SectionPlan;
use crate::types::{FlatItem, ItemKind};
use unicode_normalization::UnicodeNormalization;

/// A table whose first row is a header and every further row holds data.
pub trait TableSink {
    /// Physical rows, header included.
    fn row_count(&self) -> usize;

    /// Cells in `row`.
    fn column_count(&self, row: usize) -> usize;

    /// Replace the text of one cell. Out-of-range cells are ignored.
    fn set_cell(&mut self, row: usize, col: usize, text: &str);
}

impl<T: TableSink + ?Sized> TableSink for &mut T {
    fn row_count(&self) -> usize {
        (**self).row_count()
    }

    fn column_count(&self, row: usize) -> usize {
        (**self).column_count(row)
    }

    fn set_cell(&mut self, row: usize, col: usize, text: &str) {
        (**self).set_cell(row, col, text)
    }
}

/// A deck whose slides expose editable tables.
pub trait TableDeck: SlideDeck {
    type Table<'a>: TableSink
    where
        Self: 'a;

    /// The `table`-th table on `slide`, or `None` if the slide has fewer
    /// tables. Fails if `slide` is past the end of the deck.
    fn table_mut(&mut self, slide: usize, table: usize) -> Result<Option<Self::Table<'_>>>;
}

/// Cut `text` to at most `cap` characters. No ellipsis is appended.
///
/// Text is NFC-normalized first so composed characters count once.
pub fn truncate(text: &str, cap: usize) -> String {
    text.nfc().take(cap).collect()
}

/// Clear every data row of `table`, then write up to `row_capacity` rows.
///
/// Rows beyond the capacity (or beyond the table's physical rows) are
/// dropped. Returns the number of rows written.
pub fn fill_table<T: TableSink + ?Sized>(
    table: &mut T,
    rows: &[Vec<String>],
    row_capacity: usize,
) -> usize {
    let physical = table.row_count();
    for row in 1..physical {
        for col in 0..table.column_count(row) {
            table.set_cell(row, col, "");
        }
    }

    let writable = row_capacity.min(physical.saturating_sub(1));
    let written = rows.len().min(writable);
    for (offset, cells) in rows.iter().take(written).enumerate() {
        let row = offset + 1;
        for (col, text) in cells.iter().enumerate().take(table.column_count(row)) {
            table.set_cell(row, col, text);
        }
    }

    if rows.len() > written {
        log::debug!(
            "Dropped {} row(s) beyond table capacity {}",
            rows.len() - written,
            writable
        );
    }

    written
}

/// Formats flat items into table rows and writes them page by page.
#[derive(Debug, Clone)]
pub struct TableFiller {
    caps: FieldCaps,
    awards_label: String,
    empty_state: String,
}

impl Default for TableFiller {
    fn default() -> Self {
        Self::new(FieldCaps::default())
    }
}

impl TableFiller {
    pub fn new(caps: FieldCaps) -> Self {
        Self {
            caps,
            awards_label: "获奖情况".to_string(),
            empty_state: "暂无".to_string(),
        }
    }

    /// Label shown on the first award row of each achievements table.
    pub fn with_awards_label(mut self, label: impl Into<String>) -> Self {
        self.awards_label = label.into();
        self
    }

    /// Text written into an empty grants or achievements table.
    pub fn with_empty_state(mut self, text: impl Into<String>) -> Self {
        self.empty_state = text.into();
        self
    }

    /// Table rows for one page window.
    ///
    /// The first award row of a page shows how many awards that page holds.
    pub fn rows(&self, window: &[FlatItem]) -> Vec<Vec<String>> {
        let caps = &self.caps;
        let page_awards = window.iter().filter(|i| i.kind == ItemKind::Award).count();
        window
            .iter()
            .enumerate()
            .map(|(i, item)| match item.kind {
                ItemKind::Paper => vec![
                    truncate(&item.venue, caps.paper_venue),
                    truncate(&item.title, caps.paper_title),
                    "1".to_string(),
                    String::new(),
                    truncate(&item.category, caps.paper_category),
                ],
                ItemKind::Grant => vec![
                    truncate(&item.category, caps.grant_category),
                    truncate(&item.title, caps.grant_names),
                    item.count.clone(),
                    truncate(&item.year, caps.grant_year),
                    truncate(&item.remarks, caps.grant_remarks),
                ],
                // Awards always lead the stream, so only the window's first
                // row can be the table's first award row.
                ItemKind::Award if i == 0 => vec![
                    self.awards_label.clone(),
                    truncate(&item.title, caps.award_name),
                    format!("{}项", page_awards),
                    item.year.clone(),
                ],
                ItemKind::Award => vec![
                    String::new(),
                    truncate(&item.title, caps.award_name),
                    "1项".to_string(),
                    item.year.clone(),
                ],
                ItemKind::Other => {
                    let year_remarks = format!("{} {}", item.year, item.remarks);
                    vec![
                        truncate(&item.category, caps.other_category),
                        truncate(&item.title, caps.other_names),
                        item.count.clone(),
                        truncate(year_remarks.trim(), caps.other_year_remarks),
                    ]
                }
            })
            .collect()
    }

    /// Fill every page of `plan`'s section in `deck`.
    ///
    /// The section must already be reconciled to `plan.page_count` slides;
    /// otherwise rows would land on the wrong slides and this fails.
    pub fn fill_section<D: TableDeck>(
        &self,
        deck: &mut D,
        map: &SlideIndexMap,
        plan: &SectionPlan,
        items: &[FlatItem],
    ) -> Result<()> {
        let assembled = map.pages(plan.section);
        if assembled != plan.page_count {
            return Err(Error::DeckOutOfSync {
                expected: plan.page_count,
                actual: assembled,
            });
        }

        for page in 0..plan.page_count {
            let slide = map
                .slide_index(plan.section, page)
                .ok_or(Error::SlideIndexOutOfRange {
                    index: page,
                    len: assembled,
                })?;
            let len = deck.slide_count();
            if slide >= len {
                return Err(Error::SlideIndexOutOfRange { index: slide, len });
            }

            let window = plan.window(page);
            let mut rows = self.rows(&items[window.clone()]);
            if items.is_empty() && plan.min_pages_if_empty > 0 && !self.empty_state.is_empty() {
                rows.push(vec![String::new(), self.empty_state.clone()]);
            }

            match deck.table_mut(slide, 0)? {
                Some(mut table) => {
                    let written = fill_table(&mut table, &rows, plan.capacity_of(page));
                    log::debug!(
                        "Filled {} page {}/{} (slide {}): items {:?}, {} row(s)",
                        plan.section,
                        page + 1,
                        plan.page_count,
                        slide,
                        window,
                        written
                    );
                }
                None => log::warn!("Slide {} has no table for {}", slide, plan.section),
            }
        }

        Ok(())
    }
}
