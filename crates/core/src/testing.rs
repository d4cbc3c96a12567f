//! In-memory deck used by unit tests.

use crate::assemble::SlideDeck;
use crate::error::{Error, Result};
use crate::fill::{TableDeck, TableSink};
use crate::layout::TemplateLayout;

pub const COLUMNS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTable {
    pub rows: Vec<Vec<String>>,
}

impl MockTable {
    pub fn new(rows: usize) -> Self {
        let mut table: Vec<Vec<String>> = vec![vec![String::new(); COLUMNS]; rows];
        if let Some(header) = table.first_mut() {
            for (col, cell) in header.iter_mut().enumerate() {
                *cell = format!("header-{}", col);
            }
        }
        Self { rows: table }
    }

    pub fn column(&self, col: usize) -> Vec<&str> {
        self.rows[1..].iter().map(|r| r[col].as_str()).collect()
    }
}

impl TableSink for MockTable {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self, row: usize) -> usize {
        self.rows.get(row).map(Vec::len).unwrap_or(0)
    }

    fn set_cell(&mut self, row: usize, col: usize, text: &str) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = text.to_string();
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockSlide {
    pub label: String,
    pub table: Vec<Vec<String>>,
}

impl MockSlide {
    fn new(label: &str, rows: usize) -> Self {
        Self {
            label: label.to_string(),
            table: MockTable::new(rows).rows,
        }
    }
}

/// A deck of labelled slides, each holding one table.
#[derive(Debug, Clone)]
pub struct MockDeck {
    pristine: Vec<MockSlide>,
    pub slides: Vec<MockSlide>,
    deleted: Vec<String>,
    /// Fail every structural operation after this many have succeeded.
    pub fail_after: Option<usize>,
    operations: usize,
}

impl MockDeck {
    pub fn new(labels: &[&str], rows: usize) -> Self {
        let slides: Vec<MockSlide> = labels.iter().map(|l| MockSlide::new(l, rows)).collect();
        Self {
            pristine: slides.clone(),
            slides,
            deleted: Vec::new(),
            fail_after: None,
            operations: 0,
        }
    }

    /// Slides labelled after the layout: "cover", "summary", "basic",
    /// "{section}-{page}", ..., "closing". Section tables get one header
    /// row plus the page's capacity.
    pub fn template(layout: &TemplateLayout) -> Self {
        let mut slides = Vec::new();
        let leading = ["cover", "summary", "basic"];
        for i in 0..layout.leading_slides {
            let label = leading
                .get(i)
                .map(|l| l.to_string())
                .unwrap_or_else(|| format!("lead-{}", i));
            slides.push(MockSlide::new(&label, 2));
        }
        for config in &layout.sections {
            for page in 0..config.template_pages {
                let capacity = if page == 0 {
                    config.first_page_capacity
                } else {
                    config.subsequent_capacity
                };
                slides.push(MockSlide::new(
                    &format!("{}-{}", config.section, page + 1),
                    capacity + 1,
                ));
            }
        }
        for _ in 0..layout.trailing_slides {
            slides.push(MockSlide::new("closing", 2));
        }

        Self {
            pristine: slides.clone(),
            slides,
            deleted: Vec::new(),
            fail_after: None,
            operations: 0,
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.slides.iter().map(|s| s.label.clone()).collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.clone()
    }

    pub fn table(&self, slide: usize) -> MockTable {
        MockTable {
            rows: self.slides[slide].table.clone(),
        }
    }

    fn tick(&mut self) -> Result<()> {
        if let Some(limit) = self.fail_after {
            if self.operations >= limit {
                return Err(Error::PptxParseError("injected failure".to_string()));
            }
        }
        self.operations += 1;
        Ok(())
    }
}

impl SlideDeck for MockDeck {
    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn clone_template_slide(&mut self, template_index: usize, position: usize) -> Result<()> {
        self.tick()?;
        let slide = self
            .pristine
            .get(template_index)
            .cloned()
            .ok_or(Error::SlideIndexOutOfRange {
                index: template_index,
                len: self.pristine.len(),
            })?;
        if position > self.slides.len() {
            return Err(Error::SlideIndexOutOfRange {
                index: position,
                len: self.slides.len(),
            });
        }
        self.slides.insert(position, slide);
        Ok(())
    }

    fn delete_slide(&mut self, index: usize) -> Result<()> {
        self.tick()?;
        if index >= self.slides.len() {
            return Err(Error::SlideIndexOutOfRange {
                index,
                len: self.slides.len(),
            });
        }
        let slide = self.slides.remove(index);
        self.deleted.push(slide.label);
        Ok(())
    }
}

pub struct MockTableRef<'a> {
    rows: &'a mut Vec<Vec<String>>,
}

impl TableSink for MockTableRef<'_> {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self, row: usize) -> usize {
        self.rows.get(row).map(Vec::len).unwrap_or(0)
    }

    fn set_cell(&mut self, row: usize, col: usize, text: &str) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = text.to_string();
        }
    }
}

impl TableDeck for MockDeck {
    type Table<'a> = MockTableRef<'a>;

    fn table_mut(&mut self, slide: usize, table: usize) -> Result<Option<Self::Table<'_>>> {
        let len = self.slides.len();
        let slide = self
            .slides
            .get_mut(slide)
            .ok_or(Error::SlideIndexOutOfRange { index: slide, len })?;
        Ok((table == 0).then(|| MockTableRef {
            rows: &mut slide.table,
        }))
    }
}
