//! Absolute slide positions of every section page.

use crate::layout::{Section, TemplateLayout};
use std::ops::Range;

/// The run of slides one section occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpan {
    pub section: Section,
    pub start: usize,
    pub pages: usize,
}

/// Lookup from (section, page) to absolute slide position.
///
/// Built purely from the leading slide count, the per-section page counts
/// in slide order, and the trailing slide count. Changing any section's
/// page count means building a new map; nothing is patched in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideIndexMap {
    leading: usize,
    spans: Vec<SectionSpan>,
    trailing: usize,
}

impl SlideIndexMap {
    pub fn compute(leading: usize, pages: &[(Section, usize)], trailing: usize) -> Self {
        let mut start = leading;
        let spans = pages
            .iter()
            .map(|&(section, pages)| {
                let span = SectionSpan {
                    section,
                    start,
                    pages,
                };
                start += pages;
                span
            })
            .collect();

        Self {
            leading,
            spans,
            trailing,
        }
    }

    /// The map of the unmodified template.
    pub fn for_template(layout: &TemplateLayout) -> Self {
        let pages: Vec<(Section, usize)> = layout
            .sections
            .iter()
            .map(|c| (c.section, c.template_pages))
            .collect();
        Self::compute(layout.leading_slides, &pages, layout.trailing_slides)
    }

    /// A fresh map with `section` resized to `pages`.
    pub fn with_pages(&self, section: Section, pages: usize) -> Self {
        let counts: Vec<(Section, usize)> = self
            .spans
            .iter()
            .map(|s| (s.section, if s.section == section { pages } else { s.pages }))
            .collect();
        Self::compute(self.leading, &counts, self.trailing)
    }

    pub fn span(&self, section: Section) -> Option<&SectionSpan> {
        self.spans.iter().find(|s| s.section == section)
    }

    pub fn spans(&self) -> &[SectionSpan] {
        &self.spans
    }

    /// Slide range of `section`.
    pub fn range(&self, section: Section) -> Option<Range<usize>> {
        self.span(section).map(|s| s.start..s.start + s.pages)
    }

    pub fn pages(&self, section: Section) -> usize {
        self.span(section).map(|s| s.pages).unwrap_or(0)
    }

    /// Absolute position of `page` (0-based) of `section`, if it exists.
    pub fn slide_index(&self, section: Section, page: usize) -> Option<usize> {
        self.span(section)
            .filter(|s| page < s.pages)
            .map(|s| s.start + page)
    }

    /// Position of the first slide after every section.
    pub fn trailing_start(&self) -> usize {
        self.leading + self.spans.iter().map(|s| s.pages).sum::<usize>()
    }

    /// Slides the deck must contain.
    pub fn total(&self) -> usize {
        self.trailing_start() + self.trailing
    }
}
