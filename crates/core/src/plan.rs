//! Page planning: how many slides a section needs for its items.

use crate::error::Result;
use crate::layout::{CapacitySchedule, Section, SectionConfig};
use std::ops::Range;

/// Number of pages needed to hold `item_count` rows.
///
/// An empty section gets `min_pages_if_empty` pages. Otherwise page
/// capacities are consumed in schedule order until every item is placed.
/// The result is not bounded by how many slides the template ships.
pub fn plan(item_count: usize, schedule: &CapacitySchedule, min_pages_if_empty: usize) -> usize {
    if item_count == 0 {
        return min_pages_if_empty;
    }

    let mut remaining = item_count;
    let mut pages = 0;
    while remaining > 0 {
        remaining = remaining.saturating_sub(schedule.capacity_of(pages));
        pages += 1;
    }
    pages
}

/// The half-open range of items shown on `page` (0-based).
///
/// Pages past the last item yield an empty range at the end.
pub fn page_window(item_count: usize, schedule: &CapacitySchedule, page: usize) -> Range<usize> {
    let start: usize = (0..page).map(|p| schedule.capacity_of(p)).sum();
    let start = start.min(item_count);
    let end = (start + schedule.capacity_of(page)).min(item_count);
    start..end
}

/// The pagination decision for one section of one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPlan {
    pub section: Section,
    pub item_count: usize,
    pub schedule: CapacitySchedule,
    pub page_count: usize,
    pub min_pages_if_empty: usize,
}

impl SectionPlan {
    pub fn new(config: &SectionConfig, item_count: usize) -> Result<Self> {
        let schedule = config.schedule()?;
        let page_count = plan(item_count, &schedule, config.min_pages_if_empty);
        Ok(Self {
            section: config.section,
            item_count,
            schedule,
            page_count,
            min_pages_if_empty: config.min_pages_if_empty,
        })
    }

    /// Items shown on `page`.
    pub fn window(&self, page: usize) -> Range<usize> {
        page_window(self.item_count, &self.schedule, page)
    }

    /// Table rows available on `page`.
    pub fn capacity_of(&self, page: usize) -> usize {
        self.schedule.capacity_of(page)
    }
}
