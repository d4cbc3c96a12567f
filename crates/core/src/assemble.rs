//! Slide set assembly: grow or shrink each section's slide run to its
//! planned page count.

use crate::error::{Error, Result};
use crate::index::SlideIndexMap;
use crate::layout::{Section, TemplateLayout};
use crate::plan::SectionPlan;
use std::cmp::Ordering;

/// Structural operations a presentation backend provides.
///
/// Implementations must keep the deck internally consistent: deleting a
/// slide releases its relationship entry and owned parts, and cloning
/// always copies the pristine template slide, never a filled one.
pub trait SlideDeck {
    /// Number of slides currently in the deck.
    fn slide_count(&self) -> usize;

    /// Insert a structural copy of the pristine template slide at
    /// `template_index` so that it lands at `position`.
    fn clone_template_slide(&mut self, template_index: usize, position: usize) -> Result<()>;

    /// Remove the slide at `index`.
    fn delete_slide(&mut self, index: usize) -> Result<()>;
}

/// Reconciles section page counts against a deck that starts out as a
/// fresh template copy.
pub struct SlideSetBuilder<'d, D: SlideDeck> {
    deck: &'d mut D,
    template: SlideIndexMap,
    map: SlideIndexMap,
}

impl<'d, D: SlideDeck> SlideSetBuilder<'d, D> {
    /// Wrap a freshly opened template copy.
    pub fn new(deck: &'d mut D, layout: &TemplateLayout) -> Result<Self> {
        let template = SlideIndexMap::for_template(layout);
        let actual = deck.slide_count();
        if actual != template.total() {
            return Err(Error::TemplateMismatch(format!(
                "layout expects {} slides, template has {}",
                template.total(),
                actual
            )));
        }

        Ok(Self {
            deck,
            map: template.clone(),
            template,
        })
    }

    /// The slide index map as of the last reconciliation.
    pub fn map(&self) -> &SlideIndexMap {
        &self.map
    }

    /// Release the deck, keeping the final map.
    pub fn into_map(self) -> SlideIndexMap {
        self.map
    }

    /// Bring `section` to `planned_pages` slides.
    ///
    /// Surplus slides are removed from the end of the section's run so the
    /// first page keeps its header content. Missing slides are cloned from
    /// the section's last pristine template slide and inserted right after
    /// the section's current last slide. The returned map reflects the new
    /// positions of every section.
    pub fn reconcile(&mut self, section: Section, planned_pages: usize) -> Result<&SlideIndexMap> {
        let range = self.map.range(section).ok_or_else(|| {
            Error::InvalidLayout(format!("section {} is not part of the layout", section))
        })?;
        let current = range.len();

        match planned_pages.cmp(&current) {
            Ordering::Less => {
                log::debug!(
                    "Removing {} {} slide(s) at {}..{}",
                    current - planned_pages,
                    section,
                    range.start + planned_pages,
                    range.end
                );
                for index in (range.start + planned_pages..range.end).rev() {
                    self.deck.delete_slide(index)?;
                }
            }
            Ordering::Equal => {}
            Ordering::Greater => {
                let source = self.template_source(section)?;
                log::debug!(
                    "Cloning template slide {} {} time(s) for {} at {}",
                    source,
                    planned_pages - current,
                    section,
                    range.end
                );
                for offset in 0..planned_pages - current {
                    self.deck.clone_template_slide(source, range.end + offset)?;
                }
            }
        }

        let next = self.map.with_pages(section, planned_pages);
        let actual = self.deck.slide_count();
        if actual != next.total() {
            return Err(Error::DeckOutOfSync {
                expected: next.total(),
                actual,
            });
        }
        self.map = next;

        Ok(&self.map)
    }

    /// Last template slide of `section`, the source for every clone.
    fn template_source(&self, section: Section) -> Result<usize> {
        self.template
            .range(section)
            .filter(|r| !r.is_empty())
            .map(|r| r.end - 1)
            .ok_or_else(|| {
                Error::InvalidLayout(format!(
                    "section {} has no template slide to clone",
                    section
                ))
            })
    }
}

/// Reconcile every planned section in order and return the final map.
pub fn assemble<D: SlideDeck>(
    deck: &mut D,
    layout: &TemplateLayout,
    plans: &[SectionPlan],
) -> Result<SlideIndexMap> {
    let mut builder = SlideSetBuilder::new(deck, layout)?;
    for plan in plans {
        builder.reconcile(plan.section, plan.page_count)?;
    }
    Ok(builder.into_map())
}
