//! Template layout configuration.
//!
//! Describes where things live in the shipped template (fixed leading and
//! trailing slides, one run of slides per repeating section), how many rows
//! each section's tables hold, and the per-field truncation caps. The
//! defaults match the stock résumé template; a JSON file can override any
//! part of it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A repeating content section rendered as one or more table slides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Published papers.
    Papers,
    /// Approved grants and projects.
    Grants,
    /// Awards followed by other achievements, in one table stream.
    Achievements,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Papers => "papers",
            Section::Grants => "grants",
            Section::Achievements => "achievements",
        };
        f.write_str(name)
    }
}

/// Row capacity per page of a section. The last entry repeats for every
/// page past the end of the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct CapacitySchedule(Vec<usize>);

impl CapacitySchedule {
    /// Build a schedule. Fails on an empty list or a zero capacity, either
    /// of which would make pagination meaningless.
    pub fn new(capacities: Vec<usize>) -> Result<Self> {
        if capacities.is_empty() {
            return Err(Error::InvalidLayout(
                "capacity schedule must have at least one entry".to_string(),
            ));
        }
        if let Some(page) = capacities.iter().position(|&c| c == 0) {
            return Err(Error::InvalidLayout(format!(
                "capacity of page {} is zero",
                page + 1
            )));
        }
        Ok(Self(capacities))
    }

    /// Rows available on `page` (0-based).
    pub fn capacity_of(&self, page: usize) -> usize {
        // Non-empty by construction.
        self.0
            .get(page)
            .or_else(|| self.0.last())
            .copied()
            .unwrap_or(1)
    }

    pub fn capacities(&self) -> &[usize] {
        &self.0
    }
}

impl TryFrom<Vec<usize>> for CapacitySchedule {
    type Error = Error;

    fn try_from(capacities: Vec<usize>) -> Result<Self> {
        Self::new(capacities)
    }
}

impl From<CapacitySchedule> for Vec<usize> {
    fn from(schedule: CapacitySchedule) -> Self {
        schedule.0
    }
}

/// Pagination settings for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub section: Section,
    /// Rows on the first slide of the section.
    pub first_page_capacity: usize,
    /// Rows on every later slide.
    pub subsequent_capacity: usize,
    /// Pages to keep when the section has no items.
    pub min_pages_if_empty: usize,
    /// Slides the template ships for this section.
    pub template_pages: usize,
}

impl SectionConfig {
    pub fn papers() -> Self {
        Self {
            section: Section::Papers,
            first_page_capacity: 8,
            subsequent_capacity: 11,
            min_pages_if_empty: 0,
            template_pages: 2,
        }
    }

    pub fn grants() -> Self {
        Self {
            section: Section::Grants,
            first_page_capacity: 10,
            subsequent_capacity: 10,
            min_pages_if_empty: 1,
            template_pages: 1,
        }
    }

    pub fn achievements() -> Self {
        Self {
            section: Section::Achievements,
            first_page_capacity: 7,
            subsequent_capacity: 7,
            min_pages_if_empty: 1,
            template_pages: 1,
        }
    }

    pub fn schedule(&self) -> Result<CapacitySchedule> {
        CapacitySchedule::new(vec![self.first_page_capacity, self.subsequent_capacity])
    }
}

/// Hard character caps per table field. Longer text is cut without any
/// ellipsis marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldCaps {
    pub paper_venue: usize,
    pub paper_title: usize,
    pub paper_category: usize,
    pub grant_category: usize,
    pub grant_names: usize,
    pub grant_year: usize,
    pub grant_remarks: usize,
    pub award_name: usize,
    pub other_category: usize,
    pub other_names: usize,
    pub other_year_remarks: usize,
}

impl Default for FieldCaps {
    fn default() -> Self {
        Self {
            paper_venue: 60,
            paper_title: 80,
            paper_category: 20,
            grant_category: 30,
            grant_names: 100,
            grant_year: 30,
            grant_remarks: 50,
            award_name: 80,
            other_category: 20,
            other_names: 80,
            other_year_remarks: 50,
        }
    }
}

/// Literal text the template uses to mark fillable shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateMarkers {
    /// Sample names to replace with the subject's name.
    pub name_placeholders: Vec<String>,
    /// Page header shape, rewritten to "{name}  {header}：".
    pub position_header: String,
    /// Cover shape whose "（N人）" count is updated.
    pub cover_title: String,
    /// Any of these identifies the basic-info text box.
    pub basic_info: Vec<String>,
    /// Sample birth year; other text boxes on the basic-info slide that
    /// still show it are cleared.
    pub sample_birth_year: String,
    /// Paper statistics text box.
    pub paper_statistics: String,
    /// Note boxes, kept only on the first achievements slide.
    pub notes: Vec<String>,
    /// Awards label shown once per achievements table.
    pub awards_label: String,
    /// Written into an otherwise empty grants or achievements table.
    pub empty_state: String,
}

impl Default for TemplateMarkers {
    fn default() -> Self {
        Self {
            name_placeholders: ["name", "Name", "NAME", "苑津山"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            position_header: "拟聘岗位".to_string(),
            cover_title: "人才引进".to_string(),
            basic_info: ["博士毕业生", "未婚", "周岁", "1999"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            sample_birth_year: "1999".to_string(),
            paper_statistics: "发表论文情况".to_string(),
            notes: vec!["备注：".to_string(), "备注:".to_string()],
            awards_label: "获奖情况".to_string(),
            empty_state: "暂无".to_string(),
        }
    }
}

/// Slide structure of the template and everything needed to paginate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateLayout {
    /// Index of the cover slide.
    pub cover_slide: usize,
    /// Index of the basic-info slide.
    pub basic_info_slide: usize,
    /// Fixed slides before the first section (cover, summary, basic info).
    pub leading_slides: usize,
    /// Repeating sections, in slide order.
    pub sections: Vec<SectionConfig>,
    /// Fixed slides after the last section (closing opinion).
    pub trailing_slides: usize,
    /// First slide that belongs to a subject; everything from here to the
    /// end is merged into the combined deck.
    pub subject_first_slide: usize,
    pub field_caps: FieldCaps,
    pub markers: TemplateMarkers,
}

impl Default for TemplateLayout {
    fn default() -> Self {
        Self {
            cover_slide: 0,
            basic_info_slide: 2,
            leading_slides: 3,
            sections: vec![
                SectionConfig::papers(),
                SectionConfig::grants(),
                SectionConfig::achievements(),
            ],
            trailing_slides: 1,
            subject_first_slide: 2,
            field_caps: FieldCaps::default(),
            markers: TemplateMarkers::default(),
        }
    }
}

impl TemplateLayout {
    /// Parse and validate a layout from JSON. Omitted keys keep defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let layout: Self = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.sections.is_empty() {
            return Err(Error::InvalidLayout("no sections configured".to_string()));
        }

        for (i, config) in self.sections.iter().enumerate() {
            if self.sections[..i].iter().any(|c| c.section == config.section) {
                return Err(Error::InvalidLayout(format!(
                    "section {} configured twice",
                    config.section
                )));
            }
            if config.template_pages == 0 {
                return Err(Error::InvalidLayout(format!(
                    "section {} needs at least one template slide to clone from",
                    config.section
                )));
            }
            config.schedule()?;
        }

        if self.cover_slide >= self.leading_slides || self.basic_info_slide >= self.leading_slides
        {
            return Err(Error::InvalidLayout(
                "cover and basic-info slides must be leading slides".to_string(),
            ));
        }
        if self.subject_first_slide > self.leading_slides {
            return Err(Error::InvalidLayout(
                "subject slides must start before the first section".to_string(),
            ));
        }

        Ok(())
    }

    pub fn section(&self, section: Section) -> Option<&SectionConfig> {
        self.sections.iter().find(|c| c.section == section)
    }

    /// Number of slides in the unmodified template.
    pub fn template_slide_count(&self) -> usize {
        self.leading_slides
            + self.sections.iter().map(|c| c.template_pages).sum::<usize>()
            + self.trailing_slides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_valid() {
        let layout = TemplateLayout::default();
        layout.validate().unwrap();
        assert_eq!(layout.template_slide_count(), 8);
        assert_eq!(layout.section(Section::Papers).unwrap().template_pages, 2);
    }

    #[test]
    fn test_schedule_last_entry_repeats() {
        let schedule = CapacitySchedule::new(vec![8, 11]).unwrap();
        assert_eq!(schedule.capacity_of(0), 8);
        assert_eq!(schedule.capacity_of(1), 11);
        assert_eq!(schedule.capacity_of(7), 11);
    }

    #[test]
    fn test_schedule_rejects_zero_and_empty() {
        assert!(CapacitySchedule::new(vec![]).is_err());
        assert!(CapacitySchedule::new(vec![8, 0]).is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let layout = TemplateLayout::from_json(r#"{"field_caps": {"paper_title": 40}}"#).unwrap();
        assert_eq!(layout.field_caps.paper_title, 40);
        assert_eq!(layout.field_caps.paper_venue, 60);
        assert_eq!(layout.sections.len(), 3);
    }

    #[test]
    fn test_duplicate_section_rejected() {
        let mut layout = TemplateLayout::default();
        layout.sections.push(SectionConfig::papers());
        assert!(matches!(layout.validate(), Err(Error::InvalidLayout(_))));
    }

    #[test]
    fn test_zero_template_pages_rejected() {
        let mut layout = TemplateLayout::default();
        layout.sections[1].template_pages = 0;
        assert!(layout.validate().is_err());
    }
}
