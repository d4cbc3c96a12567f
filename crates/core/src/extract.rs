//! Record extraction: grouped input records to flat, ordered table items.
//!
//! Paper groups are flattened title by title. Grants, awards, and other
//! achievements render one row per record, so they collapse instead.
//! Every extractor keeps input order and numbers its output from 1.

use crate::types::{
    Award, FlatItem, GrantGroup, GroupedRecord, ItemKind, OtherAchievement, PaperGroup, BLANK,
};
use regex::Regex;
use std::sync::LazyLock;

/// Separators accepted between year tokens ("2019, 2020", "2019、2021", ...).
static YEAR_SEPARATOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,，、;；]").unwrap());

/// Join character for multi-name cells.
const NAME_JOINER: &str = "、";

impl From<&PaperGroup> for GroupedRecord {
    fn from(group: &PaperGroup) -> Self {
        Self {
            titles: group.titles.clone(),
            venue: group
                .venue
                .as_deref()
                .map(|v| v.replace(['《', '》'], "")),
            category: group.category.clone(),
            year: group.year.clone(),
            count: group.count.clone(),
            remarks: None,
        }
    }
}

impl From<&GrantGroup> for GroupedRecord {
    fn from(group: &GrantGroup) -> Self {
        Self {
            titles: group.names.clone(),
            venue: None,
            category: group.category.clone(),
            year: group.year.clone(),
            count: group.count.clone(),
            remarks: group.remarks.clone(),
        }
    }
}

impl From<&OtherAchievement> for GroupedRecord {
    fn from(item: &OtherAchievement) -> Self {
        Self {
            titles: item.names.clone(),
            venue: None,
            category: item.category.clone(),
            year: item.year.clone(),
            count: item.count.clone(),
            remarks: item.remarks.clone(),
        }
    }
}

/// Flatten grouped records into one item per sub-title.
///
/// Year assignment is a best-effort heuristic: when the group's year text
/// splits into exactly as many tokens as the group has titles, token *i*
/// goes to title *i*. Any other token count (including a partial match)
/// gives every title the first token, or [`BLANK`] when there is none.
pub fn extract(groups: &[GroupedRecord]) -> Vec<FlatItem> {
    extract_as(groups, ItemKind::Paper)
}

fn extract_as(groups: &[GroupedRecord], kind: ItemKind) -> Vec<FlatItem> {
    let mut items = Vec::with_capacity(groups.iter().map(|g| g.titles.len()).sum());

    for group in groups {
        let years = year_tokens(group.year.as_deref());
        let positional = years.len() == group.titles.len();
        let venue = text_or_blank(group.venue.as_deref());
        let category = text_or_blank(group.category.as_deref());

        for (i, title) in group.titles.iter().enumerate() {
            let year = if positional {
                years[i].clone()
            } else {
                years.first().cloned().unwrap_or_else(|| BLANK.to_string())
            };

            items.push(FlatItem {
                index: items.len() + 1,
                kind,
                title: title.clone(),
                venue: venue.clone(),
                category: category.clone(),
                year,
                count: "1".to_string(),
                remarks: String::new(),
            });
        }
    }

    items
}

/// Flatten publication groups into one item per paper.
pub fn paper_items(groups: &[PaperGroup]) -> Vec<FlatItem> {
    let records: Vec<GroupedRecord> = groups.iter().map(GroupedRecord::from).collect();
    extract(&records)
}

/// One item per grant group, its project names joined into one cell.
pub fn grant_items(groups: &[GrantGroup]) -> Vec<FlatItem> {
    let records: Vec<GroupedRecord> = groups.iter().map(GroupedRecord::from).collect();
    collapse(&records, ItemKind::Grant)
}

/// The merged achievements stream: every award first, in input order,
/// followed by every other achievement, in input order.
pub fn achievement_items(awards: &[Award], others: &[OtherAchievement]) -> Vec<FlatItem> {
    let mut items: Vec<FlatItem> = awards
        .iter()
        .enumerate()
        .map(|(i, award)| FlatItem {
            index: i + 1,
            kind: ItemKind::Award,
            title: award.name.clone().unwrap_or_default(),
            venue: BLANK.to_string(),
            category: text_or_blank(award.kind.as_deref()),
            year: award.year.clone().unwrap_or_default(),
            count: "1".to_string(),
            remarks: String::new(),
        })
        .collect();

    let records: Vec<GroupedRecord> = others.iter().map(GroupedRecord::from).collect();
    let offset = items.len();
    items.extend(collapse(&records, ItemKind::Other).into_iter().map(|mut item| {
        item.index += offset;
        item
    }));

    items
}

fn collapse(records: &[GroupedRecord], kind: ItemKind) -> Vec<FlatItem> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| FlatItem {
            index: i + 1,
            kind,
            title: record.titles.join(NAME_JOINER),
            venue: text_or_blank(record.venue.as_deref()),
            // Grant and other-achievement category cells stay empty rather
            // than showing the placeholder.
            category: record.category.clone().unwrap_or_default(),
            year: record.year.clone().unwrap_or_default(),
            count: record.count.clone().unwrap_or_default(),
            remarks: record.remarks.clone().unwrap_or_default(),
        })
        .collect()
}

fn year_tokens(year: Option<&str>) -> Vec<String> {
    year.map(|y| {
        YEAR_SEPARATOR_REGEX
            .split(y)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn text_or_blank(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => BLANK.to_string(),
    }
}
