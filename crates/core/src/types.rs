//! Domain types for subject records and the display items derived from them.

use crate::error::{Error, Result};
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder shown for a missing scalar field on a subject.
pub const UNKNOWN: &str = "未知";

/// Placeholder shown in a table cell whose value is absent.
pub const BLANK: &str = "-";

/// One person's résumé, as produced by the upstream parsing pipeline.
///
/// Every field is optional on the wire. Missing keys, nulls, and values of
/// the wrong shape fall back to a typed default instead of failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Subject {
    #[serde(rename = "姓名", deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(rename = "性别", deserialize_with = "lenient_string")]
    pub sex: Option<String>,

    #[serde(rename = "年龄", deserialize_with = "lenient_string")]
    pub age: Option<String>,

    #[serde(rename = "出生日期", deserialize_with = "lenient_string")]
    pub birth_date: Option<String>,

    #[serde(rename = "最高学历", deserialize_with = "lenient_string")]
    pub degree: Option<String>,

    #[serde(rename = "婚配情况", deserialize_with = "lenient_string")]
    pub marital_status: Option<String>,

    #[serde(rename = "就读院校", deserialize_with = "lenient_list")]
    pub schools: Vec<School>,

    #[serde(rename = "发表论文情况", deserialize_with = "lenient_list")]
    pub papers: Vec<PaperGroup>,

    #[serde(rename = "获批项目情况", deserialize_with = "lenient_list")]
    pub grants: Vec<GrantGroup>,

    #[serde(rename = "获奖情况", deserialize_with = "lenient_list")]
    pub awards: Vec<Award>,

    #[serde(rename = "其他成果", deserialize_with = "lenient_list")]
    pub other_achievements: Vec<OtherAchievement>,
}

impl Subject {
    /// Parse a JSON array of subjects. A single object is accepted as a
    /// one-element list.
    pub fn list_from_json(json: &str) -> Result<Vec<Subject>> {
        let value: Value = serde_json::from_str(json)?;
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).map_err(Error::from))
                .collect(),
            Value::Object(_) => Ok(vec![serde_json::from_value(value)?]),
            other => Err(Error::InvalidInput(format!(
                "expected a list of subject records, found {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn name(&self) -> &str {
        or_unknown(&self.name)
    }

    pub fn sex(&self) -> &str {
        or_unknown(&self.sex)
    }

    pub fn age(&self) -> &str {
        or_unknown(&self.age)
    }

    pub fn birth_date(&self) -> &str {
        or_unknown(&self.birth_date)
    }

    pub fn degree(&self) -> &str {
        or_unknown(&self.degree)
    }

    pub fn marital_status(&self) -> &str {
        or_unknown(&self.marital_status)
    }

    /// Total number of paper titles across all publication groups.
    pub fn paper_count(&self) -> usize {
        self.papers.iter().map(|g| g.titles.len()).sum()
    }
}

/// One education entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct School {
    #[serde(rename = "时间区间", deserialize_with = "lenient_string")]
    pub period: Option<String>,

    #[serde(rename = "院校", deserialize_with = "lenient_string")]
    pub school: Option<String>,

    #[serde(rename = "专业", deserialize_with = "lenient_string")]
    pub major: Option<String>,

    #[serde(rename = "学位", deserialize_with = "lenient_string")]
    pub degree: Option<String>,
}

/// A batch of papers sharing one venue and category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperGroup {
    #[serde(rename = "期刊名称", deserialize_with = "lenient_string")]
    pub venue: Option<String>,

    #[serde(rename = "类别", deserialize_with = "lenient_string")]
    pub category: Option<String>,

    #[serde(rename = "年份", deserialize_with = "lenient_string")]
    pub year: Option<String>,

    #[serde(rename = "论文题目列表", deserialize_with = "lenient_strings")]
    pub titles: Vec<String>,

    #[serde(rename = "篇数", deserialize_with = "lenient_string")]
    pub count: Option<String>,
}

/// A batch of approved grants of one category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrantGroup {
    #[serde(rename = "项目类别", deserialize_with = "lenient_string")]
    pub category: Option<String>,

    #[serde(rename = "项目名称列表", deserialize_with = "lenient_strings")]
    pub names: Vec<String>,

    #[serde(rename = "项数", deserialize_with = "lenient_string")]
    pub count: Option<String>,

    #[serde(rename = "年份", deserialize_with = "lenient_string")]
    pub year: Option<String>,

    #[serde(rename = "备注", deserialize_with = "lenient_string")]
    pub remarks: Option<String>,
}

/// A single award.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Award {
    #[serde(rename = "奖项名称", deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(rename = "年份", deserialize_with = "lenient_string")]
    pub year: Option<String>,

    #[serde(rename = "类型", deserialize_with = "lenient_string")]
    pub kind: Option<String>,
}

/// An achievement that is neither a paper, a grant, nor an award
/// (patents, software copyrights, standards, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherAchievement {
    #[serde(rename = "类别", deserialize_with = "lenient_string")]
    pub category: Option<String>,

    #[serde(rename = "名称列表", deserialize_with = "lenient_strings")]
    pub names: Vec<String>,

    #[serde(rename = "项数", deserialize_with = "lenient_string")]
    pub count: Option<String>,

    #[serde(rename = "年份", deserialize_with = "lenient_string")]
    pub year: Option<String>,

    #[serde(rename = "备注", deserialize_with = "lenient_string")]
    pub remarks: Option<String>,
}

/// One input entry describing a batch of items with shared metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedRecord {
    /// Sub-titles or names, in display order.
    pub titles: Vec<String>,
    pub venue: Option<String>,
    pub category: Option<String>,
    /// Raw year text; may hold several separated tokens.
    pub year: Option<String>,
    pub count: Option<String>,
    pub remarks: Option<String>,
}

/// The kind of row a [`FlatItem`] renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Paper,
    Grant,
    Award,
    Other,
}

/// One atomic table row derived from a grouped record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatItem {
    /// 1-based position in the extracted sequence.
    pub index: usize,
    pub kind: ItemKind,
    pub title: String,
    pub venue: String,
    pub category: String,
    pub year: String,
    pub count: String,
    pub remarks: String,
}

fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(UNKNOWN)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Render a JSON scalar as display text. Blank strings and nulls are `None`.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
            (!parts.is_empty()).then(|| parts.join(","))
        }
        Value::Null | Value::Object(_) => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value))
}

fn lenient_strings<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        other => scalar_text(&other).into_iter().collect(),
    })
}

fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        if !value.is_null() {
            log::warn!("Expected a list, found {}; using an empty list", json_kind(&value));
        }
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::warn!("Skipping malformed list entry: {}", e);
                None
            }
        })
        .collect())
}
