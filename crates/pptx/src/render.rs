//! Render subjects into copies of the template and merge them into one
//! deck.

use crate::deck::PptxDeck;
use crate::slide::{
    for_each_text_shape_mut, nth_table_mut, remove_text_shapes, replace_in_runs,
    set_body_text, set_first_shape_text, shape_text,
};
use crate::xml::Element;
use deck_core::{
    achievement_items, assemble, fill_table, grant_items, paper_items, Error, Result,
    Section, SectionPlan, SlideIndexMap, Subject, TableFiller, TemplateLayout, TemplateMarkers,
};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static COVER_COUNT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"（\d+人）").unwrap());

static BIRTH_DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})\D+(\d{1,2})").unwrap());

static BIRTH_YEAR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})$").unwrap());

const SCHOOL_HEADER: &str = "时间\t\t\t院校\t\t\t\t专业\t\t\t学位";

/// "1999-03-12" → "1999年3月", "1999" → "1999年"; anything else is kept.
pub fn format_birth_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(caps) = BIRTH_DATE_REGEX.captures(raw) {
        let month = match caps[2].trim_start_matches('0') {
            "" => &caps[2],
            month => month,
        };
        return format!("{}年{}月", &caps[1], month);
    }
    if BIRTH_YEAR_REGEX.is_match(raw) {
        return format!("{}年", raw);
    }
    raw.to_string()
}

/// Publication totals shown above each paper table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaperStats {
    pub total: usize,
    pub sci_zone_one: usize,
    pub ccf_a: usize,
}

impl PaperStats {
    pub fn from_subject(subject: &Subject) -> Self {
        let mut stats = Self::default();
        for group in &subject.papers {
            let count = group.titles.len();
            let category = group.category.as_deref().unwrap_or("");
            stats.total += count;
            if category.contains("SCI 1区") || category.contains("SCI1区") {
                stats.sci_zone_one += count;
            } else if category.contains("CCF A") {
                stats.ccf_a += count;
            }
        }
        stats
    }

    /// Statistics line for paper page `page` (0-based) of `pages`.
    pub fn line(&self, page: usize, pages: usize) -> String {
        format!(
            "发表论文情况：共发表论文 {} 篇 | SCI 1区 {} 篇 | CCF A类 {} 篇 (第{}/{}页，共{}篇)",
            self.total,
            self.sci_zone_one,
            self.ccf_a,
            page + 1,
            pages,
            self.total
        )
    }
}

/// Basic-info paragraphs: the summary line, a blank line, then the
/// education table when there is one.
pub fn basic_info_lines(subject: &Subject) -> Vec<String> {
    let mut lines = vec![
        format!(
            "{}，{}生，{}毕业生，{}，{}周岁",
            subject.sex(),
            format_birth_date(subject.birth_date()),
            subject.degree(),
            subject.marital_status(),
            subject.age()
        ),
        String::new(),
    ];

    if !subject.schools.is_empty() {
        lines.push(SCHOOL_HEADER.to_string());
        for school in &subject.schools {
            lines.push(format!(
                "{}\t\t{}\t\t{}\t\t{}",
                school.period.as_deref().unwrap_or(""),
                school.school.as_deref().unwrap_or(""),
                school.major.as_deref().unwrap_or(""),
                school.degree.as_deref().unwrap_or("")
            ));
        }
    }
    lines
}

/// Rewrite page headers and replace name placeholders on one slide.
fn personalize(root: &mut Element, markers: &TemplateMarkers, name: &str) {
    let header = format!("{}  {}：", name, markers.position_header);
    for_each_text_shape_mut(root, &mut |shape: &mut Element| {
        if shape_text(shape).contains(markers.position_header.as_str()) {
            if let Some(body) = shape.child_mut("txBody") {
                set_body_text(body, &[header.as_str()]);
            }
        } else {
            for placeholder in &markers.name_placeholders {
                replace_in_runs(shape, placeholder, name);
            }
        }
        true
    });
}

/// Fills a template once per subject and merges the results.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    template: Vec<u8>,
    layout: TemplateLayout,
    filler: TableFiller,
}

impl TemplateRenderer {
    /// Load the template file. A missing file fails here, before any
    /// subject is rendered.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let template = std::fs::read(path.as_ref())?;
        log::info!("Loaded template {}", path.as_ref().display());
        Ok(Self::from_bytes(template))
    }

    pub fn from_bytes(template: Vec<u8>) -> Self {
        let layout = TemplateLayout::default();
        Self {
            filler: Self::filler_for(&layout),
            template,
            layout,
        }
    }

    /// Use a layout other than the shipped template's.
    pub fn with_layout(mut self, layout: TemplateLayout) -> Self {
        self.filler = Self::filler_for(&layout);
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> &TemplateLayout {
        &self.layout
    }

    fn filler_for(layout: &TemplateLayout) -> TableFiller {
        TableFiller::new(layout.field_caps.clone())
            .with_awards_label(layout.markers.awards_label.as_str())
            .with_empty_state(layout.markers.empty_state.as_str())
    }

    /// Render every subject and merge them in input order.
    pub fn render_all(&self, subjects: &[Subject]) -> Result<PptxDeck> {
        let (first, rest) = subjects
            .split_first()
            .ok_or_else(|| Error::InvalidInput("no subjects to render".to_string()))?;
        self.layout.validate()?;

        log::info!("Rendering {} subject(s)", subjects.len());
        let mut output = self.render_subject(first)?;
        for subject in rest {
            let deck = self.render_subject(subject)?;
            output.append_slides_from(&deck, self.layout.subject_first_slide..deck.slide_count())?;
        }

        self.update_cover(&mut output, subjects.len())?;
        log::info!("Merged deck has {} slide(s)", output.slide_count());
        Ok(output)
    }

    /// Render one subject into a fresh copy of the template.
    pub fn render_subject(&self, subject: &Subject) -> Result<PptxDeck> {
        let name = subject.name();
        log::info!("Rendering subject '{}'", name);

        let papers = paper_items(&subject.papers);
        let grants = grant_items(&subject.grants);
        let achievements = achievement_items(&subject.awards, &subject.other_achievements);
        let items_for = |section: Section| match section {
            Section::Papers => papers.as_slice(),
            Section::Grants => grants.as_slice(),
            Section::Achievements => achievements.as_slice(),
        };

        let plans = self
            .layout
            .sections
            .iter()
            .map(|config| SectionPlan::new(config, items_for(config.section).len()))
            .collect::<Result<Vec<_>>>()?;
        for plan in &plans {
            log::info!(
                "{}: {} {} item(s) on {} page(s)",
                name,
                plan.item_count,
                plan.section,
                plan.page_count
            );
        }

        let mut deck = PptxDeck::from_bytes(&self.template)?;
        let map = assemble(&mut deck, &self.layout, &plans)?;

        let markers = &self.layout.markers;
        for index in self.layout.subject_first_slide..deck.slide_count() {
            personalize(deck.slide_root_mut(index)?, markers, name);
        }

        self.fill_basic_info(&mut deck, subject)?;
        for plan in &plans {
            self.filler
                .fill_section(&mut deck, &map, plan, items_for(plan.section))?;
        }
        self.decorate_sections(&mut deck, &map, subject)?;

        Ok(deck)
    }

    fn fill_basic_info(&self, deck: &mut PptxDeck, subject: &Subject) -> Result<()> {
        let markers = &self.layout.markers;
        let root = deck.slide_root_mut(self.layout.basic_info_slide)?;

        let lines = basic_info_lines(subject);
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        let sample_year = markers.sample_birth_year.as_str();
        let mut matched = false;
        let mut cleared = 0;
        for_each_text_shape_mut(root, &mut |shape: &mut Element| {
            let text = shape_text(shape);
            let stray = !sample_year.is_empty() && text.contains(sample_year);
            if !matched && markers.basic_info.iter().any(|m| text.contains(m.as_str())) {
                if let Some(body) = shape.child_mut("txBody") {
                    set_body_text(body, &lines);
                }
                matched = true;
            } else if stray {
                if let Some(body) = shape.child_mut("txBody") {
                    set_body_text(body, &[""]);
                }
                cleared += 1;
            }
            true
        });
        if !matched {
            log::warn!("No basic-info text box on slide {}", self.layout.basic_info_slide);
        }
        if cleared > 0 {
            log::debug!("Cleared {} sample text box(es) on the basic-info slide", cleared);
        }

        if let Some(mut table) = nth_table_mut(root, 0) {
            fill_table(&mut table, &[], 0);
        }
        Ok(())
    }

    /// Paper statistics on every paper page, notes only on the first
    /// achievements page.
    fn decorate_sections(
        &self,
        deck: &mut PptxDeck,
        map: &SlideIndexMap,
        subject: &Subject,
    ) -> Result<()> {
        let markers = &self.layout.markers;

        let stats = PaperStats::from_subject(subject);
        let pages = map.pages(Section::Papers);
        for page in 0..pages {
            let Some(slide) = map.slide_index(Section::Papers, page) else {
                continue;
            };
            let line = stats.line(page, pages);
            let matched = set_first_shape_text(
                deck.slide_root_mut(slide)?,
                &|text: &str| {
                    text.contains(markers.paper_statistics.as_str()) && !text.contains("共发表论文")
                },
                &[line.as_str()],
            );
            if !matched {
                log::warn!("No paper statistics box on slide {}", slide);
            }
        }

        for page in 1..map.pages(Section::Achievements) {
            let Some(slide) = map.slide_index(Section::Achievements, page) else {
                continue;
            };
            let removed = remove_text_shapes(deck.slide_root_mut(slide)?, &|text: &str| {
                markers.notes.iter().any(|n| text.contains(n.as_str()))
            });
            log::debug!("Removed {} note box(es) from slide {}", removed, slide);
        }

        Ok(())
    }

    /// Replace the "（N人）" count in the cover title.
    fn update_cover(&self, deck: &mut PptxDeck, count: usize) -> Result<()> {
        let title = self.layout.markers.cover_title.as_str();
        let replacement = format!("（{}人）", count);
        let mut updated = false;

        let root = deck.slide_root_mut(self.layout.cover_slide)?;
        for_each_text_shape_mut(root, &mut |shape: &mut Element| {
            if shape_text(shape).contains(title) {
                shape.for_each_text_mut(&mut |text: &mut String| {
                    if COVER_COUNT_REGEX.is_match(text) {
                        *text = COVER_COUNT_REGEX
                            .replace_all(text, replacement.as_str())
                            .into_owned();
                        updated = true;
                    }
                });
            }
            true
        });

        if !updated {
            log::warn!("Cover slide has no subject count to update");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture;
    use deck_core::{Award, GrantGroup, OtherAchievement, PaperGroup, School, TableDeck};

    fn renderer() -> TemplateRenderer {
        TemplateRenderer::from_bytes(fixture::template_bytes())
    }

    fn papers(count: usize, category: &str) -> PaperGroup {
        PaperGroup {
            venue: Some("《Nature》".to_string()),
            category: Some(category.to_string()),
            year: Some("2023".to_string()),
            titles: (1..=count).map(|i| format!("Paper {}", i)).collect(),
            count: None,
        }
    }

    fn subject(name: &str, paper_count: usize) -> Subject {
        Subject {
            name: Some(name.to_string()),
            sex: Some("女".to_string()),
            age: Some("31".to_string()),
            birth_date: Some("1993-05".to_string()),
            degree: Some("博士".to_string()),
            marital_status: Some("已婚".to_string()),
            schools: vec![School {
                period: Some("2015-2020".to_string()),
                school: Some("清华大学".to_string()),
                major: Some("计算机".to_string()),
                degree: Some("博士".to_string()),
            }],
            papers: if paper_count == 0 {
                Vec::new()
            } else {
                vec![papers(paper_count, "SCI 1区")]
            },
            ..Default::default()
        }
    }

    fn cell(deck: &mut PptxDeck, slide: usize, row: usize, col: usize) -> String {
        deck.table_mut(slide, 0)
            .unwrap()
            .unwrap()
            .cell_text(row, col)
            .unwrap_or_default()
    }

    fn texts(deck: &PptxDeck, slide: usize) -> Vec<String> {
        deck.shape_texts(slide).unwrap()
    }

    #[test]
    fn test_format_birth_date() {
        assert_eq!(format_birth_date("1993-05-12"), "1993年5月");
        assert_eq!(format_birth_date("1993.11"), "1993年11月");
        assert_eq!(format_birth_date("1993年05月"), "1993年5月");
        assert_eq!(format_birth_date("1993"), "1993年");
        assert_eq!(format_birth_date("未知"), "未知");
    }

    #[test]
    fn test_paper_stats() {
        let mut s = subject("张三", 3);
        s.papers.push(papers(2, "CCF A类"));
        s.papers.push(papers(1, "SCI1区 / CCF A"));
        s.papers.push(papers(4, "EI"));
        let stats = PaperStats::from_subject(&s);
        assert_eq!(
            stats,
            PaperStats {
                total: 10,
                sci_zone_one: 4,
                ccf_a: 2
            }
        );
        assert_eq!(
            stats.line(0, 2),
            "发表论文情况：共发表论文 10 篇 | SCI 1区 4 篇 | CCF A类 2 篇 (第1/2页，共10篇)"
        );
    }

    #[test]
    fn test_basic_info_lines() {
        let lines = basic_info_lines(&subject("张三", 0));
        assert_eq!(lines[0], "女，1993年5月生，博士毕业生，已婚，31周岁");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], SCHOOL_HEADER);
        assert_eq!(lines[3], "2015-2020\t\t清华大学\t\t计算机\t\t博士");

        let bare = basic_info_lines(&Subject::default());
        assert_eq!(bare, vec!["未知，未知生，未知毕业生，未知，未知周岁".to_string(), String::new()]);
    }

    #[test]
    fn test_twenty_five_papers_span_three_pages() {
        let mut deck = renderer().render_subject(&subject("张三", 25)).unwrap();
        // cover, summary, basic, 3 paper, grants, achievements, closing
        assert_eq!(deck.slide_count(), 9);

        assert_eq!(cell(&mut deck, 3, 1, 1), "Paper 1");
        assert_eq!(cell(&mut deck, 3, 8, 1), "Paper 8");
        assert_eq!(cell(&mut deck, 4, 1, 1), "Paper 9");
        assert_eq!(cell(&mut deck, 4, 11, 1), "Paper 19");
        assert_eq!(cell(&mut deck, 5, 1, 1), "Paper 20");
        assert_eq!(cell(&mut deck, 5, 6, 1), "Paper 25");
        assert_eq!(cell(&mut deck, 5, 7, 1), "");
        assert_eq!(cell(&mut deck, 5, 1, 0), "Nature");
        assert_eq!(cell(&mut deck, 5, 1, 2), "1");
        assert_eq!(cell(&mut deck, 5, 1, 4), "SCI 1区");

        for (slide, page) in [(3, 1), (4, 2), (5, 3)] {
            let expected = format!(
                "发表论文情况：共发表论文 25 篇 | SCI 1区 25 篇 | CCF A类 0 篇 (第{}/3页，共25篇)",
                page
            );
            assert!(texts(&deck, slide).contains(&expected));
            assert_eq!(texts(&deck, slide)[0], "张三  拟聘岗位：");
        }

        // Empty grants and achievements show the empty state
        assert_eq!(cell(&mut deck, 6, 1, 1), "暂无");
        assert_eq!(cell(&mut deck, 7, 1, 1), "暂无");
        assert_eq!(cell(&mut deck, 6, 2, 1), "");
        assert_eq!(texts(&deck, 8), vec!["张三同志综合评价意见".to_string()]);
    }

    #[test]
    fn test_no_papers_removes_paper_slides() {
        let mut deck = renderer().render_subject(&subject("李四", 0)).unwrap();
        assert_eq!(deck.slide_count(), 6);
        assert_eq!(texts(&deck, 3)[0], "李四  拟聘岗位：");
        assert_eq!(cell(&mut deck, 3, 1, 1), "暂无");
        assert_eq!(cell(&mut deck, 3, 1, 0), "");
    }

    #[test]
    fn test_basic_info_slide() {
        let mut deck = renderer().render_subject(&subject("张三", 1)).unwrap();
        let texts = texts(&deck, 2);
        assert_eq!(texts[0], "张三  拟聘岗位：");
        assert!(texts[1].starts_with("女，1993年5月生，博士毕业生，已婚，31周岁\n\n时间"));
        assert!(texts[1].ends_with("2015-2020\t\t清华大学\t\t计算机\t\t博士"));
        assert_eq!(cell(&mut deck, 2, 1, 0), "");
        assert_eq!(cell(&mut deck, 2, 3, 3), "");
        assert_eq!(cell(&mut deck, 2, 0, 0), "列1");
    }

    #[test]
    fn test_basic_info_clears_other_sample_boxes() {
        let mut template = PptxDeck::from_bytes(&fixture::template_bytes()).unwrap();
        let tree = template
            .slide_root_mut(2)
            .unwrap()
            .nth_descendant_mut("spTree", 0)
            .unwrap();
        let run = Element::new("a:r").with_child(Element::new("a:t").with_text("1999年9月入学"));
        tree.push(
            Element::new("p:sp").with_child(
                Element::new("p:txBody")
                    .with_child(Element::new("a:bodyPr"))
                    .with_child(Element::new("a:p").with_child(run)),
            ),
        );
        let renderer = TemplateRenderer::from_bytes(template.to_bytes().unwrap());

        let deck = renderer.render_subject(&subject("张三", 1)).unwrap();
        let texts = texts(&deck, 2);
        assert_eq!(texts.len(), 3);
        assert!(texts[1].starts_with("女，1993年5月生"));
        assert_eq!(texts[2], "");
    }

    #[test]
    fn test_grants_and_achievements() {
        let mut s = subject("王五", 1);
        s.grants = vec![GrantGroup {
            category: Some("国家自然科学基金".to_string()),
            names: vec!["项目甲".to_string(), "项目乙".to_string()],
            count: Some("2".to_string()),
            year: Some("2021".to_string()),
            remarks: Some("主持".to_string()),
        }];
        s.awards = (1..=9)
            .map(|i| Award {
                name: Some(format!("奖项{}", i)),
                year: Some("2022".to_string()),
                kind: None,
            })
            .collect();
        s.other_achievements = vec![OtherAchievement {
            category: Some("专利".to_string()),
            names: vec!["专利甲".to_string()],
            count: Some("1".to_string()),
            year: Some("2020".to_string()),
            remarks: None,
        }];

        let mut deck = renderer().render_subject(&s).unwrap();
        // cover, summary, basic, 1 paper, grants, 2 achievements, closing
        assert_eq!(deck.slide_count(), 8);

        assert_eq!(cell(&mut deck, 4, 1, 0), "国家自然科学基金");
        assert_eq!(cell(&mut deck, 4, 1, 1), "项目甲、项目乙");
        assert_eq!(cell(&mut deck, 4, 1, 4), "主持");

        assert_eq!(cell(&mut deck, 5, 1, 0), "获奖情况");
        assert_eq!(cell(&mut deck, 5, 1, 2), "7项");
        assert_eq!(cell(&mut deck, 5, 2, 0), "");
        assert_eq!(cell(&mut deck, 5, 2, 2), "1项");
        assert_eq!(cell(&mut deck, 6, 1, 0), "获奖情况");
        assert_eq!(cell(&mut deck, 6, 1, 1), "奖项8");
        assert_eq!(cell(&mut deck, 6, 1, 2), "2项");
        assert_eq!(cell(&mut deck, 6, 2, 0), "");
        assert_eq!(cell(&mut deck, 6, 2, 2), "1项");
        assert_eq!(cell(&mut deck, 6, 3, 0), "专利");
        assert_eq!(cell(&mut deck, 6, 3, 3), "2020");

        assert!(texts(&deck, 5).iter().any(|t| t.starts_with("备注：")));
        assert!(!texts(&deck, 6).iter().any(|t| t.starts_with("备注：")));
    }

    #[test]
    fn test_render_all_merges_subject_slides() {
        let renderer = renderer();
        let subjects = vec![subject("张三", 25), subject("李四", 0)];
        let deck = renderer.render_all(&subjects).unwrap();

        // 9 slides for the first subject, 6 - 2 shared for the second
        assert_eq!(deck.slide_count(), 13);
        assert_eq!(texts(&deck, 0), vec!["2024年人才引进简历汇总（2人）".to_string()]);
        assert_eq!(texts(&deck, 9)[0], "李四  拟聘岗位：");
        assert_eq!(texts(&deck, 12), vec!["李四同志综合评价意见".to_string()]);

        let reopened = PptxDeck::from_bytes(&deck.to_bytes().unwrap()).unwrap();
        assert_eq!(reopened.slide_count(), 13);
        assert_eq!(texts(&reopened, 8), vec!["张三同志综合评价意见".to_string()]);
    }

    #[test]
    fn test_render_all_rejects_empty_input() {
        assert!(matches!(renderer().render_all(&[]), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_template_mismatch() {
        let mut layout = TemplateLayout::default();
        layout.trailing_slides = 2;
        let renderer = renderer().with_layout(layout);
        assert!(matches!(
            renderer.render_subject(&subject("张三", 1)),
            Err(Error::TemplateMismatch(_))
        ));
    }

    #[test]
    fn test_open_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            TemplateRenderer::open(dir.path().join("template.pptx")),
            Err(Error::IoError(_))
        ));

        let path = dir.path().join("template.pptx");
        std::fs::write(&path, fixture::template_bytes()).unwrap();
        let renderer = TemplateRenderer::open(&path).unwrap();
        assert_eq!(renderer.render_all(&[subject("张三", 1)]).unwrap().slide_count(), 7);
    }
}
