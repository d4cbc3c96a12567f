//! A `.pptx` presentation held in memory, with the slide list, the
//! presentation relationships and the content types kept in step.

use crate::package::{rels_path, resolve_target, Package};
use crate::slide::{nth_table_mut, shape_text, PptxTable};
use crate::xml::{Element, Node, XmlDocument};
use deck_core::{Error, Result, SlideDeck, TableDeck};
use regex::Regex;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const ROOT_RELS_PART: &str = "_rels/.rels";
const DEFAULT_PRESENTATION_PART: &str = "ppt/presentation.xml";

const SLIDE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const SLIDE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

/// Slide ids below this are reserved by PowerPoint.
const MIN_SLIDE_ID: u32 = 256;

static SLIDE_PART_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"slides/slide(\d+)\.xml$").unwrap());

static REL_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^rId(\d+)$").unwrap());

/// Slide content as it was when the template was opened.
#[derive(Debug, Clone)]
struct SlidePart {
    xml: XmlDocument,
    rels: Option<XmlDocument>,
}

#[derive(Debug, Clone)]
struct SlideEntry {
    /// `p:sldId/@id`
    id: u32,
    /// Relationship id from the presentation part.
    rel_id: String,
    /// Part name, e.g. `ppt/slides/slide3.xml`.
    part: String,
    xml: XmlDocument,
    rels: Option<XmlDocument>,
}

/// An editable presentation.
#[derive(Debug, Clone)]
pub struct PptxDeck {
    package: Package,
    presentation_part: String,
    presentation: XmlDocument,
    presentation_rels: XmlDocument,
    content_types: XmlDocument,
    /// Qualified name of the relationship attribute on `p:sldId`.
    rel_attr: String,
    slides: Vec<SlideEntry>,
    pristine: Vec<SlidePart>,
}

fn is_notes_rel(rel: &Element) -> bool {
    rel.is("Relationship")
        && rel
            .attr("Type")
            .is_some_and(|t| t.ends_with("/relationships/notesSlide"))
}

fn prefix_of(name: &str) -> &str {
    name.split_once(':').map(|(p, _)| p).unwrap_or("")
}

fn qualified(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{}:{}", prefix, local)
    }
}

impl PptxDeck {
    /// Open a presentation from a file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Open a presentation from its ZIP bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let package = Package::from_bytes(bytes)?;
        Self::from_package(package)
    }

    fn from_package(package: Package) -> Result<Self> {
        let content_types = XmlDocument::parse_bytes(package.require(CONTENT_TYPES_PART)?)?;
        let presentation_part = Self::find_presentation_part(&package)?;
        let presentation = XmlDocument::parse_bytes(package.require(&presentation_part)?)?;
        let presentation_rels =
            XmlDocument::parse_bytes(package.require(&rels_path(&presentation_part))?)?;

        let mut rel_attr = "r:id".to_string();
        let mut slides = Vec::new();
        if let Some(list) = presentation.root.child("sldIdLst") {
            for sld_id in list.children_named("sldId") {
                let id = sld_id
                    .attr("id")
                    .and_then(|v| v.parse::<u32>().ok())
                    .ok_or_else(|| {
                        Error::PptxParseError("sldId without a numeric id".to_string())
                    })?;
                let (key, rel_id) = sld_id
                    .attributes
                    .iter()
                    .find(|(k, _)| k.ends_with(":id"))
                    .ok_or_else(|| {
                        Error::PptxParseError(format!("sldId {} has no relationship id", id))
                    })?;
                rel_attr = key.clone();

                let target = presentation_rels
                    .root
                    .children_named("Relationship")
                    .find(|r| r.attr("Id") == Some(rel_id.as_str()))
                    .and_then(|r| r.attr("Target"))
                    .ok_or_else(|| {
                        Error::PptxParseError(format!("Relationship '{}' not found", rel_id))
                    })?;
                let part = resolve_target(&presentation_part, target);

                let xml = XmlDocument::parse_bytes(package.require(&part)?)?;
                let rels = package
                    .get(&rels_path(&part))
                    .map(XmlDocument::parse_bytes)
                    .transpose()?;

                slides.push(SlideEntry {
                    id,
                    rel_id: rel_id.clone(),
                    part,
                    xml,
                    rels,
                });
            }
        }

        log::debug!(
            "Opened presentation '{}' with {} slide(s)",
            presentation_part,
            slides.len()
        );

        let pristine = slides
            .iter()
            .map(|s| SlidePart {
                xml: s.xml.clone(),
                rels: s.rels.clone(),
            })
            .collect();

        Ok(Self {
            package,
            presentation_part,
            presentation,
            presentation_rels,
            content_types,
            rel_attr,
            slides,
            pristine,
        })
    }

    fn find_presentation_part(package: &Package) -> Result<String> {
        let Some(bytes) = package.get(ROOT_RELS_PART) else {
            return Ok(DEFAULT_PRESENTATION_PART.to_string());
        };
        let rels = XmlDocument::parse_bytes(bytes)?;
        let target = rels
            .root
            .children_named("Relationship")
            .find(|r| {
                r.attr("Type")
                    .is_some_and(|t| t.ends_with("/relationships/officeDocument"))
            })
            .and_then(|r| r.attr("Target"));

        Ok(match target {
            Some(target) => resolve_target("", target),
            None => DEFAULT_PRESENTATION_PART.to_string(),
        })
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Part names of the slides, in presentation order.
    pub fn slide_parts(&self) -> Vec<&str> {
        self.slides.iter().map(|s| s.part.as_str()).collect()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.slides.len() {
            return Err(Error::SlideIndexOutOfRange {
                index,
                len: self.slides.len(),
            });
        }
        Ok(())
    }

    /// Root element (`p:sld`) of a slide.
    pub fn slide_root(&self, index: usize) -> Result<&Element> {
        self.check_index(index)?;
        Ok(&self.slides[index].xml.root)
    }

    pub fn slide_root_mut(&mut self, index: usize) -> Result<&mut Element> {
        self.check_index(index)?;
        Ok(&mut self.slides[index].xml.root)
    }

    /// Text of every text shape on a slide, in document order.
    pub fn shape_texts(&self, index: usize) -> Result<Vec<String>> {
        Ok(self
            .slide_root(index)?
            .descendants_named("sp")
            .into_iter()
            .filter(|sp| sp.child("txBody").is_some())
            .map(shape_text)
            .collect())
    }

    /// Copy slides `range` of `other` to the end of this deck.
    ///
    /// Both decks must come from the same template so the slides' layout
    /// and media relationships resolve in this package. Notes are not
    /// carried over.
    pub fn append_slides_from(&mut self, other: &PptxDeck, range: Range<usize>) -> Result<()> {
        if range.end > other.slides.len() {
            return Err(Error::SlideIndexOutOfRange {
                index: range.end,
                len: other.slides.len(),
            });
        }

        for entry in &other.slides[range] {
            let position = self.slides.len();
            self.add_slide(position, entry.xml.clone(), entry.rels.clone())?;
        }
        Ok(())
    }

    /// Insert a slide so it lands at `position`, registering its part.
    fn add_slide(
        &mut self,
        position: usize,
        xml: XmlDocument,
        mut rels: Option<XmlDocument>,
    ) -> Result<()> {
        if position > self.slides.len() {
            return Err(Error::SlideIndexOutOfRange {
                index: position,
                len: self.slides.len(),
            });
        }

        // A notes slide belongs to exactly one slide
        if let Some(rels) = rels.as_mut() {
            rels.root.remove_descendants(&is_notes_rel);
        }

        let number = self.next_slide_number();
        let dir = self
            .presentation_part
            .rsplit_once('/')
            .map(|(dir, _)| format!("{}/", dir))
            .unwrap_or_default();
        let part = format!("{}slides/slide{}.xml", dir, number);
        let rel_id = self.next_rel_id();
        let id = self.next_slide_id();

        self.presentation_rels.root.push(
            Element::new("Relationship")
                .with_attr("Id", rel_id.as_str())
                .with_attr("Type", SLIDE_REL_TYPE)
                .with_attr("Target", format!("slides/slide{}.xml", number)),
        );
        self.content_types.root.push(
            Element::new("Override")
                .with_attr("PartName", format!("/{}", part))
                .with_attr("ContentType", SLIDE_CONTENT_TYPE),
        );

        log::debug!("Adding {} as slide {} ({})", part, position, rel_id);
        self.slides.insert(
            position,
            SlideEntry {
                id,
                rel_id,
                part,
                xml,
                rels,
            },
        );
        self.rebuild_slide_list();
        Ok(())
    }

    fn next_slide_number(&self) -> u32 {
        self.package
            .names()
            .chain(self.slides.iter().map(|s| s.part.as_str()))
            .filter_map(|name| SLIDE_PART_REGEX.captures(name))
            .filter_map(|c| c[1].parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1
    }

    fn next_rel_id(&self) -> String {
        let max = self
            .presentation_rels
            .root
            .children_named("Relationship")
            .filter_map(|r| r.attr("Id"))
            .filter_map(|id| REL_ID_REGEX.captures(id))
            .filter_map(|c| c[1].parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("rId{}", max + 1)
    }

    fn next_slide_id(&self) -> u32 {
        self.slides
            .iter()
            .map(|s| s.id + 1)
            .max()
            .unwrap_or(MIN_SLIDE_ID)
            .max(MIN_SLIDE_ID)
    }

    /// Rewrite `p:sldIdLst` from the slide entries.
    fn rebuild_slide_list(&mut self) {
        let prefix = prefix_of(&self.presentation.root.name).to_string();
        let entries: Vec<Node> = self
            .slides
            .iter()
            .map(|s| {
                Node::Element(
                    Element::new(qualified(&prefix, "sldId"))
                        .with_attr("id", s.id.to_string())
                        .with_attr(self.rel_attr.as_str(), s.rel_id.as_str()),
                )
            })
            .collect();

        let root = &mut self.presentation.root;
        if root.child("sldIdLst").is_none() {
            // Goes right after the master id lists
            let position = root
                .children
                .iter()
                .rposition(|n| {
                    matches!(n, Node::Element(e) if e.local_name().ends_with("MasterIdLst"))
                })
                .map(|i| i + 1)
                .unwrap_or(0);
            root.children
                .insert(position, Node::Element(Element::new(qualified(&prefix, "sldIdLst"))));
        }
        if let Some(list) = root.child_mut("sldIdLst") {
            list.children = entries;
        }
    }

    fn remove_override(&mut self, part: &str) {
        let part_name = format!("/{}", part);
        self.content_types.root.remove_descendants(&|e: &Element| {
            e.is("Override") && e.attr("PartName") == Some(part_name.as_str())
        });
    }

    /// Remove the slide at `index` together with everything it owns.
    pub fn delete_slide(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        let entry = self.slides.remove(index);
        log::debug!("Deleting slide {} ({})", index, entry.part);

        let rel_id = entry.rel_id.as_str();
        self.presentation_rels.root.remove_descendants(&|e: &Element| {
            e.is("Relationship") && e.attr("Id") == Some(rel_id)
        });
        self.remove_override(&entry.part);
        self.package.remove(&entry.part);
        self.package.remove(&rels_path(&entry.part));

        let notes: Vec<String> = entry
            .rels
            .iter()
            .flat_map(|rels| rels.root.children_named("Relationship"))
            .filter(|r| is_notes_rel(r))
            .filter_map(|r| r.attr("Target"))
            .map(|target| resolve_target(&entry.part, target))
            .collect();
        for notes_part in notes {
            if self.notes_in_use(&notes_part) {
                continue;
            }
            log::debug!("Deleting notes {}", notes_part);
            self.package.remove(&notes_part);
            self.package.remove(&rels_path(&notes_part));
            self.remove_override(&notes_part);
        }

        self.rebuild_slide_list();
        Ok(())
    }

    fn notes_in_use(&self, notes_part: &str) -> bool {
        self.slides.iter().any(|s| {
            s.rels.iter().any(|rels| {
                rels.root
                    .children_named("Relationship")
                    .filter(|r| is_notes_rel(r))
                    .filter_map(|r| r.attr("Target"))
                    .any(|t| resolve_target(&s.part, t) == notes_part)
            })
        })
    }

    /// Insert a copy of pristine template slide `template_index` at
    /// `position`.
    pub fn clone_template_slide(&mut self, template_index: usize, position: usize) -> Result<()> {
        let source = self
            .pristine
            .get(template_index)
            .cloned()
            .ok_or(Error::SlideIndexOutOfRange {
                index: template_index,
                len: self.pristine.len(),
            })?;
        self.add_slide(position, source.xml, source.rels)
    }

    /// Serialize into a package without modifying `self`.
    fn build_package(&self) -> Result<Package> {
        let mut package = self.package.clone();
        package.insert(CONTENT_TYPES_PART, self.content_types.to_bytes()?);
        package.insert(self.presentation_part.as_str(), self.presentation.to_bytes()?);
        package.insert(
            rels_path(&self.presentation_part),
            self.presentation_rels.to_bytes()?,
        );
        for slide in &self.slides {
            package.insert(slide.part.as_str(), slide.xml.to_bytes()?);
            if let Some(rels) = &slide.rels {
                package.insert(rels_path(&slide.part), rels.to_bytes()?);
            }
        }
        Ok(package)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.build_package()?.to_bytes()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        log::info!("Saved {} slide(s) to {}", self.slides.len(), path.as_ref().display());
        Ok(())
    }
}

impl SlideDeck for PptxDeck {
    fn slide_count(&self) -> usize {
        PptxDeck::slide_count(self)
    }

    fn clone_template_slide(&mut self, template_index: usize, position: usize) -> Result<()> {
        PptxDeck::clone_template_slide(self, template_index, position)
    }

    fn delete_slide(&mut self, index: usize) -> Result<()> {
        PptxDeck::delete_slide(self, index)
    }
}

impl TableDeck for PptxDeck {
    type Table<'a> = PptxTable<'a>;

    fn table_mut(&mut self, slide: usize, table: usize) -> Result<Option<PptxTable<'_>>> {
        Ok(nth_table_mut(self.slide_root_mut(slide)?, table))
    }
}
