//! Text and table editing on a slide's shape tree.

use crate::xml::{Element, Node};
use deck_core::TableSink;

/// Text of a `txBody`-bearing element: paragraphs joined with newlines.
pub fn body_text(body: &Element) -> String {
    body.children_named("p")
        .map(|p| {
            p.children_named("r")
                .chain(p.children_named("fld"))
                .flat_map(|r| r.children_named("t"))
                .map(|t| t.text())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of a shape, or an empty string for shapes without a text body.
pub fn shape_text(shape: &Element) -> String {
    shape.child("txBody").map(body_text).unwrap_or_default()
}

/// Replace a text body's paragraphs, one per entry of `paragraphs`.
///
/// The first paragraph's properties and the first run's character
/// properties are reused for every new paragraph, so the text keeps the
/// template's font and alignment even after a cell has been cleared.
pub fn set_body_text(body: &mut Element, paragraphs: &[&str]) {
    let first_p = body.child("p");
    let p_pr = first_p.and_then(|p| p.child("pPr")).cloned();
    let end_pr = first_p.and_then(|p| p.child("endParaRPr")).cloned();
    let r_pr = body
        .children_named("p")
        .flat_map(|p| p.children_named("r"))
        .find_map(|r| r.child("rPr"))
        .cloned();

    body.children
        .retain(|n| !matches!(n, Node::Element(e) if e.is("p")));

    let lines: &[&str] = if paragraphs.is_empty() { &[""] } else { paragraphs };
    for line in lines {
        let mut p = Element::new("a:p");
        if let Some(p_pr) = &p_pr {
            p.push(p_pr.clone());
        }
        // An empty run still carries the character properties
        if !line.is_empty() || r_pr.is_some() {
            let mut r = Element::new("a:r");
            if let Some(r_pr) = &r_pr {
                r.push(r_pr.clone());
            }
            let t = Element::new("a:t");
            r.push(if line.is_empty() { t } else { t.with_text(*line) });
            p.push(r);
        }
        if let Some(end_pr) = &end_pr {
            p.push(end_pr.clone());
        }
        body.push(p);
    }
}

/// Replace every occurrence of `from` inside individual text runs.
/// Returns whether anything changed.
pub fn replace_in_runs(element: &mut Element, from: &str, to: &str) -> bool {
    if from.is_empty() {
        return false;
    }
    let mut changed = false;
    for_each_element_mut(element, &mut |e: &mut Element| {
        if e.is("t") {
            e.for_each_text_mut(&mut |text: &mut String| {
                if text.contains(from) {
                    *text = text.replace(from, to);
                    changed = true;
                }
            });
        }
    });
    changed
}

fn for_each_element_mut(element: &mut Element, f: &mut dyn FnMut(&mut Element)) {
    for child in element.elements_mut() {
        f(child);
        for_each_element_mut(child, f);
    }
}

/// Apply `f` to every text shape (`p:sp` with a text body), including
/// shapes nested in groups. Visiting stops early when `f` returns `false`.
pub fn for_each_text_shape_mut(root: &mut Element, f: &mut dyn FnMut(&mut Element) -> bool) {
    fn walk(element: &mut Element, f: &mut dyn FnMut(&mut Element) -> bool) -> bool {
        for child in element.elements_mut() {
            if child.is("sp") && child.child("txBody").is_some() {
                if !f(child) {
                    return false;
                }
            } else if !walk(child, f) {
                return false;
            }
        }
        true
    }
    walk(root, f);
}

/// Set the text of the first shape whose text satisfies `pred`.
/// Returns whether a shape matched.
pub fn set_first_shape_text(
    root: &mut Element,
    pred: &dyn Fn(&str) -> bool,
    paragraphs: &[&str],
) -> bool {
    let mut matched = false;
    for_each_text_shape_mut(root, &mut |shape: &mut Element| {
        if pred(&shape_text(shape)) {
            if let Some(body) = shape.child_mut("txBody") {
                set_body_text(body, paragraphs);
            }
            matched = true;
            return false;
        }
        true
    });
    matched
}

/// Remove every text shape whose text satisfies `pred`.
pub fn remove_text_shapes(root: &mut Element, pred: &dyn Fn(&str) -> bool) -> usize {
    root.remove_descendants(&|e: &Element| {
        e.is("sp") && e.child("txBody").is_some() && pred(&shape_text(e))
    })
}

/// A DrawingML table (`a:tbl`) viewed as header + data rows.
pub struct PptxTable<'a> {
    tbl: &'a mut Element,
}

impl<'a> PptxTable<'a> {
    pub fn new(tbl: &'a mut Element) -> Self {
        Self { tbl }
    }

    /// Text of one cell, if it exists.
    pub fn cell_text(&self, row: usize, col: usize) -> Option<String> {
        self.tbl
            .children_named("tr")
            .nth(row)?
            .children_named("tc")
            .nth(col)
            .map(|tc| tc.child("txBody").map(body_text).unwrap_or_default())
    }
}

/// The `n`-th table on a slide, in document order.
pub fn nth_table_mut(root: &mut Element, n: usize) -> Option<PptxTable<'_>> {
    root.nth_descendant_mut("tbl", n).map(PptxTable::new)
}

impl TableSink for PptxTable<'_> {
    fn row_count(&self) -> usize {
        self.tbl.children_named("tr").count()
    }

    fn column_count(&self, row: usize) -> usize {
        self.tbl
            .children_named("tr")
            .nth(row)
            .map(|tr| tr.children_named("tc").count())
            .unwrap_or(0)
    }

    fn set_cell(&mut self, row: usize, col: usize, text: &str) {
        let Some(tc) = self
            .tbl
            .children_named_mut("tr")
            .nth(row)
            .and_then(|tr| tr.children_named_mut("tc").nth(col))
        else {
            return;
        };

        if tc.child("txBody").is_none() {
            let body = Element::new("a:txBody")
                .with_child(Element::new("a:bodyPr"))
                .with_child(Element::new("a:lstStyle"))
                .with_child(Element::new("a:p"));
            // txBody must precede the cell properties
            tc.children.insert(0, Node::Element(body));
        }
        if let Some(body) = tc.child_mut("txBody") {
            set_body_text(body, &[text]);
        }
    }
}
