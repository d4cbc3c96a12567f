//! Synthetic eight-slide template used by the backend's tests.

use crate::package::Package;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const DOC_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

fn shape(text: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="TextBox"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="zh-CN" sz="1800"/><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        text
    )
}

/// A table with a header row and `rows` data rows of `cols` cells.
fn table(rows: usize, cols: usize) -> String {
    let cell = |text: &str| {
        format!(
            r#"<a:tc><a:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr sz="1000"/><a:t>{}</a:t></a:r></a:p></a:txBody><a:tcPr/></a:tc>"#,
            text
        )
    };
    let mut xml = String::from(r#"<p:graphicFrame><a:graphic><a:graphicData><a:tbl><a:tblGrid/>"#);
    xml.push_str(r#"<a:tr h="300">"#);
    for col in 0..cols {
        xml.push_str(&cell(&format!("列{}", col + 1)));
    }
    xml.push_str("</a:tr>");
    for row in 0..rows {
        xml.push_str(r#"<a:tr h="300">"#);
        for col in 0..cols {
            xml.push_str(&cell(&format!("样例{}-{}", row + 1, col + 1)));
        }
        xml.push_str("</a:tr>");
    }
    xml.push_str("</a:tbl></a:graphicData></a:graphic></p:graphicFrame>");
    xml
}

fn slide(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
        NS, body
    )
}

/// Slide bodies in template order.
pub fn slide_bodies() -> Vec<String> {
    let header = shape("苑津山  拟聘岗位：教授");
    vec![
        shape("2024年人才引进简历汇总（3人）"),
        shape("人员名单"),
        format!(
            "{}{}{}",
            header,
            shape("男，1999年1月生，博士毕业生，未婚，25周岁"),
            table(3, 4)
        ),
        format!("{}{}{}", header, shape("发表论文情况："), table(8, 5)),
        format!("{}{}{}", header, shape("发表论文情况："), table(11, 5)),
        format!("{}{}", header, table(10, 5)),
        format!(
            "{}{}{}",
            header,
            table(7, 4),
            shape("备注：仅统计近五年成果")
        ),
        shape("苑津山同志综合评价意见"),
    ]
}

/// The template as `.pptx` bytes. Slide 5 (papers, second page) owns a
/// notes slide.
pub fn template_bytes() -> Vec<u8> {
    let bodies = slide_bodies();
    let mut package = Package::default();

    let mut types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#,
    );
    for n in 1..=bodies.len() {
        types.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            n
        ));
    }
    types.push_str(r#"<Override PartName="/ppt/notesSlides/notesSlide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml"/></Types>"#);
    package.insert("[Content_Types].xml", types.into_bytes());

    package.insert(
        "_rels/.rels",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#,
            REL_NS, DOC_REL
        )
        .into_bytes(),
    );

    let mut ids = String::new();
    let mut rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
        REL_NS, DOC_REL
    );
    for n in 1..=bodies.len() {
        ids.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + n, n + 1));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}/slide" Target="slides/slide{}.xml"/>"#,
            n + 1,
            DOC_REL,
            n
        ));
    }
    rels.push_str("</Relationships>");
    package.insert(
        "ppt/presentation.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#,
            NS, ids
        )
        .into_bytes(),
    );
    package.insert("ppt/_rels/presentation.xml.rels", rels.into_bytes());

    for (i, body) in bodies.iter().enumerate() {
        let n = i + 1;
        package.insert(format!("ppt/slides/slide{}.xml", n), slide(body).into_bytes());

        let mut slide_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
            REL_NS, DOC_REL
        );
        if n == 5 {
            slide_rels.push_str(&format!(
                r#"<Relationship Id="rId2" Type="{}/notesSlide" Target="../notesSlides/notesSlide1.xml"/>"#,
                DOC_REL
            ));
        }
        slide_rels.push_str("</Relationships>");
        package.insert(
            format!("ppt/slides/_rels/slide{}.xml.rels", n),
            slide_rels.into_bytes(),
        );
    }

    package.insert(
        "ppt/notesSlides/notesSlide1.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notes {}><p:cSld><p:spTree/></p:cSld></p:notes>"#,
            NS
        )
        .into_bytes(),
    );
    package.insert(
        "ppt/notesSlides/_rels/notesSlide1.xml.rels",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/slide" Target="../slides/slide5.xml"/></Relationships>"#,
            REL_NS, DOC_REL
        )
        .into_bytes(),
    );

    package.to_bytes().unwrap()
}
