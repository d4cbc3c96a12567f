//! In-memory OPC package (the ZIP container behind a .pptx).

use deck_core::{Error, Result};
use std::io::{Cursor, Read, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Every part of a package, in archive order.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    /// Read every file entry of a ZIP archive.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;
            parts.push((name, data));
        }

        Ok(Self { parts })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Fetch a part that must exist.
    pub fn require(&self, name: &str) -> Result<&[u8]> {
        self.get(name)
            .ok_or_else(|| Error::PptxParseError(format!("Missing part '{}'", name)))
    }

    /// Replace a part's content, or append it as a new part.
    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        match self.parts.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = data,
            None => self.parts.push((name, data)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        let pos = self.parts.iter().position(|(n, _)| n == name)?;
        Some(self.parts.remove(pos).1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, data) in &self.parts {
            zip.start_file(name.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to start '{}': {}", name, e)))?;
            zip.write_all(data)
                .map_err(|e| Error::ZipError(format!("Failed to write '{}': {}", name, e)))?;
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }
}

/// Relationship part path for a part, e.g. `ppt/slides/slide1.xml` →
/// `ppt/slides/_rels/slide1.xml.rels`.
pub fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of its source part.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
