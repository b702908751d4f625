use anyhow::{Context, Result, anyhow};
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::file_utils::FileManager;

// @const: Main document part inside the package
pub const DOCUMENT_PART: &str = "word/document.xml";

/// A .docx package held in memory
pub struct DocxPackage {
    bytes: Vec<u8>,
}

impl DocxPackage {
    /// Read a package from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read document: {}", path.display()))?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    fn archive(&self) -> Result<ZipArchive<Cursor<&[u8]>>> {
        ZipArchive::new(Cursor::new(self.bytes.as_slice()))
            .context("Document is not a valid .docx package")
    }

    /// Contents of the main document part
    pub fn document_xml(&self) -> Result<String> {
        let mut archive = self.archive()?;
        let mut part = archive
            .by_name(DOCUMENT_PART)
            .map_err(|_| anyhow!("Package has no {} part", DOCUMENT_PART))?;

        let mut xml = String::new();
        part.read_to_string(&mut xml)
            .with_context(|| format!("Failed to read {}", DOCUMENT_PART))?;
        Ok(xml)
    }

    /// Repack with a new main document part, keeping entry order
    pub fn with_document_xml(&self, xml: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive()?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i)?;
            if entry.name() == DOCUMENT_PART {
                drop(entry);
                writer.start_file(DOCUMENT_PART, options)?;
                writer.write_all(xml.as_bytes())?;
            } else {
                writer.raw_copy_file(entry)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Write the repacked package to `path`
    pub fn save_with_document_xml<P: AsRef<Path>>(&self, path: P, xml: &str) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.with_document_xml(xml)?;
        if let Some(parent) = path.parent() {
            FileManager::ensure_dir(parent)?;
        }
        fs::write(path, bytes)
            .with_context(|| format!("Failed to write document: {}", path.display()))
    }
}
