use crate::error::ExtractionError;
use sha2::{Digest, Sha256};
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

/// Where PDF bytes come from: a file on disk or an upload buffer.
#[derive(Debug, Clone)]
pub enum PdfSource {
    Path(PathBuf),
    Bytes { name: String, bytes: Vec<u8> },
}

impl PdfSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        PdfSource::Path(path.into())
    }

    pub fn bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        PdfSource::Bytes { name: name.into(), bytes }
    }

    /// Display label, used as the grounding document's source.
    pub fn name(&self) -> String {
        match self {
            PdfSource::Path(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
            PdfSource::Bytes { name, .. } => name.clone(),
        }
    }

    /// Stable identity: the path as given, or the content fingerprint of an
    /// upload buffer.
    pub fn identity(&self) -> String {
        match self {
            PdfSource::Path(path) => path.display().to_string(),
            PdfSource::Bytes { bytes, .. } => fingerprint(bytes),
        }
    }

    pub fn load(&self) -> Result<Vec<u8>, ExtractionError> {
        match self {
            PdfSource::Path(path) => fs::read(path).map_err(|source| ExtractionError::Io {
                path: path.clone(),
                source,
            }),
            PdfSource::Bytes { bytes, .. } => Ok(bytes.clone()),
        }
    }
}

/// Hex SHA-256 of the raw bytes; the identity used for caching.
pub fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Converts PDF bytes into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;

    fn extract_source(&self, source: &PdfSource) -> Result<String, ExtractionError> {
        let bytes = source.load()?;
        log::info!("Extracting text from PDF: {} ({})", source.name(), source.identity());
        self.extract(&bytes)
    }
}

/// `pdf-extract` backed extractor. Pages are read in physical order and
/// joined with no separator, so page boundaries are not marked.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        // pdf-extract panics on some damaged documents instead of erroring.
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        }));

        match result {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(ExtractionError::Malformed(e.to_string())),
            Err(_) => Err(ExtractionError::Malformed(
                "PDF structure could not be decoded".to_string(),
            )),
        }
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let pages = self.extract_pages(bytes)?;
        let text: String = pages.concat();
        log::debug!("Extracted {} chars from {} pages", text.len(), pages.len());
        Ok(text)
    }
}
