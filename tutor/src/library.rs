use crate::document_processor::PdfSource;
use crate::error::LibraryError;
use crate::models::ResponseLanguage;
use std::path::{Path, PathBuf};

pub const CHAPTER_COUNT: u32 = 13;

/// Preselected textbook chapters, one PDF per chapter and language:
/// `<root>/NCERT_class_12_eng/<n>.pdf` and `<root>/NCERT_class_12_hin/<n>.pdf`.
#[derive(Debug, Clone)]
pub struct ChapterLibrary {
    root: PathBuf,
}

impl ChapterLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn language_dir(language: ResponseLanguage) -> &'static str {
        match language {
            ResponseLanguage::English => "NCERT_class_12_eng",
            ResponseLanguage::Hindi => "NCERT_class_12_hin",
        }
    }

    pub fn path_for(&self, chapter: u32, language: ResponseLanguage) -> Result<PathBuf, LibraryError> {
        if !(1..=CHAPTER_COUNT).contains(&chapter) {
            return Err(LibraryError::ChapterOutOfRange { chapter, max: CHAPTER_COUNT });
        }
        Ok(self
            .root
            .join(Self::language_dir(language))
            .join(format!("{chapter}.pdf")))
    }

    pub fn load(&self, chapter: u32, language: ResponseLanguage) -> Result<PdfSource, LibraryError> {
        let path = self.path_for(chapter, language)?;
        if !path.is_file() {
            return Err(LibraryError::NotFound { path });
        }
        Ok(PdfSource::Path(path))
    }

    /// Chapters that have a PDF on disk for `language`.
    pub fn available(&self, language: ResponseLanguage) -> Vec<u32> {
        (1..=CHAPTER_COUNT)
            .filter(|&chapter| {
                self.path_for(chapter, language)
                    .map(|path| path.is_file())
                    .unwrap_or(false)
            })
            .collect()
    }
}
