//! On-disk layout of one downloaded filing.
//!
//! ```text
//! <doc_dir>/
//!   metadata.json        filing-history item
//!   document.pdf         original document
//!   result.json          extraction record
//!   pages/<n>.jpeg       rasterized pages
//!   pages/<name>.jpg     cropped regions sent to OCR
//!   pages/<name>.txt     OCR output
//!   pages/form_type.txt  cached classification text
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::filing::{ExtractionResult, FilingItem};

/// Most pages kept per document.
pub const MAX_PAGES: usize = 10;

/// A downloaded filing and its derived artifacts.
#[derive(Debug, Clone)]
pub struct FilingDocument {
    root: PathBuf,
    metadata: FilingItem,
    date: NaiveDate,
}

impl FilingDocument {
    /// Open a document directory, reading its `metadata.json`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let metadata = read_metadata(&root)?;
        let date = metadata.filing_date()?;
        Ok(Self {
            root,
            metadata,
            date,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata(&self) -> &FilingItem {
        &self.metadata
    }

    /// Filing date from the metadata.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn transaction_id(&self) -> &str {
        &self.metadata.transaction_id
    }

    pub fn pages_dir(&self) -> PathBuf {
        pages_dir(&self.root)
    }

    /// Rasterized page `index` (0-based).
    pub fn page_path(&self, index: usize) -> PathBuf {
        self.pages_dir().join(format!("{}.jpeg", index))
    }

    /// Page images present on disk, in order, stopping at the first gap.
    #[cfg(test)]
    pub(crate) fn pages(&self) -> Vec<PathBuf> {
        (0..MAX_PAGES)
            .map(|index| self.page_path(index))
            .take_while(|path| path.is_file())
            .collect()
    }

    /// Image written for a named region crop.
    pub fn region_image_path(&self, name: &str) -> PathBuf {
        self.pages_dir().join(format!("{}.jpg", name))
    }

    /// OCR output base for a named region; the engine appends `.txt`.
    pub fn ocr_output_base(&self, name: &str) -> PathBuf {
        self.pages_dir().join(name)
    }

    /// Cached classification text.
    pub fn form_type_cache_path(&self) -> PathBuf {
        self.pages_dir().join("form_type.txt")
    }

    pub fn result_path(&self) -> PathBuf {
        result_path(&self.root)
    }

    /// Write the extraction record; `None` writes an empty object.
    pub fn write_result(&self, result: Option<&ExtractionResult>) -> Result<()> {
        write_result(&self.root, result)
    }
}

pub(crate) fn pages_dir(root: &Path) -> PathBuf {
    root.join("pages")
}

pub(crate) fn metadata_path(root: &Path) -> PathBuf {
    root.join("metadata.json")
}

pub(crate) fn pdf_path(root: &Path) -> PathBuf {
    root.join("document.pdf")
}

pub(crate) fn result_path(root: &Path) -> PathBuf {
    root.join("result.json")
}

fn read_metadata(root: &Path) -> Result<FilingItem> {
    let content = std::fs::read_to_string(metadata_path(root))?;
    Ok(serde_json::from_str(&content)?)
}

pub(crate) fn write_result(root: &Path, result: Option<&ExtractionResult>) -> Result<()> {
    let content = match result {
        Some(result) => serde_json::to_string(result)?,
        None => "{}".to_string(),
    };
    std::fs::write(result_path(root), content)?;
    Ok(())
}
