//! Materializes a filing on disk: metadata, PDF and page images.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::document::{metadata_path, pages_dir, pdf_path, MAX_PAGES};
use crate::error::Result;
use crate::models::filing::FilingItem;
use crate::pdf::PageRasterizer;
use crate::registry::DocumentFetcher;

/// Downloads filings into `<company_dir>/<action_date>_<transaction_id>/`.
pub struct Downloader<'a> {
    fetcher: &'a dyn DocumentFetcher,
    rasterizer: &'a dyn PageRasterizer,
    max_pages: usize,
}

impl<'a> Downloader<'a> {
    pub fn new(fetcher: &'a dyn DocumentFetcher, rasterizer: &'a dyn PageRasterizer) -> Self {
        Self {
            fetcher,
            rasterizer,
            max_pages: MAX_PAGES,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.clamp(1, MAX_PAGES);
        self
    }

    /// Directory a filing is stored in.
    pub fn document_dir(company_dir: &Path, item: &FilingItem) -> PathBuf {
        company_dir.join(item.folder_name())
    }

    /// Download `item` unless its PDF is already on disk.
    ///
    /// Returns the document directory, or `None` when the filing has no document link.
    pub fn download(&self, item: &FilingItem, company_dir: &Path) -> Result<Option<PathBuf>> {
        let Some(document_id) = item.document_id() else {
            warn!("SH01 filing {} has no document link. Skipped.", item.transaction_id);
            return Ok(None);
        };

        let doc_dir = Self::document_dir(company_dir, item);
        if pdf_path(&doc_dir).is_file() {
            warn!(
                "SH01 document {} already downloaded. Download skipped.",
                item.transaction_id
            );
            return Ok(Some(doc_dir));
        }

        let content = self.fetcher.fetch(document_id)?;
        std::fs::create_dir_all(pages_dir(&doc_dir))?;
        std::fs::write(metadata_path(&doc_dir), serde_json::to_string(item)?)?;
        std::fs::write(pdf_path(&doc_dir), &content)?;

        let pages = self
            .rasterizer
            .rasterize(&pdf_path(&doc_dir), &pages_dir(&doc_dir), self.max_pages)?;
        info!(
            "Downloaded {} ({} bytes, {} pages)",
            item.transaction_id,
            content.len(),
            pages
        );
        Ok(Some(doc_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FilingDocument;
    use crate::error::PdfError;
    use crate::registry;
    use image::{Rgb, RgbImage};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    struct CountingFetcher {
        requested: RefCell<Vec<String>>,
    }

    impl DocumentFetcher for CountingFetcher {
        fn fetch(&self, document_id: &str) -> registry::Result<Vec<u8>> {
            self.requested.borrow_mut().push(document_id.to_string());
            Ok(b"%PDF-1.5 stub".to_vec())
        }
    }

    /// Writes blank pages instead of rendering.
    struct BlankPages(usize);

    impl PageRasterizer for BlankPages {
        fn rasterize(&self, _pdf: &Path, pages_dir: &Path, max_pages: usize) -> std::result::Result<usize, PdfError> {
            let count = self.0.min(max_pages);
            for index in 0..count {
                RgbImage::from_pixel(40, 60, Rgb([255, 255, 255]))
                    .save(pages_dir.join(format!("{}.jpeg", index)))
                    .map_err(|e| PdfError::Render(e.to_string()))?;
            }
            Ok(count)
        }
    }

    fn sh01_item() -> FilingItem {
        serde_json::from_value(serde_json::json!({
            "type": "SH01",
            "date": "2015-03-12",
            "action_date": "2015-03-10",
            "transaction_id": "MzEyMzQ1Njc4",
            "description_values": {"capital": [{"figure": "2,000", "currency": "GBP"}]},
            "links": {"document_metadata": "https://document-api.example/document/abc-123"}
        }))
        .unwrap()
    }

    #[test]
    fn test_download_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = CountingFetcher { requested: RefCell::default() };
        let rasterizer = BlankPages(12);

        let doc_dir = Downloader::new(&fetcher, &rasterizer)
            .download(&sh01_item(), dir.path())
            .unwrap()
            .unwrap();

        assert_eq!(doc_dir, dir.path().join("2015-03-10_MzEyMzQ1Njc4"));
        assert_eq!(*fetcher.requested.borrow(), vec!["abc-123".to_string()]);
        assert!(pdf_path(&doc_dir).is_file());

        let document = FilingDocument::open(&doc_dir).unwrap();
        assert_eq!(document.transaction_id(), "MzEyMzQ1Njc4");
        assert_eq!(document.pages().len(), 10);
    }

    #[test]
    fn test_existing_pdf_skips_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let doc_dir = dir.path().join("2015-03-10_MzEyMzQ1Njc4");
        std::fs::create_dir_all(&doc_dir).unwrap();
        std::fs::write(pdf_path(&doc_dir), b"already here").unwrap();

        let fetcher = CountingFetcher { requested: RefCell::default() };
        let rasterizer = BlankPages(1);
        let result = Downloader::new(&fetcher, &rasterizer)
            .download(&sh01_item(), dir.path())
            .unwrap();

        assert_eq!(result, Some(doc_dir.clone()));
        assert!(fetcher.requested.borrow().is_empty());
        assert_eq!(std::fs::read(pdf_path(&doc_dir)).unwrap(), b"already here");
        assert!(!metadata_path(&doc_dir).exists());
    }

    #[test]
    fn test_item_without_link_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut item = sh01_item();
        item.links = None;

        let fetcher = CountingFetcher { requested: RefCell::default() };
        let rasterizer = BlankPages(1);
        let result = Downloader::new(&fetcher, &rasterizer).download(&item, dir.path()).unwrap();

        assert_eq!(result, None);
        assert!(fetcher.requested.borrow().is_empty());
    }
}
