//! Page rendering through poppler's `pdftoppm`.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use super::{PageRasterizer, Result};
use crate::error::PdfError;

/// Prefix of the images `pdftoppm` writes into its scratch directory.
const RENDER_PREFIX: &str = "page";

/// Number of pages in a PDF.
pub fn page_count(pdf: &Path) -> Result<usize> {
    let document = lopdf::Document::load(pdf)
        .map_err(|e| PdfError::Parse(format!("{}: {}", pdf.display(), e)))?;
    Ok(document.get_pages().len())
}

/// Rasterizer backed by the `pdftoppm` binary.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    binary: String,
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(dpi: u32) -> Self {
        Self {
            binary: "pdftoppm".to_string(),
            dpi,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    fn build_args(&self, pdf: &Path, prefix: &Path, last_page: usize) -> Vec<String> {
        vec![
            "-jpeg".to_string(),
            "-r".to_string(),
            self.dpi.to_string(),
            "-f".to_string(),
            "1".to_string(),
            "-l".to_string(),
            last_page.to_string(),
            pdf.display().to_string(),
            prefix.display().to_string(),
        ]
    }
}

/// `pdftoppm` zero-pads page numbers to the width of the page count.
fn rendered_page(scratch: &Path, page: usize) -> Option<PathBuf> {
    [
        format!("{}-{}.jpg", RENDER_PREFIX, page),
        format!("{}-{:02}.jpg", RENDER_PREFIX, page),
        format!("{}-{:03}.jpg", RENDER_PREFIX, page),
    ]
    .into_iter()
    .map(|name| scratch.join(name))
    .find(|path| path.is_file())
}

impl PageRasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf: &Path, pages_dir: &Path, max_pages: usize) -> Result<usize> {
        let total = page_count(pdf)?;
        if total == 0 {
            return Err(PdfError::NoPages);
        }
        let last_page = total.min(max_pages);

        let scratch = tempfile::tempdir()
            .map_err(|e| PdfError::Render(format!("failed to create scratch dir: {}", e)))?;
        let args = self.build_args(pdf, &scratch.path().join(RENDER_PREFIX), last_page);
        debug!("Running {} {:?}", self.binary, args);

        let output = Command::new(&self.binary).args(&args).output().map_err(|e| {
            PdfError::Render(format!(
                "failed to run {}: {}. Make sure poppler-utils is installed.",
                self.binary, e
            ))
        })?;
        if !output.status.success() {
            return Err(PdfError::Render(format!(
                "{} failed: {}",
                self.binary,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        std::fs::create_dir_all(pages_dir)
            .map_err(|e| PdfError::Render(format!("{}: {}", pages_dir.display(), e)))?;
        for page in 1..=last_page {
            let rendered = rendered_page(scratch.path(), page)
                .ok_or_else(|| PdfError::Render(format!("page {} was not rendered", page)))?;
            let target = pages_dir.join(format!("{}.jpeg", page - 1));
            std::fs::copy(&rendered, &target)
                .map_err(|e| PdfError::Render(format!("{}: {}", target.display(), e)))?;
        }

        info!("Rendered {} of {} pages from {}", last_page, total, pdf.display());
        Ok(last_page)
    }
}
