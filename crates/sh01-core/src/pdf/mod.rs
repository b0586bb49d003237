//! PDF page rasterization.

mod rasterizer;

pub use rasterizer::{page_count, PdftoppmRasterizer};

use std::path::Path;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Renders the leading pages of a PDF to `pages/<n>.jpeg`.
pub trait PageRasterizer {
    /// Write at most `max_pages` pages into `pages_dir`, returning how many were written.
    fn rasterize(&self, pdf: &Path, pages_dir: &Path, max_pages: usize) -> Result<usize>;
}

impl<T: PageRasterizer + ?Sized> PageRasterizer for &T {
    fn rasterize(&self, pdf: &Path, pages_dir: &Path, max_pages: usize) -> Result<usize> {
        (**self).rasterize(pdf, pages_dir, max_pages)
    }
}
