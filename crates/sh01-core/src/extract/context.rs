//! Shared plumbing for the layout extractors: region OCR and token helpers.

use chrono::NaiveDate;
use tracing::debug;

use crate::currency::RateProvider;
use crate::document::{FilingDocument, MAX_PAGES};
use crate::error::{ExtractionError, Result};
use crate::ocr::{CropRegion, ImagePreprocessor, OcrEngine, OcrOptions, PageSegMode};
use crate::text::normalize_ocr_text;
use crate::text::patterns::DIGIT_CLUSTER;

/// DPI hint sent with region OCR requests.
pub const DEFAULT_REGION_DPI: u32 = 92;

/// Where a field lives on the page and how to read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpec {
    /// Name of the crop image (`pages/<name>.jpg`) and OCR output (`pages/<name>.txt`).
    pub name: &'static str,
    pub region: CropRegion,
    /// Erase table gridlines before OCR.
    pub remove_borders: bool,
    pub psm: PageSegMode,
}

/// Everything an extractor needs to read one document.
pub struct ExtractionContext<'a> {
    document: &'a FilingDocument,
    ocr: &'a dyn OcrEngine,
    rates: &'a dyn RateProvider,
    preprocessor: ImagePreprocessor,
    dpi: u32,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(
        document: &'a FilingDocument,
        ocr: &'a dyn OcrEngine,
        rates: &'a dyn RateProvider,
    ) -> Self {
        Self {
            document,
            ocr,
            rates,
            preprocessor: ImagePreprocessor::new(),
            dpi: DEFAULT_REGION_DPI,
        }
    }

    /// Set the DPI hint for region OCR.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn document(&self) -> &FilingDocument {
        self.document
    }

    /// Filing date, used for currency conversion.
    pub fn date(&self) -> NaiveDate {
        self.document.date()
    }

    pub fn rates(&self) -> &dyn RateProvider {
        self.rates
    }

    /// Upper bound on page indices searched for totals.
    pub fn max_pages(&self) -> usize {
        MAX_PAGES
    }

    /// Crop `spec.region` of page `page` into `pages/<spec.name>.jpg`.
    pub fn crop_page(&self, page: usize, spec: &RegionSpec) -> Result<()> {
        let image = image::open(self.document.page_path(page))?;
        let cropped = self
            .preprocessor
            .crop_region(&image, spec.region, spec.remove_borders)?;
        cropped.save(self.document.region_image_path(spec.name))?;
        Ok(())
    }

    /// Like [`crop_page`](Self::crop_page), but an unreadable page yields `false`.
    pub fn try_crop_page(&self, page: usize, spec: &RegionSpec) -> Result<bool> {
        let image = match image::open(self.document.page_path(page)) {
            Ok(image) => image,
            Err(e) => {
                debug!("Page {} unreadable: {}", page, e);
                return Ok(false);
            }
        };
        let cropped = self
            .preprocessor
            .crop_region(&image, spec.region, spec.remove_borders)?;
        cropped.save(self.document.region_image_path(spec.name))?;
        Ok(true)
    }

    /// OCR the current `pages/<name>.jpg` and normalize the text.
    pub fn read_region(&self, name: &str, psm: PageSegMode) -> Result<String> {
        let raw = self.ocr.recognize(
            &self.document.region_image_path(name),
            &self.document.ocr_output_base(name),
            OcrOptions::new(psm).with_dpi(self.dpi),
        )?;
        Ok(normalize_ocr_text(&raw))
    }

    /// Crop and read one region of one page.
    pub fn read_page_region(&self, page: usize, spec: &RegionSpec) -> Result<String> {
        self.crop_page(page, spec)?;
        self.read_region(spec.name, spec.psm)
    }
}

/// Text after the first `anchor`, up to its next occurrence.
pub(crate) fn segment_after<'t>(text: &'t str, anchor: &str) -> Option<&'t str> {
    let start = text.find(anchor)? + anchor.len();
    let rest = &text[start..];
    Some(rest.find(anchor).map_or(rest, |end| &rest[..end]))
}

/// Text after the first `anchor`, up to the end of that line.
pub(crate) fn line_after<'t>(text: &'t str, anchor: &str) -> Option<&'t str> {
    let segment = segment_after(text, anchor)?;
    Some(segment.split('\n').next().unwrap_or(segment))
}

/// Text from the start of the first six-digit table cluster.
pub(crate) fn find_digit_cluster(text: &str) -> Option<&str> {
    DIGIT_CLUSTER.find(text).map(|m| &text[m.start()..])
}

/// `index`-th whitespace-separated token of a table line.
pub(crate) fn token(line: &str, index: usize) -> Result<&str> {
    line.split_whitespace().nth(index).ok_or_else(|| {
        ExtractionError::MissingToken {
            index,
            line: line.chars().take(80).collect(),
        }
        .into()
    })
}

/// Parse a cleaned numeric token.
pub(crate) fn parse_number(field: &'static str, value: &str) -> Result<f64> {
    value.trim().parse::<f64>().map_err(|_| {
        ExtractionError::Parse {
            field,
            value: value.to_string(),
        }
        .into()
    })
}
