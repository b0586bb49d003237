//! Form layout classification from the footer of the first pages.

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, warn};

use crate::document::FilingDocument;
use crate::error::Result;
use crate::models::filing::FormType;
use crate::ocr::{CropRegion, ImagePreprocessor, OcrEngine, OcrOptions, PageSegMode};

/// Pages searched for a layout marker.
const CLASSIFY_PAGES: usize = 3;

/// Bottom fifth of the page, where the form footer sits.
const FOOTER: CropRegion = CropRegion::rows(80, 100);

const FOOTER_IMAGE: &str = "formtype";
const FOOTER_TEXT: &str = "form_type";

const ELECTRONIC_MARKER: &str = "electronically filed document";

/// Electronic filings from this year on use the current layout.
const ONLINE_CUTOVER_YEAR: i32 = 2014;

/// Map footer text and filing date to a form layout.
pub fn classify_text(text: &str, filing_date: NaiveDate) -> FormType {
    let lower = text.to_lowercase();

    if lower.contains(ELECTRONIC_MARKER) {
        return if filing_date.year() >= ONLINE_CUTOVER_YEAR {
            FormType::Online
        } else {
            FormType::OnlineOld
        };
    }

    let compact = lower.replace(' ', "");
    if compact.contains("version6.0") {
        FormType::Offline6
    } else if compact.contains("version5.0") {
        FormType::Offline5
    } else if compact.contains("version4.0") {
        FormType::Offline4
    } else {
        FormType::Unknown
    }
}

/// Detects the layout of a downloaded filing, caching the footer text.
pub struct FormTypeClassifier<'a> {
    ocr: &'a dyn OcrEngine,
    preprocessor: ImagePreprocessor,
}

impl<'a> FormTypeClassifier<'a> {
    pub fn new(ocr: &'a dyn OcrEngine) -> Self {
        Self {
            ocr,
            preprocessor: ImagePreprocessor::new(),
        }
    }

    /// Classify `document`, reusing `pages/form_type.txt` when it already identifies a layout.
    ///
    /// Returns [`FormType::Unknown`] when none of the first three pages carry a marker.
    pub fn determine(&self, document: &FilingDocument) -> Result<FormType> {
        self.determine_at(document, document.date())
    }

    /// Like [`determine`](Self::determine), with an explicit filing date.
    pub fn determine_at(&self, document: &FilingDocument, filing_date: NaiveDate) -> Result<FormType> {
        let cache = document.form_type_cache_path();

        if cache.is_file() {
            let cached = std::fs::read_to_string(&cache)?;
            let form_type = classify_text(&cached, filing_date);
            if form_type != FormType::Unknown {
                debug!("Using cached form type {} for {}", form_type, document.root().display());
                return Ok(form_type);
            }
        }

        let mut form_type = FormType::Unknown;
        for page in 0..CLASSIFY_PAGES {
            let image = match image::open(document.page_path(page)) {
                Ok(image) => image,
                Err(e) => {
                    debug!("Skipping page {} for classification: {}", page, e);
                    continue;
                }
            };

            let footer = self.preprocessor.crop(&image, FOOTER)?;
            let footer_path = document.region_image_path(FOOTER_IMAGE);
            footer.save(&footer_path)?;

            let text = self.ocr.recognize(
                &footer_path,
                &document.ocr_output_base(FOOTER_TEXT),
                OcrOptions::new(PageSegMode::SingleBlock),
            )?;

            form_type = classify_text(&text, filing_date);
            if form_type != FormType::Unknown {
                info!("Detected form type {} on page {}", form_type, page);
                return Ok(form_type);
            }
        }

        warn!(
            "Could not determine form type of {}",
            document.root().display()
        );
        Ok(form_type)
    }
}
