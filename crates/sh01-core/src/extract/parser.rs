//! Assembles the extraction record for one document.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::{ExtractionContext, FormExtractor, FormProcessor, DEFAULT_REGION_DPI};
use crate::classifier::FormTypeClassifier;
use crate::currency::RateProvider;
use crate::document::FilingDocument;
use crate::error::Result;
use crate::models::filing::{DerivedMetrics, ExtractionResult};
use crate::ocr::OcrEngine;

/// Classifies a document, runs the matching extractor and derives the metrics.
pub struct DocumentParser<'a> {
    ocr: &'a dyn OcrEngine,
    rates: &'a dyn RateProvider,
    dpi: u32,
}

impl<'a> DocumentParser<'a> {
    pub fn new(ocr: &'a dyn OcrEngine, rates: &'a dyn RateProvider) -> Self {
        Self {
            ocr,
            rates,
            dpi: DEFAULT_REGION_DPI,
        }
    }

    /// Set the DPI hint used for region OCR.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Extract the record for `document`.
    ///
    /// Returns `Ok(None)` when the layout is not supported. Failures inside
    /// one extraction step leave that step's fields empty.
    pub fn parse(&self, document: &FilingDocument) -> Result<Option<ExtractionResult>> {
        let start = Instant::now();
        let form_type = FormTypeClassifier::new(self.ocr).determine(document)?;

        let processor = match FormProcessor::for_form_type(form_type) {
            Ok(processor) => processor,
            Err(e) => {
                warn!("Error parsing document {}. Error: {}", document.transaction_id(), e);
                return Ok(None);
            }
        };

        let ctx = ExtractionContext::new(document, self.ocr, self.rates).with_dpi(self.dpi);

        let (share_price, n_allotted) = match processor.extract_share_price_and_allotted(&ctx) {
            Ok(fields) => fields,
            Err(e) => {
                error!(
                    "Error extracting share price of {}: {}",
                    document.transaction_id(),
                    e
                );
                (None, None)
            }
        };

        let total_shares = match processor.extract_total_shares(&ctx) {
            Ok(total) => total,
            Err(e) => {
                error!(
                    "Error extracting total shares of {}: {}",
                    document.transaction_id(),
                    e
                );
                None
            }
        };

        let metrics = DerivedMetrics::compute(share_price, n_allotted, total_shares);
        let capital = match document.metadata().capital() {
            Ok(capital) => capital,
            Err(e) => {
                warn!("Unreadable capital for {}: {}", document.transaction_id(), e);
                None
            }
        };

        debug!(
            "price={:?} allotted={:?} total={:?}",
            share_price, n_allotted, total_shares
        );
        info!(
            "Parsed {} ({}) in {}ms",
            document.transaction_id(),
            form_type,
            start.elapsed().as_millis()
        );

        Ok(Some(ExtractionResult {
            date: document.date().format("%Y-%m-%d").to_string(),
            form_type,
            share_price,
            n_allotted,
            total_shares,
            fundraising: metrics.fundraising,
            valuation: metrics.valuation,
            equity: metrics.equity,
            capital,
            transaction_id: document.transaction_id().to_string(),
        }))
    }

    /// Parse `document` and write its `result.json`.
    pub fn parse_and_write(&self, document: &FilingDocument) -> Result<Option<ExtractionResult>> {
        let result = self.parse(document)?;
        document.write_result(result.as_ref())?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::tests::FixedRates;
    use crate::document::tests::fixture;
    use crate::models::filing::FormType;
    use crate::ocr::tests::ScriptedOcr;
    use crate::ocr::PageSegMode;
    use pretty_assertions::assert_eq;

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("value present");
        assert!((actual - expected).abs() < 1e-9, "{} != {}", actual, expected);
    }

    #[test]
    fn test_offline5_document() {
        let dir = tempfile::tempdir().unwrap();
        let doc = fixture(dir.path(), "2011-04-01", 2);
        let ocr = ScriptedOcr::new()
            .respond("form_type", PageSegMode::SingleBlock, "SH01 Version 5.0")
            .respond(
                "0cropped",
                PageSegMode::SingleBlock,
                "Class of shares | Currency\n100 | 0.01 | 2.50 | 0.00",
            )
            .respond("2cropped", PageSegMode::SingleColumn, "Totals | 500 | 5.00");
        let rates = FixedRates::new(0.7, 0.8);

        let result = DocumentParser::new(&ocr, &rates)
            .parse_and_write(&doc)
            .unwrap()
            .unwrap();

        assert_eq!(result.form_type, FormType::Offline5);
        assert_eq!(result.date, "2011-04-01");
        assert_eq!(result.n_allotted, Some(100.0));
        assert_eq!(result.share_price, Some(2.5));
        assert_eq!(result.total_shares, Some(500.0));
        assert_close(result.fundraising, 250.0);
        assert_close(result.valuation, 1250.0);
        assert_close(result.equity, 0.2);
        assert_eq!(result.transaction_id, "MzAwMDAwMDAw");
        assert_eq!(result.capital.as_ref().and_then(|c| c.figure()), Some(1250.0));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(doc.result_path()).unwrap()).unwrap();
        assert_eq!(written["form_type"], "offline5");
        assert_eq!(written["capital"]["currency"], "GBP");
    }

    #[test]
    fn test_unsupported_layout_writes_empty_record() {
        let dir = tempfile::tempdir().unwrap();
        let doc = fixture(dir.path(), "2009-04-01", 1);
        let ocr = ScriptedOcr::new().respond("form_type", PageSegMode::SingleBlock, "version 4.0");
        let rates = FixedRates::new(0.7, 0.8);

        let result = DocumentParser::new(&ocr, &rates).parse_and_write(&doc).unwrap();
        assert_eq!(result, None);
        assert_eq!(std::fs::read_to_string(doc.result_path()).unwrap(), "{}");
        assert_eq!(ocr.call_count(), 1);
    }

    #[test]
    fn test_failed_step_leaves_fields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let doc = fixture(dir.path(), "2016-02-01", 1);
        std::fs::write(doc.form_type_cache_path(), "electronically filed document").unwrap();
        let ocr = ScriptedOcr::new().respond(
            "0cropped",
            PageSegMode::SingleBlock,
            "number allotted 10\namount paid abc",
        );
        let rates = FixedRates::new(0.7, 0.8);

        let result = DocumentParser::new(&ocr, &rates).parse(&doc).unwrap().unwrap();
        assert_eq!(result.form_type, FormType::Online);
        assert_eq!(result.share_price, None);
        assert_eq!(result.n_allotted, None);
        assert_eq!(result.total_shares, None);
        assert_eq!(result.fundraising, None);
        assert_eq!(result.equity, None);
    }

    #[test]
    fn test_zero_valuation_has_no_equity() {
        let dir = tempfile::tempdir().unwrap();
        let doc = fixture(dir.path(), "2011-04-01", 2);
        std::fs::write(doc.form_type_cache_path(), "version 5.0").unwrap();
        let ocr = ScriptedOcr::new()
            .respond("0cropped", PageSegMode::SingleBlock, "currency\n100 0.01 0.00 0.00")
            .respond("2cropped", PageSegMode::SingleColumn, "totals 500");
        let rates = FixedRates::new(0.7, 0.8);

        let result = DocumentParser::new(&ocr, &rates).parse(&doc).unwrap().unwrap();
        assert_eq!(result.valuation, Some(0.0));
        assert_eq!(result.fundraising, Some(0.0));
        assert_eq!(result.equity, None);
    }
}
