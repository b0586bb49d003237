//! Electronically filed forms, before and after the 2014 redesign.

use tracing::{debug, error};

use super::context::{line_after, parse_number, segment_after, ExtractionContext, RegionSpec};
use super::FormExtractor;
use crate::error::{ExtractionError, Result};
use crate::ocr::{CropRegion, PageSegMode};
use crate::text::correct_symbols;

/// Allotment details block on the first page.
const ALLOTMENT_DETAILS: RegionSpec = RegionSpec {
    name: "0cropped",
    region: CropRegion::rows(39, 90),
    remove_borders: false,
    psm: PageSegMode::SingleBlock,
};

/// Whole page, searched for the totals statement.
const FULL_PAGE: RegionSpec = RegionSpec {
    name: "2cropped",
    region: CropRegion::FULL,
    remove_borders: false,
    psm: PageSegMode::SingleColumn,
};

/// Upper half of a continuation page.
const UPPER_HALF: RegionSpec = RegionSpec {
    name: "2cropped",
    region: CropRegion::rows(0, 50),
    remove_borders: false,
    psm: PageSegMode::SingleBlock,
};

/// Closing parenthesis is stripped during normalization.
const TOTALS_STATEMENT: &str = "statement of capital (totals";

/// Pre-2014 electronic filing.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnlineOldForm;

impl FormExtractor for OnlineOldForm {
    /// Prices are read as printed; no currency conversion applies.
    fn extract_share_price_and_allotted(
        &self,
        ctx: &ExtractionContext<'_>,
    ) -> Result<(Option<f64>, Option<f64>)> {
        let text = ctx.read_page_region(0, &ALLOTMENT_DETAILS)?;
        if !text.contains("amount paid") {
            debug!("No allotment details in {}", ctx.document().root().display());
            return Ok((None, None));
        }

        let price = line_after(&text, "amount paid")
            .ok_or(ExtractionError::MissingAnchor("amount paid"))?;
        let allotted = line_after(&text, "number allotted")
            .ok_or(ExtractionError::MissingAnchor("number allotted"))?;

        let price = correct_symbols(price.trim());
        let allotted = correct_symbols(allotted.trim()).replace('$', "8");

        Ok((
            Some(parse_number("share_price", &price)?),
            Some(parse_number("n_allotted", &allotted)?),
        ))
    }

    fn extract_total_shares(&self, ctx: &ExtractionContext<'_>) -> Result<Option<f64>> {
        for page in 1..ctx.max_pages() {
            if !ctx.try_crop_page(page, &FULL_PAGE)? {
                continue;
            }
            let text = ctx.read_region(FULL_PAGE.name, FULL_PAGE.psm)?;
            if !text.contains(TOTALS_STATEMENT) {
                continue;
            }

            let Some(segment) = segment_after(&text, "total number") else {
                error!("Totals statement without share count on page {}", page);
                return Ok(None);
            };
            let figure = segment.split("of shares").next().unwrap_or_default();
            let cleaned = figure
                .replace(':', "")
                .replace('/', "7")
                .replace('§', "5")
                .replace(' ', "")
                .replace('\'', "")
                .replace('\n', " ");
            return parse_number("total_shares", cleaned.trim()).map(Some);
        }
        Ok(None)
    }
}

/// Electronic filing from 2014 on.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnlineForm;

impl FormExtractor for OnlineForm {
    fn extract_share_price_and_allotted(
        &self,
        ctx: &ExtractionContext<'_>,
    ) -> Result<(Option<f64>, Option<f64>)> {
        OnlineOldForm.extract_share_price_and_allotted(ctx)
    }

    fn extract_total_shares(&self, ctx: &ExtractionContext<'_>) -> Result<Option<f64>> {
        let mut found = None;
        for page in 2..ctx.max_pages() {
            let text = if ctx.try_crop_page(page, &UPPER_HALF)? {
                ctx.read_region(UPPER_HALF.name, UPPER_HALF.psm)?
            } else {
                String::new()
            };
            if text.contains("total number of shares") {
                found = Some(text);
                break;
            }
        }

        let Some(text) = found else {
            debug!("No share total in {}", ctx.document().root().display());
            return Ok(None);
        };
        let figure = line_after(&text, "total number of shares")
            .ok_or(ExtractionError::MissingAnchor("total number of shares"))?;
        let figure = correct_symbols(figure);
        let total: i64 = figure.parse().map_err(|_| ExtractionError::Parse {
            field: "total_shares",
            value: figure.clone(),
        })?;
        Ok(Some(total as f64))
    }
}
