//! Paper forms scanned by the registry (versions 5.0 and 6.0).

use tracing::{debug, error};

use super::context::{
    find_digit_cluster, parse_number, segment_after, token, ExtractionContext, RegionSpec,
};
use super::FormExtractor;
use crate::currency::resolve_share_price;
use crate::error::{ExtractionError, Result};
use crate::ocr::{CropRegion, PageSegMode};
use crate::text::correct_symbols;
use crate::text::patterns::TOTALS_ROW;

/// Allotment table on the first page.
const ALLOTMENT_TABLE: RegionSpec = RegionSpec {
    name: "0cropped",
    region: CropRegion::rows(50, 90),
    remove_borders: true,
    psm: PageSegMode::SingleBlock,
};

/// Totals row of the statement of capital on the second page.
const V5_TOTALS: RegionSpec = RegionSpec {
    name: "2cropped",
    region: CropRegion::rows(50, 100),
    remove_borders: false,
    psm: PageSegMode::SingleColumn,
};

/// Aggregate totals block; pages 1 to 3 share one crop name.
const V6_TOTALS: RegionSpec = RegionSpec {
    name: "2cropped",
    region: CropRegion::rows(50, 90),
    remove_borders: true,
    psm: PageSegMode::SingleColumn,
};

const V6_TOTALS_PAGES: [usize; 3] = [1, 2, 3];

/// Columns of the allotment row: number allotted, nominal value, amount paid.
const ALLOTTED_COLUMN: usize = 0;
const PRICE_COLUMN: usize = 2;

fn table_line(text: &str) -> String {
    text.replace('|', " ").replace('\\', "")
}

/// Read the allotment row of a paper form: `(share price in GBP, shares allotted)`.
fn read_allotment_row(ctx: &ExtractionContext<'_>) -> Result<(Option<f64>, Option<f64>)> {
    let text = ctx.read_page_region(0, &ALLOTMENT_TABLE)?;
    let after_currency = segment_after(&text, "currency")
        .ok_or(ExtractionError::MissingAnchor("currency"))?;

    let retried;
    let row = match find_digit_cluster(after_currency) {
        Some(row) => row,
        None => {
            debug!("No allotment row in block read, retrying as sparse text");
            retried = ctx.read_region(ALLOTMENT_TABLE.name, PageSegMode::SparseText)?;
            match find_digit_cluster(&retried) {
                Some(row) => row,
                None => return Ok((None, None)),
            }
        }
    };

    let line = table_line(row);
    let price = correct_symbols(token(&line, PRICE_COLUMN)?);
    let allotted = correct_symbols(token(&line, ALLOTTED_COLUMN)?);
    let n_allotted = parse_number("n_allotted", &allotted)?;
    let share_price = resolve_share_price(&price, ctx.date(), ctx.rates())?;

    Ok((share_price, Some(n_allotted)))
}

/// SH01 version 5.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline5Form;

impl FormExtractor for Offline5Form {
    fn extract_share_price_and_allotted(
        &self,
        ctx: &ExtractionContext<'_>,
    ) -> Result<(Option<f64>, Option<f64>)> {
        read_allotment_row(ctx)
    }

    fn extract_total_shares(&self, ctx: &ExtractionContext<'_>) -> Result<Option<f64>> {
        let text = ctx.read_page_region(1, &V5_TOTALS)?;

        let Some(found) = TOTALS_ROW.find(&text) else {
            error!("No totals row in {}", ctx.document().root().display());
            return Ok(None);
        };

        let line = text[found.start() + "totals".len()..]
            .replace('|', " ")
            .replace(',', "");
        let first = line.split_whitespace().next().unwrap_or_default();
        match first.parse::<f64>() {
            Ok(total) => Ok(Some(total)),
            Err(_) => {
                error!("Unreadable total shares '{}' in {}", first, ctx.document().root().display());
                Ok(None)
            }
        }
    }
}

/// SH01 version 6.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline6Form;

impl FormExtractor for Offline6Form {
    fn extract_share_price_and_allotted(
        &self,
        ctx: &ExtractionContext<'_>,
    ) -> Result<(Option<f64>, Option<f64>)> {
        read_allotment_row(ctx)
    }

    /// Each page overwrites the same crop, so only the last page is read.
    fn extract_total_shares(&self, ctx: &ExtractionContext<'_>) -> Result<Option<f64>> {
        for page in V6_TOTALS_PAGES {
            ctx.crop_page(page, &V6_TOTALS)?;
        }
        let text = ctx.read_region(V6_TOTALS.name, V6_TOTALS.psm)?;

        if !text.contains("ist total aggregate") {
            debug!("No aggregate totals in {}", ctx.document().root().display());
            return Ok(None);
        }
        let Some(row) = find_digit_cluster(&text) else {
            return Ok(None);
        };

        let line = row.replace('|', " ");
        let total = token(&line, 0)?;
        parse_number("total_shares", total).map(Some)
    }
}
