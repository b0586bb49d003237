//! Field extraction for the supported SH01 layouts.

mod context;
mod offline;
mod online;
mod parser;

pub use context::{ExtractionContext, RegionSpec, DEFAULT_REGION_DPI};
pub use offline::{Offline5Form, Offline6Form};
pub use online::{OnlineForm, OnlineOldForm};
pub use parser::DocumentParser;

use crate::error::{ExtractionError, Result};
use crate::models::filing::FormType;

/// Reads the capital figures from one layout.
pub trait FormExtractor {
    /// Share price in GBP and number of shares allotted.
    fn extract_share_price_and_allotted(
        &self,
        ctx: &ExtractionContext<'_>,
    ) -> Result<(Option<f64>, Option<f64>)>;

    /// Total shares in issue after the allotment.
    fn extract_total_shares(&self, ctx: &ExtractionContext<'_>) -> Result<Option<f64>>;
}

/// Extractor for one of the supported layouts.
#[derive(Debug, Clone, Copy)]
pub enum FormProcessor {
    Online(OnlineForm),
    OnlineOld(OnlineOldForm),
    Offline6(Offline6Form),
    Offline5(Offline5Form),
}

impl FormProcessor {
    /// Pick the extractor for a classified form.
    pub fn for_form_type(form_type: FormType) -> std::result::Result<Self, ExtractionError> {
        match form_type {
            FormType::Online => Ok(Self::Online(OnlineForm)),
            FormType::OnlineOld => Ok(Self::OnlineOld(OnlineOldForm)),
            FormType::Offline6 => Ok(Self::Offline6(Offline6Form)),
            FormType::Offline5 => Ok(Self::Offline5(Offline5Form)),
            FormType::Offline4 | FormType::Unknown => {
                Err(ExtractionError::UnsupportedFormType(form_type))
            }
        }
    }

    pub fn form_type(&self) -> FormType {
        match self {
            Self::Online(_) => FormType::Online,
            Self::OnlineOld(_) => FormType::OnlineOld,
            Self::Offline6(_) => FormType::Offline6,
            Self::Offline5(_) => FormType::Offline5,
        }
    }

    fn extractor(&self) -> &dyn FormExtractor {
        match self {
            Self::Online(form) => form,
            Self::OnlineOld(form) => form,
            Self::Offline6(form) => form,
            Self::Offline5(form) => form,
        }
    }
}

impl FormExtractor for FormProcessor {
    fn extract_share_price_and_allotted(
        &self,
        ctx: &ExtractionContext<'_>,
    ) -> Result<(Option<f64>, Option<f64>)> {
        self.extractor().extract_share_price_and_allotted(ctx)
    }

    fn extract_total_shares(&self, ctx: &ExtractionContext<'_>) -> Result<Option<f64>> {
        self.extractor().extract_total_shares(ctx)
    }
}
