//! Drives companies through listing, download and parsing.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::document::FilingDocument;
use crate::download::Downloader;
use crate::error::Result;
use crate::extract::DocumentParser;
use crate::models::filing::{ExtractionResult, FilingItem};
use crate::registry::RegistryClient;

/// Outcome for one SH01 filing of a company.
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub company_id: String,
    pub transaction_id: String,
    pub document_dir: Option<PathBuf>,
    pub result: Option<ExtractionResult>,
}

/// Source of a company's SH01 filings.
pub trait FilingSource {
    fn sh01_filings(&self, company_id: &str) -> Result<Vec<FilingItem>>;
}

impl FilingSource for RegistryClient {
    fn sh01_filings(&self, company_id: &str) -> Result<Vec<FilingItem>> {
        self.filing_history(company_id)
    }
}

/// Processes every SH01 filing of a company and writes each `result.json`.
pub struct CompanyProcessor<'a> {
    filings: &'a dyn FilingSource,
    downloader: Downloader<'a>,
    parser: DocumentParser<'a>,
    work_dir: PathBuf,
}

impl<'a> CompanyProcessor<'a> {
    pub fn new(
        filings: &'a dyn FilingSource,
        downloader: Downloader<'a>,
        parser: DocumentParser<'a>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            filings,
            downloader,
            parser,
            work_dir: work_dir.into(),
        }
    }

    pub fn company_dir(&self, company_id: &str) -> PathBuf {
        self.work_dir.join(company_id)
    }

    /// Download and parse all SH01 filings of `company_id`.
    pub fn process_company(&self, company_id: &str) -> Result<Vec<DocumentOutcome>> {
        let items = self.filings.sh01_filings(company_id)?;
        let company_dir = self.company_dir(company_id);
        let mut outcomes = Vec::with_capacity(items.len());

        for item in &items {
            let document_dir = self.downloader.download(item, &company_dir)?;
            let result = match &document_dir {
                Some(dir) => {
                    let document = FilingDocument::open(dir)?;
                    self.parser.parse_and_write(&document)?
                }
                None => None,
            };
            outcomes.push(DocumentOutcome {
                company_id: company_id.to_string(),
                transaction_id: item.transaction_id.clone(),
                document_dir,
                result,
            });
        }

        info!("Processed {} filings for {}", outcomes.len(), company_id);
        Ok(outcomes)
    }
}

/// Read company ids, one per line; blank lines are skipped.
pub fn read_company_ids(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let ids: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if ids.is_empty() {
        warn!("No company ids in {}", path.display());
    }
    Ok(ids)
}
