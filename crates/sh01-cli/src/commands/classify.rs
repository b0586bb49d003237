//! Classify command - detect the layout of a downloaded filing.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use sh01_core::models::filing::parse_filing_date;
use sh01_core::{FilingDocument, FormTypeClassifier, TesseractEngine};

use super::load_config;

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// Filing directory containing metadata.json and pages/
    #[arg(required = true)]
    document_dir: PathBuf,

    /// Filing date (YYYY-MM-DD); defaults to the date in metadata.json
    #[arg(short, long)]
    date: Option<String>,
}

pub fn run(args: ClassifyArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let document = FilingDocument::open(&args.document_dir)?;

    let filing_date = match args.date.as_deref() {
        Some(raw) => parse_filing_date(raw)?,
        None => document.date(),
    };

    let ocr = TesseractEngine::from_config(&config.ocr);
    let form_type = FormTypeClassifier::new(&ocr).determine_at(&document, filing_date)?;
    info!("{} is {}", args.document_dir.display(), form_type);

    println!("{}", form_type);
    Ok(())
}
