//! Parse command - extract the record of one downloaded filing.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use sh01_core::{DocumentParser, ExchangeRatesApi, FilingDocument, TesseractEngine};

use super::load_config;

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Filing directory containing metadata.json and pages/
    #[arg(required = true)]
    document_dir: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.document_dir.is_dir() {
        anyhow::bail!("Filing directory not found: {}", args.document_dir.display());
    }
    let document = FilingDocument::open(&args.document_dir)?;

    let ocr = TesseractEngine::from_config(&config.ocr);
    let rates = ExchangeRatesApi::new(&config.rates)?;
    let parser = DocumentParser::new(&ocr, &rates).with_dpi(config.ocr.dpi);

    let result = parser.parse_and_write(&document)?;
    let output = match &result {
        Some(result) => serde_json::to_string_pretty(result)?,
        None => "{}".to_string(),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }
    Ok(())
}
