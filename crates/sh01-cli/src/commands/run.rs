//! Run command - list, download and parse SH01 filings for companies.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use sh01_core::{
    read_company_ids, CompanyProcessor, DocumentOutcome, DocumentParser, Downloader,
    ExchangeRatesApi, HttpDocumentFetcher, PdftoppmRasterizer, RegistryClient, ReqwestTransport,
    TesseractEngine,
};

use super::load_config;

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Company ids to process (default: read from the ids file)
    company_ids: Vec<String>,

    /// File listing company ids, one per line
    #[arg(long)]
    ids_file: Option<PathBuf>,

    /// Also write summary.csv to the work directory
    #[arg(long)]
    summary: bool,
}

pub fn run(args: RunArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    config.validate()?;

    let api_key = config.api_key()?;
    let work_dir = config.work_dir()?;

    let company_ids = if args.company_ids.is_empty() {
        let ids_file = match args.ids_file {
            Some(path) => path,
            None => config.company_ids_file()?,
        };
        read_company_ids(&ids_file)?
    } else {
        args.company_ids
    };
    if company_ids.is_empty() {
        anyhow::bail!("No company ids to process");
    }

    println!(
        "{} Processing {} companies",
        style("ℹ").blue(),
        company_ids.len()
    );

    let registry = RegistryClient::new(
        &config.registry,
        Box::new(ReqwestTransport::new(api_key)?),
    );
    let fetcher = HttpDocumentFetcher::new(&config.registry.document_api_url, api_key)?;
    let rasterizer = PdftoppmRasterizer::new(config.workspace.render_dpi);
    let ocr = TesseractEngine::from_config(&config.ocr);
    let rates = ExchangeRatesApi::new(&config.rates)?;

    let processor = CompanyProcessor::new(
        &registry,
        Downloader::new(&fetcher, &rasterizer).with_max_pages(config.workspace.max_pages),
        DocumentParser::new(&ocr, &rates).with_dpi(config.ocr.dpi),
        work_dir,
    );

    let pb = ProgressBar::new(company_ids.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} companies {msg}")?
            .progress_chars("=>-"),
    );

    let mut outcomes = Vec::new();
    for company_id in &company_ids {
        pb.set_message(company_id.clone());
        match processor.process_company(company_id) {
            Ok(company_outcomes) => outcomes.extend(company_outcomes),
            Err(e) => {
                pb.abandon_with_message(format!("failed on {}", company_id));
                error!("Failed to process company {}: {}", company_id, e);
                return Err(e.into());
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    let parsed = outcomes.iter().filter(|o| o.result.is_some()).count();
    println!(
        "{} Parsed {} of {} SH01 filings in {:.1}s",
        style("✓").green(),
        parsed,
        outcomes.len(),
        start.elapsed().as_secs_f64()
    );

    if args.summary {
        let summary_path = work_dir.join("summary.csv");
        write_summary(&summary_path, &outcomes)?;
        info!("Summary written to {}", summary_path.display());
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    Ok(())
}

fn format_figure(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_summary(path: &Path, outcomes: &[DocumentOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "company_id",
        "transaction_id",
        "status",
        "date",
        "form_type",
        "share_price",
        "n_allotted",
        "total_shares",
        "fundraising",
        "valuation",
        "equity",
    ])?;

    for outcome in outcomes {
        match &outcome.result {
            Some(result) => wtr.write_record([
                outcome.company_id.as_str(),
                outcome.transaction_id.as_str(),
                "parsed",
                result.date.as_str(),
                result.form_type.as_str(),
                &format_figure(result.share_price),
                &format_figure(result.n_allotted),
                &format_figure(result.total_shares),
                &format_figure(result.fundraising),
                &format_figure(result.valuation),
                &format_figure(result.equity),
            ])?,
            None => {
                let status = if outcome.document_dir.is_some() {
                    "unsupported"
                } else {
                    "no_document"
                };
                wtr.write_record([
                    outcome.company_id.as_str(),
                    outcome.transaction_id.as_str(),
                    status,
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                ])?
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
