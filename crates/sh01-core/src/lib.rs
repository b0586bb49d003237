//! Core library for extracting share-capital figures from SH01 filings.
//!
//! This crate provides:
//! - Companies House filing-history listing and document download
//! - PDF rasterization and region OCR through external tools
//! - Form layout classification and per-layout field extraction
//! - Derived fundraising, valuation and equity metrics

pub mod classifier;
pub mod currency;
pub mod document;
pub mod download;
pub mod error;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod registry;
pub mod text;

pub use classifier::{classify_text, FormTypeClassifier};
pub use currency::{resolve_share_price, Currency, ExchangeRatesApi, RateProvider};
pub use document::FilingDocument;
pub use download::Downloader;
pub use error::{Result, Sh01Error};
pub use extract::{DocumentParser, FormExtractor, FormProcessor};
pub use models::config::Sh01Config;
pub use models::filing::{Capital, DerivedMetrics, ExtractionResult, FilingItem, FormType};
pub use ocr::{OcrEngine, OcrOptions, PageSegMode, TesseractEngine};
pub use pdf::{PageRasterizer, PdftoppmRasterizer};
pub use pipeline::{read_company_ids, CompanyProcessor, DocumentOutcome, FilingSource};
pub use registry::{DocumentFetcher, HttpDocumentFetcher, HttpTransport, RegistryClient, ReqwestTransport};
