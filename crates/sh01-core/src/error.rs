//! Error types for the sh01-core library.

use thiserror::Error;

use crate::models::filing::FormType;

/// Main error type for the sh01 library.
#[derive(Error, Debug)]
pub enum Sh01Error {
    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Companies House registry error.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Currency conversion error.
    #[error("currency error: {0}")]
    Currency(#[from] CurrencyError),

    /// PDF rasterization error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to running the OCR engine.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The OCR binary could not be started.
    #[error("failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The OCR binary exited unsuccessfully.
    #[error("OCR engine failed: {0}")]
    Engine(String),

    /// The text output of the engine could not be read.
    #[error("failed to read OCR output {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid crop region or image dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors related to field extraction on a single document.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The form type has no extractor.
    #[error("Unsupported form type: {0}")]
    UnsupportedFormType(FormType),

    /// An anchor phrase was not found in the recognized text.
    #[error("anchor {0:?} not found in recognized text")]
    MissingAnchor(&'static str),

    /// A table line did not have the expected token.
    #[error("missing token {index} in line {line:?}")]
    MissingToken { index: usize, line: String },

    /// Failed to parse a value.
    #[error("failed to parse {field}: {value:?}")]
    Parse { field: &'static str, value: String },

    /// Document metadata is missing a required field.
    #[error("missing metadata field: {0}")]
    MissingMetadata(&'static str),
}

/// Errors related to the Companies House registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Transport-level failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The registry answered with an unexpected status.
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// The malformed-response retry budget was exhausted.
    #[error("gave up on {url} after {attempts} malformed responses")]
    RetriesExhausted { url: String, attempts: u32 },

    /// The document API did not redirect to the content location.
    #[error("no content location for document {0}")]
    MissingLocation(String),
}

/// Errors related to exchange-rate lookups.
#[derive(Error, Debug)]
pub enum CurrencyError {
    /// Transport-level failure.
    #[error("rate request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The rate service did not return a GBP rate.
    #[error("no GBP rate for {currency} on {date}")]
    MissingRate { currency: String, date: String },
}

/// Errors related to PDF rasterization.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// The rasterizer failed.
    #[error("failed to render pages: {0}")]
    Render(String),
}

/// Result type for the sh01 library.
pub type Result<T> = std::result::Result<T, Sh01Error>;
