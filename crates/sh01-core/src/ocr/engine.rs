//! OCR engine backed by the `tesseract` command-line tool.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{OcrEngine, OcrOptions};

/// Runs `tesseract <image> <output_base> --psm N [--dpi D]` and reads `<output_base>.txt`.
pub struct TesseractEngine {
    binary: String,
}

impl TesseractEngine {
    /// Create an engine using the `tesseract` binary on `PATH`.
    pub fn new() -> Self {
        Self {
            binary: "tesseract".to_string(),
        }
    }

    /// Create an engine from configuration.
    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new().with_binary(&config.tesseract_bin)
    }

    /// Use a different executable.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    fn build_args(image: &Path, output_base: &Path, options: OcrOptions) -> Vec<String> {
        let mut args = vec![
            image.display().to_string(),
            output_base.display().to_string(),
            "--psm".to_string(),
            options.psm.to_string(),
        ];
        if let Some(dpi) = options.dpi {
            args.push("--dpi".to_string());
            args.push(dpi.to_string());
        }
        args
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(
        &self,
        image: &Path,
        output_base: &Path,
        options: OcrOptions,
    ) -> Result<String, OcrError> {
        let start = Instant::now();
        let args = Self::build_args(image, output_base, options);
        debug!("Running {} {}", self.binary, args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|e| OcrError::Spawn {
                binary: self.binary.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(OcrError::Engine(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let text_path = text_output_path(output_base);
        let text = std::fs::read_to_string(&text_path).map_err(|e| OcrError::Output {
            path: text_path.display().to_string(),
            source: e,
        })?;

        info!(
            "OCR of {} (psm {}) produced {} chars in {}ms",
            image.display(),
            options.psm,
            text.len(),
            start.elapsed().as_millis()
        );

        Ok(text)
    }
}

/// Path of the text file written for `output_base`.
pub(crate) fn text_output_path(output_base: &Path) -> PathBuf {
    let mut name = output_base.as_os_str().to_owned();
    name.push(".txt");
    PathBuf::from(name)
}
