//! OCR pipeline: region cropping and text recognition.

mod engine;
mod preprocessing;

pub use engine::TesseractEngine;
pub use preprocessing::{CropRegion, ImagePreprocessor};

use std::fmt;
use std::path::Path;

use crate::error::OcrError;

/// Tesseract page-segmentation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageSegMode {
    /// Single column of text of variable sizes (`--psm 4`).
    SingleColumn,
    /// Single uniform block of text (`--psm 6`).
    SingleBlock,
    /// Sparse text, as much as possible in no particular order (`--psm 11`).
    SparseText,
}

impl PageSegMode {
    /// Numeric value passed to the engine.
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::SingleColumn => 4,
            Self::SingleBlock => 6,
            Self::SparseText => 11,
        }
    }
}

impl fmt::Display for PageSegMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Options for one recognition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcrOptions {
    pub psm: PageSegMode,
    /// Resolution hint for images without DPI metadata.
    pub dpi: Option<u32>,
}

impl OcrOptions {
    pub fn new(psm: PageSegMode) -> Self {
        Self { psm, dpi: None }
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }
}

/// Turns an image on disk into text.
pub trait OcrEngine {
    /// Recognize `image`, write the text to `<output_base>.txt` and return it unmodified.
    fn recognize(
        &self,
        image: &Path,
        output_base: &Path,
        options: OcrOptions,
    ) -> Result<String, OcrError>;
}

impl<T: OcrEngine + ?Sized> OcrEngine for &T {
    fn recognize(
        &self,
        image: &Path,
        output_base: &Path,
        options: OcrOptions,
    ) -> Result<String, OcrError> {
        (**self).recognize(image, output_base, options)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};

    /// One recognition request seen by [`ScriptedOcr`].
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) struct OcrCall {
        pub name: String,
        pub options: OcrOptions,
        pub image_size: Option<(u32, u32)>,
    }

    /// Returns canned text per output name and mode, in order; unscripted requests read as empty.
    pub(crate) struct ScriptedOcr {
        responses: RefCell<HashMap<(String, PageSegMode), VecDeque<String>>>,
        calls: RefCell<Vec<OcrCall>>,
    }

    impl ScriptedOcr {
        pub fn new() -> Self {
            Self {
                responses: RefCell::new(HashMap::new()),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub fn respond(self, name: &str, psm: PageSegMode, text: &str) -> Self {
            self.responses
                .borrow_mut()
                .entry((name.to_string(), psm))
                .or_default()
                .push_back(text.to_string());
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }

        pub fn calls(&self) -> Vec<OcrCall> {
            self.calls.borrow().clone()
        }
    }

    impl OcrEngine for ScriptedOcr {
        fn recognize(
            &self,
            image: &Path,
            output_base: &Path,
            options: OcrOptions,
        ) -> Result<String, OcrError> {
            let name = output_base
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.calls.borrow_mut().push(OcrCall {
                name: name.clone(),
                options,
                image_size: image::image_dimensions(image).ok(),
            });

            let text = self
                .responses
                .borrow_mut()
                .get_mut(&(name, options.psm))
                .and_then(|queue| queue.pop_front())
                .unwrap_or_default();

            let text_path = engine::text_output_path(output_base);
            std::fs::write(&text_path, &text).map_err(|e| OcrError::Output {
                path: text_path.display().to_string(),
                source: e,
            })?;
            Ok(text)
        }
    }
}
