//! Text normalization for noisy OCR output.

mod normalize;
pub mod patterns;

pub use normalize::{correct_symbols, normalize_ocr_text};
