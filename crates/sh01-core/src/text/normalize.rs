//! Cleanup of raw OCR output and correction of misread glyphs.

use super::patterns::{
    CURRENCY_GAP, POUND_STERLING, REPEATED_NEWLINES, REPEATED_SPACES, SPACED_DECIMAL, USD,
};

/// Punctuation the OCR engine reads off table rules and borders.
const NOISE_CHARS: [char; 7] = [',', '-', '—', '_', '!', '|', ')'];

/// Glyphs commonly misread inside numeric tokens, applied in order.
const SYMBOL_CORRECTIONS: [(&str, &str); 8] = [
    (":", ""),
    (" ", ""),
    ("/", "7"),
    ("§", "5"),
    ("|", ""),
    ("'", ""),
    ("©", "0"),
    ("—", ""),
];

/// Clean raw OCR text into the lowercase form the extractors search.
pub fn normalize_ocr_text(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| !NOISE_CHARS.contains(c)).collect();
    let text = stripped.to_lowercase();

    let text = REPEATED_SPACES.replace_all(&text, " ");
    let text = SPACED_DECIMAL.replace_all(&text, "$1.$2");
    let text = POUND_STERLING.replace_all(&text, "£");
    let text = USD.replace_all(&text, "$$");
    let text = CURRENCY_GAP.replace_all(&text, "$1");
    let text = REPEATED_NEWLINES.replace_all(&text, "\n");

    text.into_owned()
}

/// Replace misrecognized symbols in an isolated numeric token.
pub fn correct_symbols(token: &str) -> String {
    let mut text = token.to_string();
    for (from, to) in SYMBOL_CORRECTIONS {
        text = text.replace(from, to).trim().to_string();
    }
    text
}
