//! Common regex patterns for SH01 text cleanup and field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // OCR cleanup
    pub static ref REPEATED_SPACES: Regex = Regex::new(r" +").unwrap();

    pub static ref SPACED_DECIMAL: Regex = Regex::new(r"(\d) \. (\d)").unwrap();

    pub static ref POUND_STERLING: Regex = Regex::new(r"pound sterling").unwrap();

    pub static ref USD: Regex = Regex::new(r"usd").unwrap();

    pub static ref CURRENCY_GAP: Regex = Regex::new(r"(€|\$|£|eur|gbp) ").unwrap();

    pub static ref REPEATED_NEWLINES: Regex = Regex::new(r"\n+").unwrap();

    // Six digits, each optionally followed by a line break, a space, a
    // decimal point or a currency symbol: one row of a paper-form table.
    pub static ref DIGIT_CLUSTER: Regex = Regex::new(
        r"(\d(\n)?\s?\.?£?\$?€?(\n)?){6}"
    ).unwrap();

    // Totals row of the version 5.0 statement of capital
    pub static ref TOTALS_ROW: Regex = Regex::new(r"totals\s?\|?\s?\d\d").unwrap();
}
