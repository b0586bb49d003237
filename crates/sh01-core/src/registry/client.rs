//! Filing-history listing with retries on malformed responses.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::HttpTransport;
use crate::error::{RegistryError, Result};
use crate::models::config::RegistryConfig;
use crate::models::filing::FilingItem;

/// Blocks the caller between retries.
pub type Sleeper = Box<dyn Fn(Duration)>;

#[derive(Debug, Deserialize)]
struct FilingHistoryPage {
    #[serde(default)]
    items: Vec<Value>,
}

/// Client for the public data API.
pub struct RegistryClient {
    transport: Box<dyn HttpTransport>,
    api_url: String,
    items_per_page: usize,
    retry_delay: Duration,
    max_retries: Option<u32>,
    sleeper: Sleeper,
}

impl RegistryClient {
    pub fn new(config: &RegistryConfig, transport: Box<dyn HttpTransport>) -> Self {
        Self {
            transport,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            items_per_page: config.items_per_page.max(1),
            retry_delay: config.retry_delay(),
            max_retries: config.max_retries,
            sleeper: Box::new(std::thread::sleep),
        }
    }

    /// Replace the function used to wait between retries.
    pub fn with_sleeper(mut self, sleeper: impl Fn(Duration) + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// GET `url` as JSON, waiting and retrying while the body does not parse.
    pub fn get_json(&self, url: &str) -> std::result::Result<Value, RegistryError> {
        let mut malformed = 0u32;
        loop {
            let body = self.transport.get(url)?;
            match serde_json::from_str(&body) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    malformed += 1;
                    if self.max_retries.is_some_and(|max| malformed > max) {
                        return Err(RegistryError::RetriesExhausted {
                            url: url.to_string(),
                            attempts: malformed,
                        });
                    }
                    warn!(
                        "Malformed response from {} ({}), retrying in {}s",
                        url,
                        e,
                        self.retry_delay.as_secs()
                    );
                    (self.sleeper)(self.retry_delay);
                }
            }
        }
    }

    fn filing_history_url(&self, company_id: &str, start_index: usize) -> String {
        format!(
            "{}/company/{}/filing-history?start_index={}&items_per_page={}",
            self.api_url, company_id, start_index, self.items_per_page
        )
    }

    /// All SH01 items in a company's filing history, in registry order.
    pub fn filing_history(&self, company_id: &str) -> Result<Vec<FilingItem>> {
        let mut start_index = 0;
        let mut filings = Vec::new();

        loop {
            let url = self.filing_history_url(company_id, start_index);
            let page: FilingHistoryPage = serde_json::from_value(self.get_json(&url)?)?;
            let count = page.items.len();
            debug!("{} items from {}", count, url);
            start_index += count;

            for item in page.items {
                if item.get("type").and_then(Value::as_str) == Some("SH01") {
                    filings.push(serde_json::from_value(item)?);
                }
            }

            if count != self.items_per_page {
                break;
            }
        }

        info!("Found {} SH01 filings for {}", filings.len(), company_id);
        Ok(filings)
    }
}
