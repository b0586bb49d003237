//! Share price currency resolution.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::error::{CurrencyError, ExtractionError, Result};
use crate::models::config::RatesConfig;

/// Foreign currencies seen on SH01 forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    Usd,
    Eur,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Source of historical conversion rates into GBP.
pub trait RateProvider {
    /// GBP value of one unit of `currency` on `date`.
    fn gbp_rate(&self, currency: Currency, date: NaiveDate) -> std::result::Result<f64, CurrencyError>;
}

impl<T: RateProvider + ?Sized> RateProvider for &T {
    fn gbp_rate(&self, currency: Currency, date: NaiveDate) -> std::result::Result<f64, CurrencyError> {
        (**self).gbp_rate(currency, date)
    }
}

/// Convert a cleaned price token into GBP.
///
/// Returns `None` for the literal `nil`. Tokens without a USD or EUR marker
/// are taken to be GBP already.
pub fn resolve_share_price(
    token: &str,
    date: NaiveDate,
    rates: &dyn RateProvider,
) -> Result<Option<f64>> {
    if token == "nil" {
        return Ok(None);
    }

    let (amount, currency) = if token.contains('$') {
        (token.replace('$', "").replace("us", ""), Some(Currency::Usd))
    } else if token.contains('€') || token.contains("eur") {
        (token.replace('€', "").replace("eur", ""), Some(Currency::Eur))
    } else {
        (token.replace('£', "").replace("gbp", ""), None)
    };

    let value: f64 = amount.trim().parse().map_err(|_| ExtractionError::Parse {
        field: "share_price",
        value: token.to_string(),
    })?;

    match currency {
        Some(currency) => {
            let rate = rates.gbp_rate(currency, date)?;
            debug!("Converted {} {} at {} on {}", value, currency, rate, date);
            Ok(Some(value * rate))
        }
        None => Ok(Some(value)),
    }
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// Historical rates from an exchangeratesapi.io-compatible service.
pub struct ExchangeRatesApi {
    client: reqwest::blocking::Client,
    api_url: String,
    access_key: Option<String>,
}

impl ExchangeRatesApi {
    /// Create a client from configuration.
    pub fn new(config: &RatesConfig) -> std::result::Result<Self, CurrencyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            access_key: config.access_key.clone(),
        })
    }

    fn rate_url(&self, currency: Currency, date: NaiveDate) -> String {
        let mut url = format!(
            "{}/{}?base={}",
            self.api_url,
            date.format("%Y-%m-%d"),
            currency.code()
        );
        if let Some(key) = &self.access_key {
            url.push_str("&access_key=");
            url.push_str(key);
        }
        url
    }
}

impl RateProvider for ExchangeRatesApi {
    fn gbp_rate(&self, currency: Currency, date: NaiveDate) -> std::result::Result<f64, CurrencyError> {
        let url = self.rate_url(currency, date);
        debug!("Fetching {} rate for {}", currency, date);
        let response: RatesResponse = self.client.get(&url).send()?.json()?;
        response
            .rates
            .get("GBP")
            .copied()
            .ok_or_else(|| CurrencyError::MissingRate {
                currency: currency.code().to_string(),
                date: date.to_string(),
            })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// Fixed rates that record every lookup.
    pub(crate) struct FixedRates {
        pub usd: f64,
        pub eur: f64,
        pub calls: RefCell<Vec<(Currency, NaiveDate)>>,
    }

    impl FixedRates {
        pub fn new(usd: f64, eur: f64) -> Self {
            Self {
                usd,
                eur,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl RateProvider for FixedRates {
        fn gbp_rate(&self, currency: Currency, date: NaiveDate) -> std::result::Result<f64, CurrencyError> {
            self.calls.borrow_mut().push((currency, date));
            Ok(match currency {
                Currency::Usd => self.usd,
                Currency::Eur => self.eur,
            })
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 6, 23).unwrap()
    }

    #[test]
    fn test_nil_is_absent() {
        let rates = FixedRates::new(0.7, 0.8);
        assert_eq!(resolve_share_price("nil", date(), &rates).unwrap(), None);
        assert!(rates.calls.borrow().is_empty());
    }

    #[test]
    fn test_usd_converted_on_filing_date() {
        let rates = FixedRates::new(0.7, 0.8);
        let price = resolve_share_price("$1.50", date(), &rates).unwrap().unwrap();
        assert!((price - 1.50 * 0.7).abs() < 1e-12);
        assert_eq!(*rates.calls.borrow(), vec![(Currency::Usd, date())]);

        let price = resolve_share_price("us$2", date(), &rates).unwrap().unwrap();
        assert!((price - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_eur_converted() {
        let rates = FixedRates::new(0.7, 0.8);
        let price = resolve_share_price("€5", date(), &rates).unwrap().unwrap();
        assert!((price - 4.0).abs() < 1e-12);
        let price = resolve_share_price("eur5", date(), &rates).unwrap().unwrap();
        assert!((price - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_gbp_unchanged() {
        let rates = FixedRates::new(0.7, 0.8);
        assert_eq!(resolve_share_price("£2.00", date(), &rates).unwrap(), Some(2.0));
        assert_eq!(resolve_share_price("gbp0.01", date(), &rates).unwrap(), Some(0.01));
        assert_eq!(resolve_share_price("3", date(), &rates).unwrap(), Some(3.0));
        assert!(rates.calls.borrow().is_empty());
    }

    #[test]
    fn test_unparseable_price_is_error() {
        let rates = FixedRates::new(0.7, 0.8);
        assert!(resolve_share_price("£abc", date(), &rates).is_err());
    }

    #[test]
    fn test_rate_url() {
        let api = ExchangeRatesApi::new(&RatesConfig {
            api_url: "https://rates.example/".to_string(),
            access_key: Some("k".to_string()),
        })
        .unwrap();
        assert_eq!(
            api.rate_url(Currency::Eur, date()),
            "https://rates.example/2016-06-23?base=EUR&access_key=k"
        );
    }
}
