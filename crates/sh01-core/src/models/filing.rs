//! Filing data models: registry items, form types and extraction records.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ExtractionError;

/// Historical layout of an SH01 form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormType {
    /// Electronically filed, 2014 onwards.
    Online,
    /// Electronically filed, before 2014.
    OnlineOld,
    /// Paper form, version 6.0.
    Offline6,
    /// Paper form, version 5.0.
    Offline5,
    /// Paper form, version 4.0.
    Offline4,
    /// No layout marker recognized.
    Unknown,
}

impl FormType {
    /// Tag used in result files and caches.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::OnlineOld => "online_old",
            Self::Offline6 => "offline6",
            Self::Offline5 => "offline5",
            Self::Offline4 => "offline4",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "online" => Ok(Self::Online),
            "online_old" => Ok(Self::OnlineOld),
            "offline6" => Ok(Self::Offline6),
            "offline5" => Ok(Self::Offline5),
            "offline4" => Ok(Self::Offline4),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown form type: {}", other)),
        }
    }
}

/// Links attached to a filing-history item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilingLinks {
    /// Reference to the document metadata resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_metadata: Option<String>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// One item of a company's filing history, persisted verbatim as `metadata.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingItem {
    /// Filing type code, e.g. `SH01`.
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Date the filing was registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Date of the action the filing reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_date: Option<String>,

    /// Registry transaction id.
    pub transaction_id: String,

    /// Structured values from the filing description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_values: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<FilingLinks>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl FilingItem {
    /// Document id: the last segment of the document metadata link.
    pub fn document_id(&self) -> Option<&str> {
        self.links
            .as_ref()?
            .document_metadata
            .as_deref()?
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
    }

    /// Folder name for this filing: `<action_date>_<transaction_id>`.
    pub fn folder_name(&self) -> String {
        let date = self
            .action_date
            .as_deref()
            .or(self.date.as_deref())
            .unwrap_or("undated");
        format!("{}_{}", date, self.transaction_id)
    }

    /// Filing date used for classification and currency conversion.
    pub fn filing_date(&self) -> Result<NaiveDate, ExtractionError> {
        let raw = self
            .date
            .as_deref()
            .ok_or(ExtractionError::MissingMetadata("date"))?;
        parse_filing_date(raw)
    }

    /// Share capital reported in the filing description, if any.
    pub fn capital(&self) -> Result<Option<Capital>, ExtractionError> {
        let first = self
            .description_values
            .as_ref()
            .and_then(|values| values.get("capital"))
            .and_then(|capital| capital.get(0));

        match first {
            Some(value) => Capital::from_value(value).map(Some),
            None => Ok(None),
        }
    }
}

/// Parse a registry date such as `2015-03-12` (a time suffix is ignored).
pub fn parse_filing_date(raw: &str) -> Result<NaiveDate, ExtractionError> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| ExtractionError::Parse {
        field: "date",
        value: raw.to_string(),
    })
}

/// First capital entry of the filing description, with `figure` made numeric.
///
/// Every other field is kept as the registry sent it, in its original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capital(Map<String, Value>);

impl Capital {
    fn from_value(value: &Value) -> Result<Self, ExtractionError> {
        let mut fields = value
            .as_object()
            .cloned()
            .ok_or(ExtractionError::MissingMetadata("capital"))?;

        let figure = match fields.get("figure") {
            Some(Value::String(s)) => s
                .replace(',', "")
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .ok_or_else(|| ExtractionError::Parse {
                    field: "capital.figure",
                    value: s.clone(),
                })?,
            Some(Value::Number(n)) => n.clone(),
            _ => return Err(ExtractionError::MissingMetadata("capital.figure")),
        };
        fields.insert("figure".to_string(), Value::Number(figure));

        Ok(Self(fields))
    }

    /// Capital figure with thousands separators removed.
    pub fn figure(&self) -> Option<f64> {
        self.0.get("figure").and_then(Value::as_f64)
    }

    pub fn currency(&self) -> Option<&str> {
        self.get("currency").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Structured figures extracted from one SH01 document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Filing date, `YYYY-MM-DD`.
    pub date: String,
    pub form_type: FormType,
    /// Price paid per share, in GBP.
    pub share_price: Option<f64>,
    pub n_allotted: Option<f64>,
    pub total_shares: Option<f64>,
    /// `n_allotted * share_price`.
    pub fundraising: Option<f64>,
    /// `total_shares * share_price`.
    pub valuation: Option<f64>,
    /// `fundraising / valuation`, absent when the valuation is zero.
    pub equity: Option<f64>,
    pub capital: Option<Capital>,
    pub transaction_id: String,
}

/// Fundraising, valuation and equity derived from the extracted fields.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedMetrics {
    pub fundraising: Option<f64>,
    pub valuation: Option<f64>,
    pub equity: Option<f64>,
}

impl DerivedMetrics {
    /// All three metrics need every input; equity also needs a non-zero valuation.
    pub fn compute(
        share_price: Option<f64>,
        n_allotted: Option<f64>,
        total_shares: Option<f64>,
    ) -> Self {
        let (Some(price), Some(allotted), Some(total)) = (share_price, n_allotted, total_shares)
        else {
            return Self::default();
        };

        let fundraising = allotted * price;
        let valuation = total * price;
        let equity = if valuation == 0.0 {
            None
        } else {
            Some(fundraising / valuation)
        };

        Self {
            fundraising: Some(fundraising),
            valuation: Some(valuation),
            equity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn item(value: Value) -> FilingItem {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_form_type_tags() {
        for form_type in [
            FormType::Online,
            FormType::OnlineOld,
            FormType::Offline6,
            FormType::Offline5,
            FormType::Offline4,
            FormType::Unknown,
        ] {
            let json = serde_json::to_string(&form_type).unwrap();
            assert_eq!(json, format!("\"{}\"", form_type));
            assert_eq!(form_type.as_str().parse::<FormType>().unwrap(), form_type);
        }
        assert!("offline3".parse::<FormType>().is_err());
    }

    #[test]
    fn test_derived_metrics() {
        let metrics = DerivedMetrics::compute(Some(2.5), Some(100.0), Some(500.0));
        assert_eq!(metrics.fundraising, Some(250.0));
        assert_eq!(metrics.valuation, Some(1250.0));
        assert_eq!(metrics.equity, Some(0.2));
    }

    #[test]
    fn test_derived_metrics_cascade_to_absent() {
        let inputs = [Some(1.0), None];
        for price in inputs {
            for allotted in inputs {
                for total in inputs {
                    let metrics = DerivedMetrics::compute(price, allotted, total);
                    let all_present = price.is_some() && allotted.is_some() && total.is_some();
                    assert_eq!(metrics.fundraising.is_some(), all_present);
                    assert_eq!(metrics.valuation.is_some(), all_present);
                    assert_eq!(metrics.equity.is_some(), all_present);
                }
            }
        }
    }

    #[test]
    fn test_zero_valuation_leaves_equity_absent() {
        let metrics = DerivedMetrics::compute(Some(0.0), Some(10.0), Some(100.0));
        assert_eq!(metrics.fundraising, Some(0.0));
        assert_eq!(metrics.valuation, Some(0.0));
        assert_eq!(metrics.equity, None);
    }

    #[test]
    fn test_filing_item_round_trips_unknown_fields() {
        let raw = json!({
            "type": "SH01",
            "date": "2015-03-12",
            "action_date": "2015-03-01",
            "transaction_id": "MzEx",
            "category": "capital",
            "links": {
                "self": "/company/123/filing-history/MzEx",
                "document_metadata": "https://document-api.companieshouse.gov.uk/document/abc123"
            }
        });
        let filing = item(raw.clone());

        assert_eq!(filing.kind, "SH01");
        assert_eq!(filing.document_id(), Some("abc123"));
        assert_eq!(filing.folder_name(), "2015-03-01_MzEx");
        assert_eq!(
            filing.filing_date().unwrap(),
            NaiveDate::from_ymd_opt(2015, 3, 12).unwrap()
        );
        assert_eq!(serde_json::to_value(&filing).unwrap(), raw);
    }

    #[test]
    fn test_capital_figure_drops_separators() {
        let filing = item(json!({
            "type": "SH01",
            "date": "2016-01-01",
            "transaction_id": "t1",
            "description_values": {
                "capital": [{"figure": "1,234,567.50", "currency": "GBP", "date": "2016-01-01"}]
            }
        }));

        let capital = filing.capital().unwrap().unwrap();
        assert_eq!(capital.figure(), Some(1234567.5));
        assert_eq!(capital.currency(), Some("GBP"));
        assert_eq!(capital.get("date"), Some(&json!("2016-01-01")));
    }

    #[test]
    fn test_capital_keeps_source_fields_and_order() {
        let filing = item(json!({
            "type": "SH01",
            "date": "2016-01-01",
            "transaction_id": "t1",
            "description_values": {
                "capital": [{"currency": {"code": "GBP"}, "figure": "2,000", "date": "2016-01-01"}]
            }
        }));

        let capital = filing.capital().unwrap().unwrap();
        assert_eq!(capital.currency(), None);
        assert_eq!(capital.get("currency"), Some(&json!({"code": "GBP"})));
        assert_eq!(
            serde_json::to_string(&capital).unwrap(),
            r#"{"currency":{"code":"GBP"},"figure":2000.0,"date":"2016-01-01"}"#
        );
    }

    #[test]
    fn test_capital_absent() {
        let filing = item(json!({
            "type": "SH01",
            "date": "2016-01-01",
            "transaction_id": "t1",
            "description_values": {"date": "2016-01-01"}
        }));
        assert_eq!(filing.capital().unwrap(), None);
    }

    #[test]
    fn test_result_serializes_absent_fields_as_null() {
        let result = ExtractionResult {
            date: "2015-01-01".to_string(),
            form_type: FormType::Offline5,
            share_price: None,
            n_allotted: Some(10.0),
            total_shares: None,
            fundraising: None,
            valuation: None,
            equity: None,
            capital: None,
            transaction_id: "t1".to_string(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["form_type"], json!("offline5"));
        assert_eq!(value["share_price"], Value::Null);
        assert_eq!(value["n_allotted"], json!(10.0));
    }
}
