//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, Sh01Error};

/// Main configuration for the sh01 pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Sh01Config {
    /// Companies House registry configuration.
    pub registry: RegistryConfig,

    /// On-disk workspace configuration.
    pub workspace: WorkspaceConfig,

    /// OCR engine configuration.
    pub ocr: OcrConfig,

    /// Exchange-rate service configuration.
    pub rates: RatesConfig,
}

/// Companies House API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// API key sent with every registry and document request.
    pub api_key: Option<String>,

    /// Base URL of the public data API.
    pub api_url: String,

    /// Base URL of the document API.
    pub document_api_url: String,

    /// Page size for filing-history listings.
    pub items_per_page: usize,

    /// Delay before retrying a malformed response, in seconds.
    pub retry_delay_secs: u64,

    /// Maximum retries of a malformed response (None = retry forever).
    pub max_retries: Option<u32>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.companieshouse.gov.uk".to_string(),
            document_api_url: "https://document-api.companieshouse.gov.uk".to_string(),
            items_per_page: 100,
            retry_delay_secs: 20,
            max_retries: None,
        }
    }
}

impl RegistryConfig {
    /// Delay between malformed-response retries.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Workspace layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Root directory holding one folder per company.
    pub work_dir: Option<PathBuf>,

    /// Maximum pages rasterized per document.
    pub max_pages: usize,

    /// DPI for rendering PDF pages to images.
    pub render_dpi: u32,

    /// File listing company ids, one per line.
    pub company_ids_file: Option<PathBuf>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            work_dir: None,
            max_pages: 10,
            render_dpi: 500,
            company_ids_file: None,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract executable.
    pub tesseract_bin: String,

    /// DPI hint passed for region OCR.
    pub dpi: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_bin: "tesseract".to_string(),
            dpi: 92,
        }
    }
}

/// Exchange-rate service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatesConfig {
    /// Base URL of the historical rates API.
    pub api_url: String,

    /// Optional access key appended to rate requests.
    pub access_key: Option<String>,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.exchangeratesapi.io".to_string(),
            access_key: None,
        }
    }
}

impl Sh01Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> std::result::Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Check that the settings needed to talk to the registry are present.
    pub fn validate(&self) -> Result<()> {
        self.api_key()?;
        self.work_dir()?;
        Ok(())
    }

    /// The registry API key.
    pub fn api_key(&self) -> Result<&str> {
        match self.registry.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Sh01Error::Config("registry.api_key is not set".to_string())),
        }
    }

    /// The workspace root directory.
    pub fn work_dir(&self) -> Result<&std::path::Path> {
        self.workspace
            .work_dir
            .as_deref()
            .ok_or_else(|| Sh01Error::Config("workspace.work_dir is not set".to_string()))
    }

    /// File listing company ids, defaulting to `company_house_ids_list` in the work dir.
    pub fn company_ids_file(&self) -> Result<PathBuf> {
        match &self.workspace.company_ids_file {
            Some(path) => Ok(path.clone()),
            None => Ok(self.work_dir()?.join("company_house_ids_list")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Sh01Config::default();
        assert_eq!(config.registry.items_per_page, 100);
        assert_eq!(config.registry.retry_delay(), Duration::from_secs(20));
        assert_eq!(config.workspace.max_pages, 10);
        assert_eq!(config.ocr.dpi, 92);
    }

    #[test]
    fn test_validate_requires_key_and_dir() {
        let mut config = Sh01Config::default();
        assert!(matches!(config.validate(), Err(Sh01Error::Config(_))));

        config.registry.api_key = Some("key".to_string());
        assert!(matches!(config.validate(), Err(Sh01Error::Config(_))));

        config.workspace.work_dir = Some(PathBuf::from("/data"));
        assert!(config.validate().is_ok());
        assert_eq!(
            config.company_ids_file().unwrap(),
            PathBuf::from("/data/company_house_ids_list")
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"registry": {"api_key": "abc"}}"#).unwrap();

        let config = Sh01Config::from_file(&path).unwrap();
        assert_eq!(config.api_key().unwrap(), "abc");
        assert_eq!(config.registry.retry_delay_secs, 20);
        assert_eq!(config.rates.api_url, "https://api.exchangeratesapi.io");
    }
}
