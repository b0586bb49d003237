//! reqwest-backed registry and document transports.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, LOCATION};
use reqwest::redirect::Policy;
use tracing::debug;

use super::{DocumentFetcher, HttpTransport, Result};
use crate::error::RegistryError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Registry transport sending the API key as the `Authorization` header.
pub struct ReqwestTransport {
    client: Client,
    api_key: String,
}

impl ReqwestTransport {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }
}

impl HttpTransport for ReqwestTransport {
    /// Bodies are returned whatever the status; callers decide what is malformed.
    fn get(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, &self.api_key)
            .send()?;
        debug!("GET {} -> {}", url, response.status());
        Ok(response.text()?)
    }
}

/// Document API client: resolves the content redirect, then downloads it.
pub struct HttpDocumentFetcher {
    api: Client,
    content: Client,
    document_api_url: String,
    api_key: String,
}

impl HttpDocumentFetcher {
    pub fn new(document_api_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let api = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(Policy::none())
            .build()?;
        let content = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            api,
            content,
            document_api_url: document_api_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn content_url(&self, document_id: &str) -> String {
        format!("{}/document/{}/content", self.document_api_url, document_id)
    }
}

impl DocumentFetcher for HttpDocumentFetcher {
    fn fetch(&self, document_id: &str) -> Result<Vec<u8>> {
        let url = self.content_url(document_id);
        let response = self
            .api
            .get(&url)
            .basic_auth(&self.api_key, Some(""))
            .send()?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let Some(location) = location else {
            if !status.is_redirection() && !status.is_success() {
                return Err(RegistryError::Status {
                    status: status.as_u16(),
                    url,
                });
            }
            return Err(RegistryError::MissingLocation(document_id.to_string()));
        };

        debug!("Document {} redirected to {}", document_id, location);
        let bytes = self
            .content
            .get(&location)
            .send()?
            .error_for_status()?
            .bytes()?;
        Ok(bytes.to_vec())
    }
}
