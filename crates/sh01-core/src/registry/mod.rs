//! Companies House registry and document API access.

mod client;
mod http;

pub use client::{RegistryClient, Sleeper};
pub use http::{HttpDocumentFetcher, ReqwestTransport};

use crate::error::RegistryError;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Authenticated GET against the registry API.
pub trait HttpTransport {
    /// Raw response body for `url`.
    fn get(&self, url: &str) -> Result<String>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    fn get(&self, url: &str) -> Result<String> {
        (**self).get(url)
    }
}

/// Retrieves the binary content of a filed document.
pub trait DocumentFetcher {
    fn fetch(&self, document_id: &str) -> Result<Vec<u8>>;
}

impl<T: DocumentFetcher + ?Sized> DocumentFetcher for &T {
    fn fetch(&self, document_id: &str) -> Result<Vec<u8>> {
        (**self).fetch(document_id)
    }
}
