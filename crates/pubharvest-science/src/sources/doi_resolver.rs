use std::time::Duration;

use async_trait::async_trait;
use pubharvest_core::config::SourcesConfig;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::error::Result;
use crate::http::{HttpClient, user_agent};
use crate::identifiers::Doi;
use crate::sources::BibliographyFetcher;

/// Media type asked of doi.org through content negotiation.
pub const BIBTEX_MEDIA_TYPE: &str = "text/bibliography; style=bibtex";

/// Resolves DOIs through doi.org, asking for a BibTeX-style bibliography.
pub struct DoiResolver {
    client: HttpClient,
    base_url: String,
}

impl DoiResolver {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        let client = HttpClient::new(
            Duration::from_secs(config.timeout_secs),
            &user_agent(config.polite_email.as_deref()),
        )?;
        Ok(Self::with_client(client, &config.doi_base_url))
    }

    pub fn with_client(client: HttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The DOI goes into the path verbatim; its `/` separators are not escaped.
    pub fn resolver_url(&self, doi: &Doi) -> String {
        format!("{}/{}", self.base_url, doi.as_str())
    }
}

#[async_trait]
impl BibliographyFetcher for DoiResolver {
    async fn fetch_bibliography(&self, doi: &Doi) -> Result<String> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(BIBTEX_MEDIA_TYPE));
        let body = self
            .client
            .get_with_headers(&self.resolver_url(doi), headers)
            .await?;
        Ok(body.trim().to_string())
    }
}
