use std::time::Duration;

use async_trait::async_trait;
use pubharvest_core::config::SourcesConfig;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Result, ScienceError};
use crate::http::{HttpClient, build_url, user_agent};
use crate::identifiers::Doi;
use crate::observer::HarvestObserver;
use crate::sources::{CollectedDois, DoiSource};
use crate::types::{PublicationWindow, SourceKind};

pub struct CrossRefSource {
    client: HttpClient,
    base_url: String,
    affiliation: String,
    max_results: u32,
}

impl CrossRefSource {
    pub fn new(config: &SourcesConfig, affiliation: &str) -> Result<Self> {
        let client = HttpClient::new(
            Duration::from_secs(config.timeout_secs),
            &user_agent(config.polite_email.as_deref()),
        )?;
        Ok(Self::with_client(
            client,
            &config.crossref_base_url,
            affiliation,
            config.max_results,
        ))
    }

    pub fn with_client(
        client: HttpClient,
        base_url: &str,
        affiliation: &str,
        max_results: u32,
    ) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            affiliation: affiliation.to_string(),
            max_results,
        }
    }

    /// Works published within `window`, as DOIs. Duplicates reported by
    /// CrossRef are kept.
    pub async fn search_dois(&self, window: &PublicationWindow) -> Result<Vec<Doi>> {
        let filter = date_filter(window);
        let rows = self.max_results.to_string();
        let url = build_url(
            &self.base_url,
            "works",
            &[
                ("query.affiliation", self.affiliation.as_str()),
                ("filter", filter.as_str()),
                ("rows", rows.as_str()),
            ],
        )?;
        let val: Value = self.client.get_json(url.as_str()).await?;
        parse_work_dois(&val)
    }
}

/// CrossRef's `until-pub-date` is inclusive, so the window's exclusive upper
/// bound is sent as the day before it.
pub fn date_filter(window: &PublicationWindow) -> String {
    format!(
        "from-pub-date:{},until-pub-date:{}",
        window.from.format("%Y-%m-%d"),
        window.last_day().format("%Y-%m-%d")
    )
}

/// `message.items[*].DOI` from a works listing. Items without a DOI string
/// are skipped.
pub fn parse_work_dois(v: &Value) -> Result<Vec<Doi>> {
    let items = v["message"]["items"].as_array().ok_or_else(|| {
        ScienceError::Parse("missing message.items in CrossRef response".to_string())
    })?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let doi = item["DOI"].as_str();
            if doi.is_none() {
                debug!("CrossRef item without DOI skipped");
            }
            doi.map(Doi::from)
        })
        .collect())
}

#[async_trait]
impl DoiSource for CrossRefSource {
    fn kind(&self) -> SourceKind {
        SourceKind::CrossRef
    }

    async fn collect(&self, year: i32, observer: &dyn HarvestObserver) -> Result<CollectedDois> {
        let window = PublicationWindow::calendar_year(year)?;
        let dois = self.search_dois(&window).await?;
        info!(year, count = dois.len(), "CrossRef DOIs found");
        observer.identifiers_found(SourceKind::CrossRef, dois.len());
        for doi in &dois {
            observer.doi_collected(SourceKind::CrossRef, doi);
        }

        Ok(CollectedDois {
            dois,
            failures: Vec::new(),
        })
    }
}
