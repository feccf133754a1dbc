use std::time::Duration;

use async_trait::async_trait;
use pubharvest_core::config::SourcesConfig;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Result, ScienceError};
use crate::http::{HttpClient, build_url, user_agent};
use crate::identifiers::{Doi, Pmid};
use crate::observer::HarvestObserver;
use crate::sources::{CollectedDois, DoiSource};
use crate::types::{FailureStage, HarvestFailure, SourceKind};

const ELOCATION_ITEM: &[u8] = b"ELocationID";

/// PubMed via NCBI E-utilities. Searching yields PMIDs; each PMID is then
/// looked up individually to recover its DOI from the ELocationID item.
pub struct PubMedSource {
    client: HttpClient,
    base_url: String,
    affiliation: String,
    max_results: u32,
}

impl PubMedSource {
    pub fn new(config: &SourcesConfig, affiliation: &str) -> Result<Self> {
        let client = HttpClient::new(
            Duration::from_secs(config.timeout_secs),
            &user_agent(config.polite_email.as_deref()),
        )?;
        Ok(Self::with_client(
            client,
            &config.pubmed_base_url,
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

    pub fn search_term(&self, year: i32) -> String {
        format!("{}[affiliation] AND {year}[pdat]", self.affiliation)
    }

    /// PMIDs affiliated with the organization and published in `year`, in
    /// the order PubMed lists them.
    pub async fn search_ids(&self, year: i32) -> Result<Vec<Pmid>> {
        let term = self.search_term(year);
        let retmax = self.max_results.to_string();
        let url = build_url(
            &self.base_url,
            "esearch.fcgi",
            &[("db", "pubmed"), ("term", term.as_str()), ("retmax", retmax.as_str())],
        )?;
        let xml = self.client.get(url.as_str()).await?;
        parse_esearch_ids(&xml)
    }

    /// Raw ELocationID text for one record, if the record carries one.
    pub async fn fetch_elocation(&self, pmid: &Pmid) -> Result<Option<String>> {
        let url = build_url(
            &self.base_url,
            "esummary.fcgi",
            &[("db", "pubmed"), ("id", pmid.as_str())],
        )?;
        let xml = self.client.get(url.as_str()).await?;
        parse_elocation_id(&xml)
    }
}

#[async_trait]
impl DoiSource for PubMedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::PubMed
    }

    async fn collect(&self, year: i32, observer: &dyn HarvestObserver) -> Result<CollectedDois> {
        let ids = self.search_ids(year).await?;
        info!(year, count = ids.len(), "PubMed IDs found");
        observer.identifiers_found(SourceKind::PubMed, ids.len());

        let mut collected = CollectedDois::default();
        for pmid in &ids {
            match self.fetch_elocation(pmid).await {
                Ok(Some(elocation)) => match Doi::from_elocation(&elocation) {
                    Some(doi) => {
                        observer.doi_collected(SourceKind::PubMed, &doi);
                        collected.dois.push(doi);
                    }
                    None => debug!(%pmid, elocation = %elocation, "ELocationID carries no DOI token"),
                },
                Ok(None) => debug!(%pmid, "ELocationID is empty for this item"),
                Err(e) => {
                    warn!(%pmid, "PubMed summary lookup failed: {e}");
                    collected.failures.push(HarvestFailure::new(
                        FailureStage::Detail(SourceKind::PubMed),
                        Some(pmid.to_string()),
                        e.to_string(),
                    ));
                }
            }
        }

        info!(year, count = collected.count(), "PubMed DOIs resolved");
        Ok(collected)
    }
}

// ─── E-utilities XML ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(rename = "IdList")]
    id_list: Option<IdList>,
    #[serde(rename = "ERROR")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdList {
    #[serde(rename = "Id", default)]
    ids: Vec<String>,
}

/// Ordered `IdList/Id` values from an eSearchResult document.
pub fn parse_esearch_ids(xml: &str) -> Result<Vec<Pmid>> {
    let result: ESearchResult = quick_xml::de::from_str(xml)?;

    match (result.id_list, result.error) {
        (Some(list), _) => Ok(list
            .ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(Pmid::from)
            .collect()),
        (None, Some(error)) => Err(ScienceError::ApiError(
            "PubMed esearch".to_string(),
            error.trim().to_string(),
        )),
        (None, None) => Ok(Vec::new()),
    }
}

/// Text of the first `<Item Name="ELocationID">` in an eSummaryResult
/// document. `None` when the item is missing or empty.
pub fn parse_elocation_id(xml: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) if is_elocation_item(&e)? => {
                let text = read_text(&mut reader)?;
                return Ok(Some(text).filter(|t| !t.is_empty()));
            }
            Event::Empty(e) if is_elocation_item(&e)? => return Ok(None),
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn is_elocation_item(e: &BytesStart<'_>) -> Result<bool> {
    if e.name().as_ref() != b"Item" {
        return Ok(false);
    }
    Ok(e
        .try_get_attribute("Name")?
        .is_some_and(|attr| attr.value.as_ref() == ELOCATION_ITEM))
}

fn read_text(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::End(_) | Event::Eof => break,
            _ => {}
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::observer::NoopObserver;
    use mockito::{Matcher, Server};

    #[derive(Default)]
    struct CountingObserver {
        found: Mutex<Vec<(SourceKind, usize)>>,
        collected: Mutex<Vec<Doi>>,
    }

    impl HarvestObserver for CountingObserver {
        fn identifiers_found(&self, source: SourceKind, count: usize) {
            self.found.lock().unwrap().push((source, count));
        }

        fn doi_collected(&self, _source: SourceKind, doi: &Doi) {
            self.collected.lock().unwrap().push(doi.clone());
        }
    }

    const ESEARCH_TWO: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE eSearchResult PUBLIC "-//NLM//DTD esearch 20060628//EN" "https://eutils.ncbi.nlm.nih.gov/eutils/dtd/20060628/esearch.dtd">
<eSearchResult><Count>2</Count><RetMax>2</RetMax><RetStart>0</RetStart>
<IdList>
<Id>23000001</Id>
<Id>23000002</Id>
</IdList>
<TranslationSet/><QueryTranslation>ibet[affiliation] AND 2012[pdat]</QueryTranslation>
</eSearchResult>"#;

    const ESEARCH_EMPTY: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<eSearchResult><Count>0</Count><RetMax>0</RetMax><RetStart>0</RetStart><IdList/>
</eSearchResult>"#;

    fn esummary(elocation: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" ?>
<eSummaryResult>
<DocSum>
    <Id>23000001</Id>
    <Item Name="PubDate" Type="Date">2012 Mar</Item>
    <Item Name="AuthorList" Type="List">
        <Item Name="Author" Type="String">Silva A</Item>
    </Item>
    <Item Name="ELocationID" Type="String">{elocation}</Item>
    <Item Name="DOI" Type="String">ignored</Item>
</DocSum>
</eSummaryResult>"#
        )
    }

    fn source(base_url: &str) -> PubMedSource {
        let client = HttpClient::new(Duration::from_secs(5), "pubharvest-test").unwrap();
        PubMedSource::with_client(client, base_url, "ibet", 1000)
    }

    async fn summary_mock(
        server: &mut mockito::ServerGuard,
        id: &str,
        body: String,
        status: usize,
    ) -> mockito::Mock {
        server
            .mock("GET", "/esummary.fcgi")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("db".into(), "pubmed".into()),
                Matcher::UrlEncoded("id".into(), id.into()),
            ]))
            .with_status(status)
            .with_body(body)
            .create_async()
            .await
    }

    #[test]
    fn parses_id_list_in_order() {
        let ids = parse_esearch_ids(ESEARCH_TWO).unwrap();
        assert_eq!(ids, vec![Pmid::from("23000001"), Pmid::from("23000002")]);
    }

    #[test]
    fn parses_empty_id_list() {
        assert!(parse_esearch_ids(ESEARCH_EMPTY).unwrap().is_empty());
    }

    #[test]
    fn esearch_error_element_is_an_error() {
        let xml = "<eSearchResult><ERROR>Invalid query</ERROR></eSearchResult>";
        assert!(matches!(
            parse_esearch_ids(xml),
            Err(ScienceError::ApiError(_, _))
        ));
    }

    #[test]
    fn finds_elocation_among_nested_items() {
        let value = parse_elocation_id(&esummary("doi: 10.1016/j.x.2012.01.001")).unwrap();
        assert_eq!(value.as_deref(), Some("doi: 10.1016/j.x.2012.01.001"));
    }

    #[test]
    fn empty_elocation_is_none() {
        assert_eq!(parse_elocation_id(&esummary("")).unwrap(), None);
        let self_closing = r#"<eSummaryResult><DocSum><Item Name="ELocationID" Type="String"/></DocSum></eSummaryResult>"#;
        assert_eq!(parse_elocation_id(self_closing).unwrap(), None);
    }

    #[test]
    fn missing_elocation_is_none() {
        let xml = r#"<eSummaryResult><DocSum><Id>1</Id><Item Name="Title" Type="String">T</Item></DocSum></eSummaryResult>"#;
        assert_eq!(parse_elocation_id(xml).unwrap(), None);
    }

    #[test]
    fn search_term_uses_affiliation_and_year() {
        let src = source("http://localhost");
        assert_eq!(src.search_term(2012), "ibet[affiliation] AND 2012[pdat]");
    }

    #[tokio::test]
    async fn collect_resolves_each_id_to_a_doi() {
        let mut server = Server::new_async().await;
        let _search = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("db".into(), "pubmed".into()),
                Matcher::UrlEncoded("term".into(), "ibet[affiliation] AND 2012[pdat]".into()),
                Matcher::UrlEncoded("retmax".into(), "1000".into()),
            ]))
            .with_status(200)
            .with_body(ESEARCH_TWO)
            .create_async()
            .await;
        let _first = summary_mock(&mut server, "23000001", esummary("doi: 10.1/a"), 200).await;
        let _second = summary_mock(&mut server, "23000002", esummary(""), 200).await;

        let collected = source(&server.url()).collect(2012, &NoopObserver).await.unwrap();

        assert_eq!(collected.dois, vec![Doi::from("10.1/a")]);
        assert_eq!(collected.count(), 1);
        assert!(collected.failures.is_empty());
    }

    #[tokio::test]
    async fn failed_summary_is_recorded_and_skipped() {
        let mut server = Server::new_async().await;
        let _search = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(ESEARCH_TWO)
            .create_async()
            .await;
        let _first = summary_mock(&mut server, "23000001", String::new(), 500).await;
        let _second = summary_mock(&mut server, "23000002", esummary("doi: 10.1/b"), 200).await;

        let collected = source(&server.url()).collect(2012, &NoopObserver).await.unwrap();

        assert_eq!(collected.dois, vec![Doi::from("10.1/b")]);
        assert_eq!(collected.failures.len(), 1);
        assert_eq!(
            collected.failures[0].stage,
            FailureStage::Detail(SourceKind::PubMed)
        );
        assert_eq!(collected.failures[0].identifier.as_deref(), Some("23000001"));
    }

    #[tokio::test]
    async fn zero_ids_gives_empty_list() {
        let mut server = Server::new_async().await;
        let _search = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(ESEARCH_EMPTY)
            .create_async()
            .await;

        let collected = source(&server.url()).collect(2012, &NoopObserver).await.unwrap();
        assert!(collected.dois.is_empty());
        assert_eq!(collected.count(), 0);
    }

    #[tokio::test]
    async fn failed_search_is_an_error() {
        let mut server = Server::new_async().await;
        let _search = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let result = source(&server.url()).collect(2012, &NoopObserver).await;
        assert!(matches!(result, Err(ScienceError::ApiError(_, _))));
    }

    #[tokio::test]
    async fn progress_event_only_for_resolved_ids() {
        let three = "<eSearchResult><IdList><Id>1</Id><Id>2</Id><Id>3</Id></IdList></eSearchResult>";
        let mut server = Server::new_async().await;
        let _search = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(three)
            .create_async()
            .await;
        let _good = summary_mock(&mut server, "1", esummary("doi: 10.1/a"), 200).await;
        let _empty = summary_mock(&mut server, "2", esummary(""), 200).await;
        let _broken = summary_mock(&mut server, "3", String::new(), 500).await;

        let observer = CountingObserver::default();
        let collected = source(&server.url()).collect(2012, &observer).await.unwrap();

        assert_eq!(*observer.found.lock().unwrap(), vec![(SourceKind::PubMed, 3)]);
        assert_eq!(*observer.collected.lock().unwrap(), vec![Doi::from("10.1/a")]);
        assert_eq!(collected.dois.len(), 1);
        assert_eq!(collected.failures.len(), 1);
    }
}
