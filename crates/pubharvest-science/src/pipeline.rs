use pubharvest_core::config::AppConfig;
use pubharvest_core::models::BibRecord;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::identifiers::Doi;
use crate::observer::{HarvestObserver, Stage};
use crate::reconcile::reconcile;
use crate::resolve::resolve_records;
use crate::sources::{
    BibliographyFetcher, CrossRefSource, DoiResolver, DoiSource, PubMedSource,
};
use crate::types::{FailureStage, HarvestFailure, SourceKind};

/// Outcome of one harvest run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HarvestReport {
    pub year: i32,
    pub records: Vec<BibRecord>,
    /// DOIs PubMed contributed, before reconciliation.
    pub pubmed_count: usize,
    /// DOIs CrossRef contributed, before reconciliation.
    pub crossref_count: usize,
    pub unique_dois: usize,
    pub failures: Vec<HarvestFailure>,
}

impl HarvestReport {
    pub fn count_for(&self, source: SourceKind) -> usize {
        match source {
            SourceKind::PubMed => self.pubmed_count,
            SourceKind::CrossRef => self.crossref_count,
        }
    }

    /// True when no lookup failed anywhere in the run.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs PubMed, then CrossRef, then reconciliation, then DOI resolution.
/// Each stage degrades to an empty contribution on failure.
pub struct Harvester {
    pubmed: Box<dyn DoiSource>,
    crossref: Box<dyn DoiSource>,
    resolver: Box<dyn BibliographyFetcher>,
}

impl Harvester {
    pub fn new(
        pubmed: Box<dyn DoiSource>,
        crossref: Box<dyn DoiSource>,
        resolver: Box<dyn BibliographyFetcher>,
    ) -> Self {
        Self {
            pubmed,
            crossref,
            resolver,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let sources = &config.sources;
        let org = &config.organization;
        Ok(Self::new(
            Box::new(PubMedSource::new(sources, &org.pubmed_affiliation)?),
            Box::new(CrossRefSource::new(sources, &org.crossref_affiliation)?),
            Box::new(DoiResolver::new(sources)?),
        ))
    }

    pub async fn harvest(&self, year: i32, observer: &dyn HarvestObserver) -> HarvestReport {
        info!(year, "harvest started");
        let mut failures = Vec::new();

        let pubmed_dois = collect_from(self.pubmed.as_ref(), year, observer, &mut failures).await;
        let crossref_dois =
            collect_from(self.crossref.as_ref(), year, observer, &mut failures).await;

        observer.stage_started(Stage::Reconcile);
        let dois = reconcile(&pubmed_dois, &crossref_dois);
        info!(count = dois.len(), "total DOIs without duplicates");
        observer.dois_reconciled(dois.len());
        observer.stage_finished(Stage::Reconcile);

        observer.stage_started(Stage::Resolve);
        let resolved = resolve_records(self.resolver.as_ref(), &dois, observer).await;
        observer.stage_finished(Stage::Resolve);
        failures.extend(resolved.failures);

        info!(
            year,
            records = resolved.records.len(),
            failures = failures.len(),
            "harvest finished"
        );

        HarvestReport {
            year,
            records: resolved.records,
            pubmed_count: pubmed_dois.len(),
            crossref_count: crossref_dois.len(),
            unique_dois: dois.len(),
            failures,
        }
    }
}

async fn collect_from(
    source: &dyn DoiSource,
    year: i32,
    observer: &dyn HarvestObserver,
    failures: &mut Vec<HarvestFailure>,
) -> Vec<Doi> {
    let kind = source.kind();
    observer.stage_started(Stage::Collect(kind));

    let dois = match source.collect(year, observer).await {
        Ok(collected) => {
            for failure in &collected.failures {
                observer.lookup_failed(failure);
            }
            failures.extend(collected.failures);
            collected.dois
        }
        Err(e) => {
            warn!(source = %kind, "API request failed: {e}");
            let failure = HarvestFailure::new(FailureStage::Search(kind), None, e.to_string());
            observer.lookup_failed(&failure);
            failures.push(failure);
            Vec::new()
        }
    };

    observer.stage_finished(Stage::Collect(kind));
    dois
}
