use pubharvest_core::models::BibRecord;
use tracing::{debug, warn};

use crate::extract::extract_record;
use crate::observer::HarvestObserver;
use crate::reconcile::DoiSet;
use crate::sources::BibliographyFetcher;
use crate::types::{FailureStage, HarvestFailure};

#[derive(Debug, Clone, Default)]
pub struct ResolvedRecords {
    pub records: Vec<BibRecord>,
    pub failures: Vec<HarvestFailure>,
}

/// Fetch and extract a record for every DOI, one request at a time, in set
/// order. A DOI whose lookup fails produces no record.
pub async fn resolve_records(
    fetcher: &dyn BibliographyFetcher,
    dois: &DoiSet,
    observer: &dyn HarvestObserver,
) -> ResolvedRecords {
    let mut resolved = ResolvedRecords::default();

    for doi in dois {
        let text = match fetcher.fetch_bibliography(doi).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(%doi, "DOI not found: {e}");
                let failure = HarvestFailure::new(
                    FailureStage::Resolve,
                    Some(doi.to_string()),
                    e.to_string(),
                );
                observer.lookup_failed(&failure);
                resolved.failures.push(failure);
                None
            }
        };

        if let Some(text) = text {
            let record = extract_record(&text);
            debug!(%doi, fields = record.fields().count(), "record extracted");
            observer.record_resolved(doi);
            resolved.records.push(record);
        }
    }

    resolved
}
