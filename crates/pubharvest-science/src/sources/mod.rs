use async_trait::async_trait;

use crate::error::Result;
use crate::identifiers::Doi;
use crate::observer::HarvestObserver;
use crate::types::{HarvestFailure, SourceKind};

pub mod crossref;
pub mod doi_resolver;
pub mod pubmed;

pub use crossref::CrossRefSource;
pub use doi_resolver::DoiResolver;
pub use pubmed::PubMedSource;

/// DOIs gathered by one source, before reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedDois {
    pub dois: Vec<Doi>,
    /// Per-item lookups that failed without sinking the whole source.
    pub failures: Vec<HarvestFailure>,
}

impl CollectedDois {
    pub fn count(&self) -> usize {
        self.dois.len()
    }
}

/// A catalog that can list the organization's DOIs for a publication year.
///
/// An `Err` means the source as a whole produced nothing; the pipeline
/// records it and carries on with zero contribution.
#[async_trait]
pub trait DoiSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn collect(&self, year: i32, observer: &dyn HarvestObserver) -> Result<CollectedDois>;
}

/// Turns a DOI into a bibliography text blob (BibTeX style).
#[async_trait]
pub trait BibliographyFetcher: Send + Sync {
    async fn fetch_bibliography(&self, doi: &Doi) -> Result<String>;
}
