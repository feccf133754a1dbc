use crate::identifiers::Doi;
use crate::types::{HarvestFailure, SourceKind};

/// Pipeline stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Collect(SourceKind),
    Reconcile,
    Resolve,
}

/// Receives progress from a harvest run. The library never writes to the
/// console itself; callers that want progress markers implement this.
///
/// Every method defaults to doing nothing.
pub trait HarvestObserver: Send + Sync {
    fn stage_started(&self, _stage: Stage) {}

    fn stage_finished(&self, _stage: Stage) {}

    /// A source's search returned `count` hits (PMIDs for PubMed, DOIs for CrossRef).
    fn identifiers_found(&self, _source: SourceKind, _count: usize) {}

    /// One DOI was collected from a source.
    fn doi_collected(&self, _source: SourceKind, _doi: &Doi) {}

    fn dois_reconciled(&self, _count: usize) {}

    fn record_resolved(&self, _doi: &Doi) {}

    fn lookup_failed(&self, _failure: &HarvestFailure) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl HarvestObserver for NoopObserver {}
