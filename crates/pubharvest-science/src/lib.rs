//! pubharvest science — PubMed and CrossRef DOI collection, reconciliation,
//! DOI resolution and BibTeX field extraction.

pub mod error;
pub mod http;
pub mod identifiers;
pub mod types;
pub mod observer;
pub mod sources;
pub mod reconcile;
pub mod extract;
pub mod resolve;
pub mod pipeline;

pub use error::{Result, ScienceError};
pub use identifiers::{Doi, Pmid};
pub use observer::{HarvestObserver, NoopObserver, Stage};
pub use pipeline::{HarvestReport, Harvester};
pub use reconcile::{DoiSet, reconcile};
pub use types::{FailureStage, HarvestFailure, PublicationWindow, SourceKind};
