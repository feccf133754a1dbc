pub mod doi;
pub mod pmid;

pub use doi::Doi;
pub use pmid::Pmid;
