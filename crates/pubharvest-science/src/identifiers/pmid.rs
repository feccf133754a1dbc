use std::fmt;

/// PubMed's internal record ID. Only the PubMed collector deals in these;
/// everything downstream works with DOIs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pmid(String);

impl Pmid {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Pmid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Pmid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
