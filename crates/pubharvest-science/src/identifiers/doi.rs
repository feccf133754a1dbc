use std::fmt;

use serde::{Deserialize, Serialize};

/// A DOI exactly as a source reported it.
///
/// Equality is case-sensitive and no prefix is stripped: `10.1/ABC` and
/// `10.1/abc` are different values here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Doi(String);

impl Doi {
    pub fn new(doi: impl Into<String>) -> Self {
        Self(doi.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Pull the DOI out of a PubMed ELocationID value such as `doi: 10.1/xyz`:
    /// the text is split on single spaces and the second token is taken.
    pub fn from_elocation(elocation: &str) -> Option<Self> {
        elocation
            .split(' ')
            .nth(1)
            .filter(|token| !token.is_empty())
            .map(Self::new)
    }
}

impl From<&str> for Doi {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
