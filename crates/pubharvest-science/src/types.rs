use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScienceError};

/// The two catalogs DOIs are collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    PubMed,
    CrossRef,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PubMed => "PubMed",
            Self::CrossRef => "CrossRef",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Publication dates in `[from, until_exclusive)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicationWindow {
    pub from: NaiveDate,
    pub until_exclusive: NaiveDate,
}

impl PublicationWindow {
    /// `[year-01-01, (year+1)-01-01)`
    pub fn calendar_year(year: i32) -> Result<Self> {
        let from = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(ScienceError::InvalidYear(year))?;
        let until_exclusive = year
            .checked_add(1)
            .and_then(|next| NaiveDate::from_ymd_opt(next, 1, 1))
            .ok_or(ScienceError::InvalidYear(year))?;
        Ok(Self {
            from,
            until_exclusive,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date < self.until_exclusive
    }

    /// Last day inside the window, for APIs whose upper bound is inclusive.
    pub fn last_day(&self) -> NaiveDate {
        self.until_exclusive.pred_opt().unwrap_or(self.from)
    }
}

/// Where in the pipeline a lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "stage", content = "source")]
pub enum FailureStage {
    Search(SourceKind),
    Detail(SourceKind),
    Resolve,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search(source) => write!(f, "{source} search"),
            Self::Detail(source) => write!(f, "{source} detail lookup"),
            Self::Resolve => f.write_str("DOI resolution"),
        }
    }
}

/// A lookup that contributed nothing. The run carries on without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestFailure {
    #[serde(flatten)]
    pub stage: FailureStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub message: String,
}

impl HarvestFailure {
    pub fn new(stage: FailureStage, identifier: Option<String>, message: impl Into<String>) -> Self {
        Self {
            stage,
            identifier,
            message: message.into(),
        }
    }
}

impl fmt::Display for HarvestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identifier {
            Some(id) => write!(f, "{} failed for {id}: {}", self.stage, self.message),
            None => write!(f, "{} failed: {}", self.stage, self.message),
        }
    }
}
