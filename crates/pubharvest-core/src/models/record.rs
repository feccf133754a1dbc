use std::fmt;

use serde::{Deserialize, Serialize};

/// The fixed set of fields pulled out of a resolved bibliography entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BibField {
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "volume")]
    Volume,
    #[serde(rename = "ISSN")]
    Issn,
    #[serde(rename = "url")]
    Url,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "journal")]
    Journal,
    #[serde(rename = "publisher")]
    Publisher,
    #[serde(rename = "author")]
    Author,
    #[serde(rename = "year")]
    Year,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "pages")]
    Pages,
}

impl BibField {
    /// Every field, in output order.
    pub const ALL: [BibField; 11] = [
        BibField::Title,
        BibField::Volume,
        BibField::Issn,
        BibField::Url,
        BibField::Number,
        BibField::Journal,
        BibField::Publisher,
        BibField::Author,
        BibField::Year,
        BibField::Month,
        BibField::Pages,
    ];

    /// Key as it appears in BibTeX text and in the exported file.
    pub fn key(&self) -> &'static str {
        match self {
            BibField::Title => "title",
            BibField::Volume => "volume",
            BibField::Issn => "ISSN",
            BibField::Url => "url",
            BibField::Number => "number",
            BibField::Journal => "journal",
            BibField::Publisher => "publisher",
            BibField::Author => "author",
            BibField::Year => "year",
            BibField::Month => "month",
            BibField::Pages => "pages",
        }
    }
}

impl fmt::Display for BibField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One publication's bibliographic metadata. Fields that could not be
/// extracted are left out of the serialized form entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,

    #[serde(rename = "ISSN", default, skip_serializing_if = "Option::is_none")]
    pub issn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
}

impl BibRecord {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, field: BibField) -> &Option<String> {
        match field {
            BibField::Title => &self.title,
            BibField::Volume => &self.volume,
            BibField::Issn => &self.issn,
            BibField::Url => &self.url,
            BibField::Number => &self.number,
            BibField::Journal => &self.journal,
            BibField::Publisher => &self.publisher,
            BibField::Author => &self.author,
            BibField::Year => &self.year,
            BibField::Month => &self.month,
            BibField::Pages => &self.pages,
        }
    }

    fn slot_mut(&mut self, field: BibField) -> &mut Option<String> {
        match field {
            BibField::Title => &mut self.title,
            BibField::Volume => &mut self.volume,
            BibField::Issn => &mut self.issn,
            BibField::Url => &mut self.url,
            BibField::Number => &mut self.number,
            BibField::Journal => &mut self.journal,
            BibField::Publisher => &mut self.publisher,
            BibField::Author => &mut self.author,
            BibField::Year => &mut self.year,
            BibField::Month => &mut self.month,
            BibField::Pages => &mut self.pages,
        }
    }

    pub fn get(&self, field: BibField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: BibField, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    /// Populated fields, in output order.
    pub fn fields(&self) -> impl Iterator<Item = (BibField, &str)> + '_ {
        BibField::ALL
            .iter()
            .filter_map(|field| self.get(*field).map(|value| (*field, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.fields().next().is_none()
    }
}
