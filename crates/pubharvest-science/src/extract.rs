use std::borrow::Cow;

use once_cell::sync::Lazy;
use pubharvest_core::models::{BibField, BibRecord};
use regex::Regex;

/// doi.org sometimes serves `ê` double-encoded; this is how it arrives.
const MISENCODED_E_CIRCUMFLEX: &str = "Ãª";

/// One `field={value}` extraction rule.
#[derive(Debug)]
pub struct FieldRule {
    pub field: BibField,
    pattern: Regex,
}

impl FieldRule {
    fn new(field: BibField) -> Self {
        let pattern = Regex::new(&format!(r"{}=\{{([^}}]+)\}}", regex::escape(field.key())))
            .expect("valid regex");
        Self { field, pattern }
    }

    /// Text between the braces of the first `field={...}` occurrence, up to
    /// the first closing brace.
    pub fn apply<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

static FIELD_RULES: Lazy<Vec<FieldRule>> =
    Lazy::new(|| BibField::ALL.iter().copied().map(FieldRule::new).collect());

/// The rule table, one entry per field in output order.
pub fn field_rules() -> &'static [FieldRule] {
    &FIELD_RULES
}

pub fn rule_for(field: BibField) -> &'static FieldRule {
    // BibField::ALL lists the variants in declaration order.
    &FIELD_RULES[field as usize]
}

pub fn repair_encoding(text: &str) -> Cow<'_, str> {
    if text.contains(MISENCODED_E_CIRCUMFLEX) {
        Cow::Owned(text.replace(MISENCODED_E_CIRCUMFLEX, "ê"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Build a record from a bibliography blob. Fields without a match are left
/// unset.
pub fn extract_record(text: &str) -> BibRecord {
    let text = repair_encoding(text);
    let mut record = BibRecord::new();
    for rule in field_rules() {
        if let Some(value) = rule.apply(&text) {
            record.set(rule.field, value);
        }
    }
    record
}
