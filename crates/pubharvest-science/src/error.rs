use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScienceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {0}: {1}")]
    ApiError(String, String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("year out of range: {0}")]
    InvalidYear(i32),
}

impl From<quick_xml::Error> for ScienceError {
    fn from(e: quick_xml::Error) -> Self {
        ScienceError::Xml(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ScienceError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        ScienceError::Xml(e.to_string())
    }
}

impl From<quick_xml::DeError> for ScienceError {
    fn from(e: quick_xml::DeError) -> Self {
        ScienceError::Xml(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScienceError>;
