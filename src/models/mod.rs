//! Data models for the catalog

pub mod author;
pub mod book;
pub mod category;

use chrono::NaiveDate;

// Re-export commonly used types
pub use author::{Author, AuthorChanges, AuthorPayload, AuthorWithBooks};
pub use book::{Book, BookChanges, BookDetails, BookPayload, BookRules};
pub use category::{Category, CategoryChanges, CategoryPayload, CategoryWithBooks};

/// Trimmed text, with blank input treated as absent
pub(crate) fn trimmed(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Trimmed nullable text; blank input clears the field
pub(crate) fn trimmed_nullable(raw: Option<Option<String>>) -> Option<Option<String>> {
    raw.map(trimmed)
}

/// Parse an ISO `YYYY-MM-DD` date
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}
