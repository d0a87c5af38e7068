//! Quote records and the JSON input list.

use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{QuoteReelError, QuoteReelResult};

/// Upper bound on quote length; longer inputs are rejected before rendering.
pub const MAX_QUOTE_CHARS: usize = 600;
/// Upper bound on attribution length.
pub const MAX_AUTHOR_CHARS: usize = 120;

/// One slide's content: a quote and who said it.
///
/// The JSON form uses the field names `quote` and `author`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuoteRecord {
    /// Quote body.
    #[serde(rename = "quote")]
    pub text: String,
    /// Attributed author, rendered with a leading dash.
    #[serde(rename = "author")]
    pub attribution: String,
}

impl QuoteRecord {
    /// Create a record without validating it.
    pub fn new(text: impl Into<String>, attribution: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attribution: attribution.into(),
        }
    }

    /// Check that both fields are non-empty, printable, and within the length bounds.
    pub fn validate(&self, index: usize) -> QuoteReelResult<()> {
        check_field(index, "quote", &self.text, MAX_QUOTE_CHARS)?;
        check_field(index, "author", &self.attribution, MAX_AUTHOR_CHARS)
    }

    /// Attribution line as displayed on the slide.
    pub fn attribution_line(&self) -> String {
        format!("- {}", self.attribution.trim())
    }
}

fn check_field(index: usize, name: &str, value: &str, max_chars: usize) -> QuoteReelResult<()> {
    if value.trim().is_empty() {
        return Err(QuoteReelError::input(format!(
            "record {index}: field '{name}' must be non-empty"
        )));
    }
    if let Some(c) = value
        .chars()
        .find(|c| c.is_control() && *c != '\n' && *c != '\t')
    {
        return Err(QuoteReelError::input(format!(
            "record {index}: field '{name}' contains control character U+{:04X}",
            c as u32
        )));
    }
    let len = value.chars().count();
    if len > max_chars {
        return Err(QuoteReelError::input(format!(
            "record {index}: field '{name}' is {len} characters (max {max_chars})"
        )));
    }
    Ok(())
}

/// Parse and validate a JSON array of `{ "quote": .., "author": .. }` objects.
///
/// Order is preserved; an empty array is rejected.
pub fn parse_quotes(json: &str) -> QuoteReelResult<Vec<QuoteRecord>> {
    let records: Vec<QuoteRecord> = serde_json::from_str(json)
        .map_err(|e| QuoteReelError::input(format!("malformed quote list: {e}")))?;
    validate_records(&records)?;
    Ok(records)
}

/// Read a quote list from a UTF-8 JSON file.
#[tracing::instrument]
pub fn load_quotes(path: &Path) -> QuoteReelResult<Vec<QuoteRecord>> {
    if !path.is_file() {
        return Err(QuoteReelError::input(format!(
            "quote list '{}' does not exist",
            path.display()
        )));
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("read quote list '{}'", path.display()))
        .map_err(|e| QuoteReelError::input(format!("{e:#}")))?;
    let records = parse_quotes(&json)?;
    tracing::info!(count = records.len(), "loaded quotes");
    Ok(records)
}

/// Validate an already materialized record list.
pub fn validate_records(records: &[QuoteRecord]) -> QuoteReelResult<()> {
    if records.is_empty() {
        return Err(QuoteReelError::input("quote list is empty; nothing to render"));
    }
    for (i, r) in records.iter().enumerate() {
        r.validate(i)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/model/quote.rs"]
mod tests;
