//! Identifier validation for aliases and field names.
//!
//! Field references are rendered into query text verbatim (identifiers cannot be
//! bound as parameters), so every alias and field name is checked before use:
//!
//! - An alias is a single segment matching `[A-Za-z_][A-Za-z0-9_$]*`
//! - A field name is one or more such segments joined by `.` (embedded components,
//!   e.g. `address.city`)

use crate::error::{QueryGenError, QueryGenResult};

fn check_segment(whole: &str, seg: &str) -> QueryGenResult<()> {
    let mut chars = seg.chars();
    let Some(first) = chars.next() else {
        return Err(QueryGenError::InvalidIdentifier(format!(
            "empty segment in '{whole}'"
        )));
    };
    if !(first == '_' || first.is_ascii_alphabetic()) {
        return Err(QueryGenError::InvalidIdentifier(format!(
            "'{whole}' has invalid start character '{first}'"
        )));
    }
    if let Some(c) = chars.find(|&c| !(c == '_' || c == '$' || c.is_ascii_alphanumeric())) {
        return Err(QueryGenError::InvalidIdentifier(format!(
            "'{whole}' has invalid character '{c}'"
        )));
    }
    Ok(())
}

/// Validate a table alias (single identifier segment).
pub fn validate_alias(alias: &str) -> QueryGenResult<()> {
    if alias.contains('.') {
        return Err(QueryGenError::InvalidIdentifier(format!(
            "alias '{alias}' must not be dotted"
        )));
    }
    check_segment(alias, alias)
}

/// Validate a field name, allowing dotted component paths.
pub fn validate_field(field: &str) -> QueryGenResult<()> {
    if field.is_empty() {
        return Err(QueryGenError::InvalidIdentifier(
            "field name cannot be empty".to_string(),
        ));
    }
    for seg in field.split('.') {
        check_segment(field, seg)?;
    }
    Ok(())
}

/// Render `alias.field`.
pub fn qualify(alias: &str, field: &str) -> String {
    let mut out = String::with_capacity(alias.len() + field.len() + 1);
    out.push_str(alias);
    out.push('.');
    out.push_str(field);
    out
}
