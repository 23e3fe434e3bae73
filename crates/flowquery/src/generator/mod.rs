//! Clause generators.
//!
//! Each generator turns one kind of request into a clause fragment (without the
//! `WHERE` keyword or the outer parentheses) plus its named parameters.

mod filters;
mod search;

pub use filters::{QueryGeneratedFilters, QueryGeneratorForFilters, validate_filters};
pub use search::{
    QueryGeneratedSearchTerms, QueryGeneratorForSearchTerm, escape_term, starts_with_pattern,
    word_start_pattern,
};
