//! # flowquery
//!
//! Query text generation for the process-engine persistence service.
//!
//! Callers describe what they want to read as a flat list of [`FilterOption`]s,
//! an optional [`SearchFields`] free-text search and a list of [`OrderByOption`]s.
//! [`QueryBuilder`] turns those into a WHERE clause and an ORDER BY clause spliced
//! into a base query, with every value bound through a named placeholder.
//!
//! ## Features
//!
//! - **Flat filter expressions**: `AND`, `OR` and parenthesis markers between operands,
//!   with consecutive operands joined by `OR`
//! - **Escaped search**: prefix and word-start LIKE patterns over several fields
//! - **Dialect-aware ordering**: native `NULLS FIRST/LAST` or a CASE emulation
//! - **Stable pagination**: every ORDER BY ends on the entity's identity field
//! - **Last-mile rewriting**: case-insensitive LIKE for databases that lack it
//!
//! ## Example
//!
//! ```ignore
//! use flowquery::{FilterOption, OrderByOption, QueryGenConfig, build_filtered_ordered_query};
//! use std::sync::Arc;
//!
//! let config = Arc::new(QueryGenConfig::load("flowquery.toml")?);
//! let built = build_filtered_ordered_query(
//!     &config,
//!     "SELECT pi.* FROM process_instance pi",
//!     "SProcessInstance",
//!     &[
//!         FilterOption::eq("SProcessInstance", "processDefinitionId", 42i64),
//!         FilterOption::and(),
//!         FilterOption::is_null("SProcessInstance", "endDate"),
//!     ],
//!     None,
//!     &[OrderByOption::desc("SProcessInstance", "startDate")],
//!     false,
//! )?;
//! let sql = flowquery::rewrite_for_dialect(config.dialect, &built.sql);
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod filter;
pub mod generator;
pub mod ident;
pub mod interceptor;
pub mod mapping;
pub mod order;
pub mod order_by;
pub mod param;
pub mod search;

mod sql;

pub use builder::{BuiltQuery, PositionalQuery, QueryBuilder, QueryKind};
pub use config::{Dialect, MissingOrderByPolicy, QueryGenConfig};
pub use error::{QueryGenError, QueryGenResult};
pub use filter::{FilterOperation, FilterOption, FilterValue};
pub use generator::{
    QueryGeneratedFilters, QueryGeneratedSearchTerms, QueryGeneratorForFilters,
    QueryGeneratorForSearchTerm,
};
pub use interceptor::{
    CaseInsensitiveLikeInterceptor, InterceptAction, StatementInterceptor, rewrite_for_dialect,
};
pub use mapping::{AliasMapping, EntityMapping};
pub use order::{NullsPlacement, OrderByOption, OrderDirection};
pub use order_by::OrderByStrategy;
pub use param::{Ordinal, ParamMap, ParamNamer, ParamValue};
pub use search::SearchFields;

use std::sync::Arc;

/// Build a native query over `entity` in one call.
///
/// Equivalent to a [`QueryBuilder`] with one `append_filters` and one
/// `append_order_by_clause` (using `entity` as the tiebreaker entity) followed by
/// `build`.
pub fn build_filtered_ordered_query(
    config: &Arc<QueryGenConfig>,
    base_query: &str,
    entity: &str,
    filters: &[FilterOption],
    search: Option<&SearchFields>,
    order_by: &[OrderByOption],
    word_search: bool,
) -> QueryGenResult<BuiltQuery> {
    let mut builder = QueryBuilder::native(Arc::clone(config), base_query, entity);
    builder
        .append_filters(filters, search, word_search)?
        .append_order_by_clause(order_by, entity)?;
    builder.build()
}
