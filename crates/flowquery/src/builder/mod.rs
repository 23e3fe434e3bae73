//! Query assembler.
//!
//! [`QueryBuilder`] wraps a base query skeleton and extends it with filter, search
//! and ORDER BY clauses produced by the generators.
//!
//! # Example
//!
//! ```ignore
//! use flowquery::{FilterOption, OrderByOption, QueryBuilder, QueryGenConfig, QueryKind};
//! use std::sync::Arc;
//!
//! let config = Arc::new(QueryGenConfig::new(mapping));
//! let mut qb = QueryBuilder::new(config, "SELECT pi.* FROM process_instance pi", "SProcessInstance", QueryKind::Native);
//! qb.append_filters(&[FilterOption::eq("SProcessInstance", "name", "Pool")], None, false)?
//!     .append_order_by_clause(&[OrderByOption::asc("SProcessInstance", "name")], "SProcessInstance")?;
//! let built = qb.build()?;
//! ```

mod native;


pub use native::PositionalQuery;

use crate::config::{MissingOrderByPolicy, QueryGenConfig, check_escape_char};
use crate::error::{QueryGenError, QueryGenResult};
use crate::filter::FilterOption;
use crate::generator::{QueryGeneratorForFilters, QueryGeneratorForSearchTerm};
use crate::order::OrderByOption;
use crate::param::{ParamMap, ParamNamer};
use crate::search::SearchFields;
use crate::sql::{
    condition_insert_position, has_top_level_keyword, has_top_level_order_by,
    has_top_level_set_operator, order_by_insert_position, splice, top_level_keyword_end,
    truncate_for_log,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// How the built query is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Raw SQL bound through a prepared statement; boolean constants are bound by name.
    Native,
    /// Entity query language; every parameter is bound uniformly.
    Object,
}

impl QueryKind {
    fn as_str(self) -> &'static str {
        match self {
            QueryKind::Native => "native",
            QueryKind::Object => "object",
        }
    }
}

/// Final query text and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: ParamMap,
    pub kind: QueryKind,
}

impl BuiltQuery {
    /// Convert `:name` placeholders to `$n` for direct execution.
    pub fn to_positional(&self) -> QueryGenResult<PositionalQuery> {
        native::to_positional(&self.sql, &self.params)
    }
}

/// Extends a base query with generated clauses.
///
/// One builder is used per query-building pass. Parameter numbering continues
/// across calls, so appending filters twice never reuses a name.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    config: Arc<QueryGenConfig>,
    entity: String,
    kind: QueryKind,
    query: String,
    params: ParamMap,
    filter_names: ParamNamer,
    search_names: ParamNamer,
    changed: bool,
}

impl QueryBuilder {
    /// Wrap `base_query`, a query over `entity`.
    ///
    /// The skeleton must be a single SELECT. Conditions cannot be added to a
    /// top-level `UNION`, `INTERSECT` or `EXCEPT`; wrap the compound in a
    /// sub-select instead. Sort keys are appended after the last branch and
    /// apply to the whole result.
    pub fn new(
        config: Arc<QueryGenConfig>,
        base_query: impl Into<String>,
        entity: impl Into<String>,
        kind: QueryKind,
    ) -> Self {
        Self {
            config,
            entity: entity.into(),
            kind,
            query: base_query.into(),
            params: ParamMap::new(),
            filter_names: ParamNamer::filters(),
            search_names: ParamNamer::search_terms(),
            changed: false,
        }
    }

    /// Builder for raw SQL execution.
    pub fn native(
        config: Arc<QueryGenConfig>,
        base_query: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        Self::new(config, base_query, entity, QueryKind::Native)
    }

    /// Builder for entity-query execution.
    pub fn object(
        config: Arc<QueryGenConfig>,
        base_query: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        Self::new(config, base_query, entity, QueryKind::Object)
    }

    /// Add filter and search conditions.
    ///
    /// Both clauses are generated before the query is touched; on error the builder
    /// is left unchanged. Fields already constrained by a filter are not searched.
    /// An empty filter list with no search is a no-op. An existing WHERE whose
    /// predicate has a top-level OR is parenthesised before the new conjunct.
    pub fn append_filters(
        &mut self,
        filters: &[FilterOption],
        search: Option<&SearchFields>,
        word_search: bool,
    ) -> QueryGenResult<&mut Self> {
        check_escape_char(self.config.escape_char)?;
        let mapping = self.config.mapping();
        let mut filter_names = self.filter_names.clone();
        let mut search_names = self.search_names.clone();

        let filters = QueryGeneratorForFilters::new(mapping, self.config.escape_char)
            .generate_with(filters, &mut filter_names)?;

        let mut searched = None;
        if let Some(search) = search.filter(|s| !s.is_empty()) {
            let mut fields = BTreeSet::new();
            for (entity, names) in search.fields() {
                for name in names {
                    fields.insert(mapping.qualified_field(entity, name)?);
                }
            }
            fields.retain(|f| !filters.fields.contains(f));

            let word_search = self.config.word_search_enabled(&self.entity, word_search);
            let generated = QueryGeneratorForSearchTerm::new(self.config.escape_char)
                .generate_with(&fields, search.terms(), word_search, &mut search_names);
            if !generated.is_empty() {
                searched = Some(generated);
            }
        }

        let condition = match (filters.is_empty(), &searched) {
            (true, None) => return Ok(self),
            (false, None) => format!("({})", filters.clause),
            (true, Some(s)) => format!("({})", s.clause),
            (false, Some(s)) => format!("({}) AND ({})", filters.clause, s.clause),
        };

        if has_top_level_set_operator(&self.query) {
            return Err(QueryGenError::validation(
                "cannot add conditions to a compound query (UNION/INTERSECT/EXCEPT); wrap it in a sub-select",
            ));
        }

        let pos = condition_insert_position(&self.query);
        self.query = match top_level_keyword_end(&self.query[..pos], "WHERE") {
            Some(end) => {
                // An existing top-level OR must not absorb the new conjunct.
                let predicate = self.query[end..pos].trim();
                let clause = if predicate.is_empty() {
                    condition
                } else if has_top_level_keyword(predicate, "OR") {
                    format!("({predicate}) AND {condition}")
                } else {
                    format!("{predicate} AND {condition}")
                };
                let rest = format!("{}{}", &self.query[..end], &self.query[pos..]);
                splice(&rest, end, &clause)
            }
            None => splice(&self.query, pos, &format!("WHERE {condition}")),
        };

        self.params.extend(filters.params);
        if let Some(searched) = searched {
            self.params.extend(searched.params);
        }
        self.filter_names = filter_names;
        self.search_names = search_names;
        self.changed = true;
        Ok(self)
    }

    /// Add sort keys, followed by a tiebreaker on `default_entity`'s identity field.
    ///
    /// `default_entity` is resolved even when `options` is empty, so an unmapped
    /// entity always fails. An empty list otherwise leaves the query untouched.
    pub fn append_order_by_clause(
        &mut self,
        options: &[OrderByOption],
        default_entity: &str,
    ) -> QueryGenResult<&mut Self> {
        let mapping = self.config.mapping();
        let id_field = mapping.qualified_id_field(default_entity)?;
        if options.is_empty() {
            return Ok(self);
        }

        let strategy = self.config.effective_order_by_strategy();
        let mut keys = String::new();
        let mut sorted_on_id = false;
        for (idx, option) in options.iter().enumerate() {
            let field = mapping.qualified_field(option.entity(), option.field())?;
            if idx > 0 {
                keys.push_str(", ");
            }
            strategy.append_order_by(&mut keys, &field, option.direction());
            sorted_on_id |= field == id_field;
        }
        if !sorted_on_id {
            keys.push_str(", ");
            keys.push_str(&id_field);
            keys.push_str(" ASC");
        }

        let pos = order_by_insert_position(&self.query);
        self.query = if has_top_level_order_by(&self.query[..pos]) {
            let head = self.query[..pos].trim_end();
            let tail = self.query[pos..].trim_start();
            let mut query = format!("{head}, {keys}");
            if !tail.is_empty() {
                query.push(' ');
                query.push_str(tail);
            }
            query
        } else {
            splice(&self.query, pos, &format!("ORDER BY {keys}"))
        };
        self.changed = true;
        Ok(self)
    }

    /// Whether any clause has been appended.
    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// Current query text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Parameters generated so far.
    pub fn params(&self) -> &ParamMap {
        &self.params
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// Finish the query.
    ///
    /// Applies the missing ORDER BY policy and, for native queries, binds the
    /// configured boolean constants referenced by the text.
    pub fn build(&self) -> QueryGenResult<BuiltQuery> {
        if !has_top_level_order_by(&self.query) {
            self.handle_missing_order_by()?;
        }

        let mut params = self.params.clone();
        if self.kind == QueryKind::Native {
            native::bind_boolean_constants(&self.query, &self.config.boolean_constants, &mut params);
        }

        tracing::debug!(
            target: "flowquery.sql",
            kind = self.kind.as_str(),
            param_count = params.len(),
            sql = %truncate_for_log(&self.query, self.config.log_sql_max_length),
            "query built"
        );

        Ok(BuiltQuery {
            sql: self.query.clone(),
            params,
            kind: self.kind,
        })
    }

    fn handle_missing_order_by(&self) -> QueryGenResult<()> {
        match self.config.missing_order_by {
            MissingOrderByPolicy::None => Ok(()),
            MissingOrderByPolicy::Warning => {
                tracing::warn!(
                    target: "flowquery.sql",
                    entity = %self.entity,
                    sql = %truncate_for_log(&self.query, self.config.log_sql_max_length),
                    "query has no ORDER BY clause"
                );
                Ok(())
            }
            MissingOrderByPolicy::Strict => Err(QueryGenError::MissingOrderBy(
                truncate_for_log(&self.query, self.config.log_sql_max_length).into_owned(),
            )),
        }
    }
}
