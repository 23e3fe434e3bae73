//! Process-wide query generation settings.
//!
//! Loaded once at startup, then shared read-only (typically behind an `Arc`) by
//! every query-building call.
//!
//! ```toml
//! dialect = "postgres"
//! escape_char = "§"
//! missing_order_by = "warning"
//! word_search_exclusions = ["SArchivedFlowNodeInstance"]
//!
//! [entities.SProcessInstance]
//! alias = "pi"
//!
//! [entities.SUser]
//! alias = "user_"
//! fields = ["userName", "firstName", "lastName"]
//! ```

use crate::error::{QueryGenError, QueryGenResult};
use crate::ident::validate_alias;
use crate::interceptor::CaseInsensitiveLikeInterceptor;
use crate::mapping::AliasMapping;
use crate::order_by::OrderByStrategy;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    Oracle,
    SqlServer,
    MySql,
    H2,
}

impl Dialect {
    /// ORDER BY strategy used unless the configuration overrides it.
    pub fn order_by_strategy(self) -> OrderByStrategy {
        match self {
            Dialect::Postgres | Dialect::Oracle | Dialect::H2 => OrderByStrategy::Native,
            Dialect::SqlServer | Dialect::MySql => OrderByStrategy::CaseWhenNulls,
        }
    }

    /// `LIKE` is case-sensitive here and must be rewritten with `UPPER(..)`.
    pub fn requires_like_rewrite(self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Statement interceptor for this dialect, if it needs one.
    pub fn interceptor(self) -> Option<CaseInsensitiveLikeInterceptor> {
        self.requires_like_rewrite()
            .then(CaseInsensitiveLikeInterceptor::new)
    }
}

/// What to do when a built query has no ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingOrderByPolicy {
    /// Fail the query.
    Strict,
    /// Log a warning and proceed.
    Warning,
    /// Proceed silently.
    #[default]
    None,
}

fn default_escape_char() -> char {
    '§'
}

fn default_boolean_constants() -> BTreeMap<String, bool> {
    BTreeMap::from([("falseValue".to_string(), false), ("trueValue".to_string(), true)])
}

fn default_log_sql_max_length() -> Option<usize> {
    Some(200)
}

/// Query generation configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryGenConfig {
    #[serde(default)]
    pub dialect: Dialect,
    /// Overrides the dialect's ORDER BY strategy.
    #[serde(default)]
    pub order_by_strategy: Option<OrderByStrategy>,
    /// Escape character for LIKE patterns.
    #[serde(default = "default_escape_char")]
    pub escape_char: char,
    #[serde(default)]
    pub missing_order_by: MissingOrderByPolicy,
    /// Entities for which word search is never expanded.
    #[serde(default)]
    pub word_search_exclusions: BTreeSet<String>,
    /// Named boolean constants bound on native queries (`:trueValue`, `:falseValue`).
    #[serde(default = "default_boolean_constants")]
    pub boolean_constants: BTreeMap<String, bool>,
    /// Truncate logged SQL (in bytes). `None` disables truncation.
    #[serde(default = "default_log_sql_max_length")]
    pub log_sql_max_length: Option<usize>,
    #[serde(default)]
    pub entities: AliasMapping,
}

impl Default for QueryGenConfig {
    fn default() -> Self {
        Self::new(AliasMapping::default())
    }
}

impl QueryGenConfig {
    /// Create a configuration with defaults around an alias mapping.
    pub fn new(entities: AliasMapping) -> Self {
        Self {
            dialect: Dialect::default(),
            order_by_strategy: None,
            escape_char: default_escape_char(),
            missing_order_by: MissingOrderByPolicy::default(),
            word_search_exclusions: BTreeSet::new(),
            boolean_constants: default_boolean_constants(),
            log_sql_max_length: default_log_sql_max_length(),
            entities,
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> QueryGenResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> QueryGenResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            QueryGenError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw).map_err(|e| match e {
            QueryGenError::Config(msg) => {
                QueryGenError::Config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Set the target dialect.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Force an ORDER BY strategy regardless of dialect.
    pub fn with_order_by_strategy(mut self, strategy: OrderByStrategy) -> Self {
        self.order_by_strategy = Some(strategy);
        self
    }

    /// Set the LIKE escape character.
    pub fn escape_char(mut self, c: char) -> Self {
        self.escape_char = c;
        self
    }

    /// Set the missing ORDER BY policy.
    pub fn missing_order_by(mut self, policy: MissingOrderByPolicy) -> Self {
        self.missing_order_by = policy;
        self
    }

    /// Never expand word search for `entity`.
    pub fn exclude_from_word_search(mut self, entity: impl Into<String>) -> Self {
        self.word_search_exclusions.insert(entity.into());
        self
    }

    /// Register a named boolean constant for native queries.
    pub fn boolean_constant(mut self, name: impl Into<String>, value: bool) -> Self {
        self.boolean_constants.insert(name.into(), value);
        self
    }

    /// Set maximum logged SQL length.
    pub fn log_sql_max_length(mut self, len: usize) -> Self {
        self.log_sql_max_length = Some(len);
        self
    }

    /// Log SQL without truncation.
    pub fn no_log_truncate(mut self) -> Self {
        self.log_sql_max_length = None;
        self
    }

    pub fn mapping(&self) -> &AliasMapping {
        &self.entities
    }

    /// ORDER BY strategy in effect.
    pub fn effective_order_by_strategy(&self) -> OrderByStrategy {
        self.order_by_strategy
            .unwrap_or_else(|| self.dialect.order_by_strategy())
    }

    /// Whether word search applies to `entity` when the caller asks for it.
    pub fn word_search_enabled(&self, entity: &str, requested: bool) -> bool {
        requested && !self.word_search_exclusions.contains(entity)
    }

    /// Check the escape character, constant names and entity mapping.
    pub fn validate(&self) -> QueryGenResult<()> {
        check_escape_char(self.escape_char)?;
        for name in self.boolean_constants.keys() {
            validate_alias(name)
                .map_err(|e| QueryGenError::Config(format!("boolean constant: {e}")))?;
        }
        self.entities.validate()
    }
}

/// Reject escape characters that cannot appear in `ESCAPE '<c>'` or that
/// collide with LIKE wildcards.
pub fn check_escape_char(c: char) -> QueryGenResult<()> {
    if matches!(c, '%' | '_' | '\'' | '\\') || c.is_whitespace() {
        return Err(QueryGenError::Config(format!(
            "escape_char '{c}' is not usable in an ESCAPE clause"
        )));
    }
    Ok(())
}
