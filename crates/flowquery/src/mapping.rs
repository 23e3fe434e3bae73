//! Entity → table alias mapping.
//!
//! Built once at startup (usually from the `[entities]` section of the
//! configuration) and only read afterwards.

use crate::error::{QueryGenError, QueryGenResult};
use crate::ident::{qualify, validate_alias, validate_field};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

fn default_id_field() -> String {
    "id".to_string()
}

/// How one entity appears in query text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityMapping {
    /// Query-time table alias, e.g. `pi` for `SProcessInstance`.
    pub alias: String,
    /// Identity field used as the pagination tiebreaker.
    #[serde(default = "default_id_field")]
    pub id_field: String,
    /// Known fields. When set, references to other fields are rejected.
    #[serde(default)]
    pub fields: Option<BTreeSet<String>>,
}

impl EntityMapping {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            id_field: default_id_field(),
            fields: None,
        }
    }

    /// Override the identity field (default `id`).
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Restrict the entity to a known set of fields.
    pub fn fields<F: Into<String>>(mut self, fields: impl IntoIterator<Item = F>) -> Self {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// Entity name → [`EntityMapping`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AliasMapping {
    entities: BTreeMap<String, EntityMapping>,
}

impl AliasMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `entity` to `alias` with the default identity field.
    pub fn with_entity(self, entity: impl Into<String>, alias: impl Into<String>) -> Self {
        self.with_mapping(entity, EntityMapping::new(alias))
    }

    pub fn with_mapping(mut self, entity: impl Into<String>, mapping: EntityMapping) -> Self {
        self.entities.insert(entity.into(), mapping);
        self
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Look up an entity; an unmapped entity is a hard failure.
    pub fn get(&self, entity: &str) -> QueryGenResult<&EntityMapping> {
        self.entities
            .get(entity)
            .ok_or_else(|| QueryGenError::UnmappedEntity(entity.to_string()))
    }

    /// Alias of `entity`.
    pub fn alias(&self, entity: &str) -> QueryGenResult<&str> {
        self.get(entity).map(|m| m.alias.as_str())
    }

    /// Render `alias.field` after checking the field name (and, when the entity
    /// declares them, that the field is known).
    pub fn qualified_field(&self, entity: &str, field: &str) -> QueryGenResult<String> {
        let mapping = self.get(entity)?;
        validate_field(field)?;
        if let Some(known) = &mapping.fields
            && !known.contains(field)
        {
            return Err(QueryGenError::unknown_field(entity, field));
        }
        Ok(qualify(&mapping.alias, field))
    }

    /// `alias.id_field` of `entity`.
    pub fn qualified_id_field(&self, entity: &str) -> QueryGenResult<String> {
        let mapping = self.get(entity)?;
        Ok(qualify(&mapping.alias, &mapping.id_field))
    }

    /// Check every alias and identity field.
    pub fn validate(&self) -> QueryGenResult<()> {
        for (entity, mapping) in &self.entities {
            validate_alias(&mapping.alias).map_err(|e| {
                QueryGenError::Config(format!("entity '{entity}': {e}"))
            })?;
            validate_field(&mapping.id_field).map_err(|e| {
                QueryGenError::Config(format!("entity '{entity}': {e}"))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> AliasMapping {
        AliasMapping::new()
            .with_entity("TestObject", "testObj")
            .with_mapping(
                "SUser",
                EntityMapping::new("user_")
                    .id_field("tenantId")
                    .fields(["userName", "firstName"]),
            )
    }

    #[test]
    fn qualifies_fields() {
        let m = mapping();
        assert_eq!(m.qualified_field("TestObject", "age").unwrap(), "testObj.age");
        assert_eq!(m.qualified_id_field("TestObject").unwrap(), "testObj.id");
        assert_eq!(m.qualified_id_field("SUser").unwrap(), "user_.tenantId");
    }

    #[test]
    fn unmapped_entity_fails() {
        let err = mapping().alias("Nope").unwrap_err();
        assert!(matches!(err, QueryGenError::UnmappedEntity(ref e) if e == "Nope"));
        assert!(err.is_mapping_error());
    }

    #[test]
    fn unknown_field_fails_when_fields_declared() {
        let err = mapping().qualified_field("SUser", "password").unwrap_err();
        assert!(matches!(err, QueryGenError::UnknownField { .. }));
        assert!(mapping().qualified_field("SUser", "userName").is_ok());
    }

    #[test]
    fn validate_rejects_bad_alias() {
        let m = AliasMapping::new().with_entity("X", "bad alias");
        assert!(matches!(m.validate(), Err(QueryGenError::Config(_))));
        assert!(mapping().validate().is_ok());
    }
}
