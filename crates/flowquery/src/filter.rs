//! Filter options: one comparison, or one structural marker of a flattened
//! boolean expression.
//!
//! A filter list is an infix token stream, not a tree:
//!
//! ```ignore
//! use flowquery::FilterOption;
//!
//! // state = :p1 AND (priority > :p2 OR priority IS NULL)
//! let filters = vec![
//!     FilterOption::eq("SProcessInstance", "state", 1),
//!     FilterOption::and(),
//!     FilterOption::l_parenthesis(),
//!     FilterOption::gt("SProcessInstance", "priority", 3),
//!     FilterOption::is_null("SProcessInstance", "priority"),
//!     FilterOption::r_parenthesis(),
//! ];
//! ```
//!
//! Two consecutive operands with no explicit marker between them are joined with `OR`.

use crate::param::ParamValue;

/// Operation of a [`FilterOption`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperation {
    Equals,
    Different,
    Like,
    Greater,
    GreaterOrEquals,
    Less,
    LessOrEquals,
    Between,
    In,
    /// Structural: explicit AND between two operands
    And,
    /// Structural: explicit OR between two operands (same as the implicit join)
    Or,
    /// Structural: opening parenthesis
    LParenthesis,
    /// Structural: closing parenthesis
    RParenthesis,
}

impl FilterOperation {
    /// Structural markers carry no entity, field or value.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            FilterOperation::And
                | FilterOperation::Or
                | FilterOperation::LParenthesis
                | FilterOperation::RParenthesis
        )
    }

    /// SQL comparison operator for the single-value operations.
    pub(crate) fn comparison_operator(self) -> Option<&'static str> {
        match self {
            FilterOperation::Equals => Some("="),
            FilterOperation::Different => Some("!="),
            FilterOperation::Greater => Some(">"),
            FilterOperation::GreaterOrEquals => Some(">="),
            FilterOperation::Less => Some("<"),
            FilterOperation::LessOrEquals => Some("<="),
            _ => None,
        }
    }
}

/// Operand(s) of a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Structural markers
    Absent,
    Single(ParamValue),
    /// `BETWEEN from AND to`
    Range(ParamValue, ParamValue),
    /// `IN (...)`
    List(Vec<ParamValue>),
}

/// One element of a flattened filter expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOption {
    entity: Option<String>,
    field: Option<String>,
    operation: FilterOperation,
    value: FilterValue,
}

impl FilterOption {
    /// Create a filter from its raw parts.
    ///
    /// No arity check happens here; the generator rejects mismatched operation/value
    /// shapes before any text is emitted.
    pub fn new(
        entity: impl Into<String>,
        field: impl Into<String>,
        operation: FilterOperation,
        value: FilterValue,
    ) -> Self {
        Self {
            entity: Some(entity.into()),
            field: Some(field.into()),
            operation,
            value,
        }
    }

    fn single(
        entity: impl Into<String>,
        field: impl Into<String>,
        operation: FilterOperation,
        value: impl Into<ParamValue>,
    ) -> Self {
        Self::new(entity, field, operation, FilterValue::Single(value.into()))
    }

    fn marker(operation: FilterOperation) -> Self {
        Self {
            entity: None,
            field: None,
            operation,
            value: FilterValue::Absent,
        }
    }

    /// field = value (`IS NULL` when the value is null)
    pub fn eq(entity: impl Into<String>, field: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self::single(entity, field, FilterOperation::Equals, value)
    }

    /// field IS NULL
    pub fn is_null(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::single(entity, field, FilterOperation::Equals, ParamValue::Null)
    }

    /// field != value
    pub fn ne(entity: impl Into<String>, field: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self::single(entity, field, FilterOperation::Different, value)
    }

    /// field LIKE %value% (value is escaped)
    pub fn like(entity: impl Into<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(entity, field, FilterOperation::Like, ParamValue::Text(value.into()))
    }

    /// field > value
    pub fn gt(entity: impl Into<String>, field: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self::single(entity, field, FilterOperation::Greater, value)
    }

    /// field >= value
    pub fn gte(entity: impl Into<String>, field: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self::single(entity, field, FilterOperation::GreaterOrEquals, value)
    }

    /// field < value
    pub fn lt(entity: impl Into<String>, field: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self::single(entity, field, FilterOperation::Less, value)
    }

    /// field <= value
    pub fn lte(entity: impl Into<String>, field: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self::single(entity, field, FilterOperation::LessOrEquals, value)
    }

    /// from <= field AND field <= to
    pub fn between(
        entity: impl Into<String>,
        field: impl Into<String>,
        from: impl Into<ParamValue>,
        to: impl Into<ParamValue>,
    ) -> Self {
        Self::new(
            entity,
            field,
            FilterOperation::Between,
            FilterValue::Range(from.into(), to.into()),
        )
    }

    /// field IN (values), bound as one list parameter
    pub fn in_list<T: Into<ParamValue>>(
        entity: impl Into<String>,
        field: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        Self::new(
            entity,
            field,
            FilterOperation::In,
            FilterValue::List(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Explicit AND marker.
    pub fn and() -> Self {
        Self::marker(FilterOperation::And)
    }

    /// Explicit OR marker.
    pub fn or() -> Self {
        Self::marker(FilterOperation::Or)
    }

    /// `(`
    pub fn l_parenthesis() -> Self {
        Self::marker(FilterOperation::LParenthesis)
    }

    /// `)`
    pub fn r_parenthesis() -> Self {
        Self::marker(FilterOperation::RParenthesis)
    }

    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn operation(&self) -> FilterOperation {
        self.operation
    }

    pub fn value(&self) -> &FilterValue {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_carry_nothing() {
        for marker in [
            FilterOption::and(),
            FilterOption::or(),
            FilterOption::l_parenthesis(),
            FilterOption::r_parenthesis(),
        ] {
            assert!(marker.operation().is_structural());
            assert!(marker.entity().is_none());
            assert!(marker.field().is_none());
            assert_eq!(marker.value(), &FilterValue::Absent);
        }
    }

    #[test]
    fn is_null_is_eq_with_null() {
        let f = FilterOption::is_null("SUser", "manager");
        assert_eq!(f.operation(), FilterOperation::Equals);
        assert_eq!(f.value(), &FilterValue::Single(ParamValue::Null));
    }

    #[test]
    fn in_list_collects_values() {
        let f = FilterOption::in_list("SUser", "id", [1i64, 2, 3]);
        assert_eq!(
            f.value(),
            &FilterValue::List(vec![1i64.into(), 2i64.into(), 3i64.into()])
        );
    }

    #[test]
    fn comparison_operators() {
        assert_eq!(FilterOperation::Different.comparison_operator(), Some("!="));
        assert_eq!(FilterOperation::LessOrEquals.comparison_operator(), Some("<="));
        assert_eq!(FilterOperation::Like.comparison_operator(), None);
    }
}
