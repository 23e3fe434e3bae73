//! Sort keys.

/// Direction of a sort key, with optional NULL placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderDirection {
    Asc,
    Desc,
    AscNullsFirst,
    AscNullsLast,
    DescNullsFirst,
    DescNullsLast,
}

/// Where NULLs go relative to non-null values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsPlacement {
    First,
    Last,
}

impl OrderDirection {
    /// `true` for the descending variants.
    pub fn is_descending(self) -> bool {
        matches!(
            self,
            OrderDirection::Desc | OrderDirection::DescNullsFirst | OrderDirection::DescNullsLast
        )
    }

    /// `ASC` or `DESC`.
    pub fn keyword(self) -> &'static str {
        if self.is_descending() { "DESC" } else { "ASC" }
    }

    /// Explicit NULL placement, if any.
    pub fn nulls(self) -> Option<NullsPlacement> {
        match self {
            OrderDirection::Asc | OrderDirection::Desc => None,
            OrderDirection::AscNullsFirst | OrderDirection::DescNullsFirst => {
                Some(NullsPlacement::First)
            }
            OrderDirection::AscNullsLast | OrderDirection::DescNullsLast => {
                Some(NullsPlacement::Last)
            }
        }
    }
}

/// One sort key: `entity.field direction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByOption {
    entity: String,
    field: String,
    direction: OrderDirection,
}

impl OrderByOption {
    pub fn new(entity: impl Into<String>, field: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            entity: entity.into(),
            field: field.into(),
            direction,
        }
    }

    pub fn asc(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(entity, field, OrderDirection::Asc)
    }

    pub fn desc(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(entity, field, OrderDirection::Desc)
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn direction(&self) -> OrderDirection {
        self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_and_nulls() {
        assert_eq!(OrderDirection::Asc.keyword(), "ASC");
        assert_eq!(OrderDirection::DescNullsLast.keyword(), "DESC");
        assert_eq!(OrderDirection::Desc.nulls(), None);
        assert_eq!(OrderDirection::AscNullsLast.nulls(), Some(NullsPlacement::Last));
        assert_eq!(OrderDirection::DescNullsFirst.nulls(), Some(NullsPlacement::First));
    }
}
