//! Filter clause generation.
//!
//! Turns a flattened filter expression into one boolean clause plus its
//! parameters. The expression is checked in a single pass before any text is
//! produced, so a malformed list never yields a partial clause.

use crate::error::{QueryGenError, QueryGenResult};
use crate::filter::{FilterOperation, FilterOption, FilterValue};
use crate::generator::search::escape_term;
use crate::mapping::AliasMapping;
use crate::param::{ParamMap, ParamNamer, ParamValue};
use std::collections::BTreeSet;

/// Output of [`QueryGeneratorForFilters::generate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryGeneratedFilters {
    /// Rendered condition, without the surrounding parentheses.
    pub clause: String,
    pub params: ParamMap,
    /// Qualified fields referenced by the filters.
    pub fields: BTreeSet<String>,
}

impl QueryGeneratedFilters {
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }
}

/// What the previous token of the expression was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    /// A comparison or a closing parenthesis
    Operand,
    Combinator,
    Open,
}

/// Reject unbalanced parentheses, empty groups, dangling combinators and operands
/// whose value shape does not fit their operation.
pub fn validate_filters(filters: &[FilterOption]) -> QueryGenResult<()> {
    let mut depth: usize = 0;
    let mut prev = Prev::Start;

    for (pos, filter) in filters.iter().enumerate() {
        match filter.operation() {
            FilterOperation::LParenthesis => {
                depth += 1;
                prev = Prev::Open;
            }
            FilterOperation::RParenthesis => {
                if depth == 0 {
                    return Err(QueryGenError::malformed(format!(
                        "unbalanced ')' at position {pos}"
                    )));
                }
                if prev != Prev::Operand {
                    return Err(QueryGenError::malformed(format!(
                        "')' at position {pos} closes an empty or incomplete group"
                    )));
                }
                depth -= 1;
                prev = Prev::Operand;
            }
            op @ (FilterOperation::And | FilterOperation::Or) => {
                if prev != Prev::Operand {
                    return Err(QueryGenError::malformed(format!(
                        "{op:?} at position {pos} has no left operand"
                    )));
                }
                prev = Prev::Combinator;
            }
            _ => {
                check_operand(pos, filter)?;
                prev = Prev::Operand;
            }
        }
    }

    if depth != 0 {
        return Err(QueryGenError::malformed(format!(
            "{depth} unclosed '(' in filter expression"
        )));
    }
    if prev == Prev::Combinator {
        return Err(QueryGenError::malformed(
            "filter expression ends with a combinator",
        ));
    }
    Ok(())
}

fn check_operand(pos: usize, filter: &FilterOption) -> QueryGenResult<()> {
    let op = filter.operation();
    if filter.entity().is_none() || filter.field().is_none() {
        return Err(QueryGenError::malformed(format!(
            "{op:?} at position {pos} has no entity or field"
        )));
    }
    let ok = match (op, filter.value()) {
        (FilterOperation::Equals | FilterOperation::Different, FilterValue::Single(v)) => {
            !matches!(v, ParamValue::List(_))
        }
        (
            FilterOperation::Greater
            | FilterOperation::GreaterOrEquals
            | FilterOperation::Less
            | FilterOperation::LessOrEquals,
            FilterValue::Single(v),
        ) => !v.is_null() && !matches!(v, ParamValue::List(_)),
        (FilterOperation::Like, FilterValue::Single(ParamValue::Text(_))) => true,
        (FilterOperation::Between, FilterValue::Range(from, to)) => !from.is_null() && !to.is_null(),
        (FilterOperation::In, FilterValue::List(values)) => !values.is_empty(),
        (FilterOperation::In, FilterValue::Single(ParamValue::List(values))) => !values.is_empty(),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(QueryGenError::malformed(format!(
            "{op:?} at position {pos} has an unsupported value: {:?}",
            filter.value()
        )))
    }
}

/// Renders filter expressions against an alias mapping.
#[derive(Debug, Clone, Copy)]
pub struct QueryGeneratorForFilters<'a> {
    mapping: &'a AliasMapping,
    escape_char: char,
}

impl<'a> QueryGeneratorForFilters<'a> {
    pub fn new(mapping: &'a AliasMapping, escape_char: char) -> Self {
        Self {
            mapping,
            escape_char,
        }
    }

    /// Generate with fresh parameter names (`p1, p2, ...`).
    pub fn generate(&self, filters: &[FilterOption]) -> QueryGenResult<QueryGeneratedFilters> {
        self.generate_with(filters, &mut ParamNamer::filters())
    }

    /// Generate, drawing parameter names from `namer`.
    ///
    /// Consecutive operands without an explicit marker are joined with `OR`.
    pub fn generate_with(
        &self,
        filters: &[FilterOption],
        namer: &mut ParamNamer,
    ) -> QueryGenResult<QueryGeneratedFilters> {
        validate_filters(filters)?;

        let mut result = QueryGeneratedFilters::default();
        let mut clause = String::new();
        let mut after_operand = false;

        for filter in filters {
            match filter.operation() {
                FilterOperation::LParenthesis => {
                    if after_operand {
                        clause.push_str(" OR ");
                    }
                    clause.push('(');
                    after_operand = false;
                }
                FilterOperation::RParenthesis => {
                    clause.push(')');
                    after_operand = true;
                }
                FilterOperation::And => {
                    clause.push_str(" AND ");
                    after_operand = false;
                }
                FilterOperation::Or => {
                    clause.push_str(" OR ");
                    after_operand = false;
                }
                _ => {
                    if after_operand {
                        clause.push_str(" OR ");
                    }
                    self.render_operand(filter, namer, &mut clause, &mut result)?;
                    after_operand = true;
                }
            }
        }

        result.clause = clause;
        Ok(result)
    }

    fn render_operand(
        &self,
        filter: &FilterOption,
        namer: &mut ParamNamer,
        out: &mut String,
        result: &mut QueryGeneratedFilters,
    ) -> QueryGenResult<()> {
        let (Some(entity), Some(field)) = (filter.entity(), filter.field()) else {
            return Err(QueryGenError::malformed("operand without entity or field"));
        };
        let column = self.mapping.qualified_field(entity, field)?;
        let op = filter.operation();

        match (op, filter.value()) {
            (FilterOperation::Equals, FilterValue::Single(ParamValue::Null)) => {
                out.push_str(&column);
                out.push_str(" IS NULL");
            }
            (FilterOperation::Different, FilterValue::Single(ParamValue::Null)) => {
                out.push_str(&column);
                out.push_str(" IS NOT NULL");
            }
            (FilterOperation::Like, FilterValue::Single(value)) => {
                let term = value.as_text().unwrap_or_default();
                let pattern = format!("%{}%", escape_term(term, self.escape_char));
                let name = bind(namer, &mut result.params, ParamValue::Text(pattern));
                out.push_str(&format!(
                    "{column} LIKE :{name} ESCAPE '{}'",
                    self.escape_char
                ));
            }
            (FilterOperation::Between, FilterValue::Range(from, to)) => {
                let from = bind(namer, &mut result.params, from.to_bind());
                let to = bind(namer, &mut result.params, to.to_bind());
                out.push_str(&format!("(:{from} <= {column} AND {column} <= :{to})"));
            }
            (FilterOperation::In, FilterValue::List(values)) => {
                let list = ParamValue::List(values.iter().map(ParamValue::to_bind).collect());
                let name = bind(namer, &mut result.params, list);
                out.push_str(&format!("{column} IN (:{name})"));
            }
            (FilterOperation::In, FilterValue::Single(list)) => {
                let name = bind(namer, &mut result.params, list.to_bind());
                out.push_str(&format!("{column} IN (:{name})"));
            }
            (_, FilterValue::Single(value)) => {
                let Some(operator) = op.comparison_operator() else {
                    return Err(QueryGenError::malformed(format!("{op:?} is not a comparison")));
                };
                let name = bind(namer, &mut result.params, value.to_bind());
                out.push_str(&format!("{column} {operator} :{name}"));
            }
            (_, value) => {
                return Err(QueryGenError::malformed(format!(
                    "{op:?} cannot take {value:?}"
                )));
            }
        }

        result.fields.insert(column);
        Ok(())
    }
}

fn bind(namer: &mut ParamNamer, params: &mut ParamMap, value: ParamValue) -> String {
    let name = namer.next_name();
    params.insert(name.clone(), value);
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Ordinal;

    const E: &str = "TestObject";

    fn mapping() -> AliasMapping {
        AliasMapping::new()
            .with_entity(E, "testObj")
            .with_entity("Other", "o")
    }

    fn generate(filters: &[FilterOption]) -> QueryGenResult<QueryGeneratedFilters> {
        let mapping = mapping();
        QueryGeneratorForFilters::new(&mapping, '§').generate(filters)
    }

    #[test]
    fn single_equals() {
        let g = generate(&[FilterOption::eq(E, "age", 25)]).unwrap();
        assert_eq!(g.clause, "testObj.age = :p1");
        assert_eq!(g.params["p1"], ParamValue::Int(25));
        assert!(g.fields.contains("testObj.age"));
    }

    #[test]
    fn null_equals_binds_nothing() {
        let g = generate(&[FilterOption::is_null(E, "endDate")]).unwrap();
        assert_eq!(g.clause, "testObj.endDate IS NULL");
        assert!(g.params.is_empty());
    }

    #[test]
    fn null_different_is_not_null() {
        let g = generate(&[FilterOption::ne(E, "endDate", ParamValue::Null)]).unwrap();
        assert_eq!(g.clause, "testObj.endDate IS NOT NULL");
        assert!(g.params.is_empty());
    }

    #[test]
    fn explicit_and() {
        let g = generate(&[
            FilterOption::eq(E, "age", 25),
            FilterOption::and(),
            FilterOption::eq(E, "name", "bob"),
        ])
        .unwrap();
        assert_eq!(g.clause, "testObj.age = :p1 AND testObj.name = :p2");
        assert_eq!(g.params["p2"], ParamValue::Text("bob".into()));
    }

    #[test]
    fn implicit_or() {
        let g = generate(&[
            FilterOption::eq(E, "state", 1),
            FilterOption::eq(E, "state", 2),
        ])
        .unwrap();
        assert_eq!(g.clause, "testObj.state = :p1 OR testObj.state = :p2");
    }

    #[test]
    fn grouping_with_parentheses() {
        let g = generate(&[
            FilterOption::eq(E, "a", 1),
            FilterOption::and(),
            FilterOption::l_parenthesis(),
            FilterOption::gt(E, "b", 2),
            FilterOption::is_null(E, "b"),
            FilterOption::r_parenthesis(),
            FilterOption::l_parenthesis(),
            FilterOption::lt("Other", "c", 3),
            FilterOption::r_parenthesis(),
        ])
        .unwrap();
        assert_eq!(
            g.clause,
            "testObj.a = :p1 AND (testObj.b > :p2 OR testObj.b IS NULL) OR (o.c < :p3)"
        );
        assert_eq!(g.params.len(), 3);
    }

    #[test]
    fn all_comparison_operators() {
        let g = generate(&[
            FilterOption::ne(E, "a", 1),
            FilterOption::and(),
            FilterOption::gt(E, "a", 2),
            FilterOption::and(),
            FilterOption::gte(E, "a", 3),
            FilterOption::and(),
            FilterOption::lt(E, "a", 4),
            FilterOption::and(),
            FilterOption::lte(E, "a", 5),
        ])
        .unwrap();
        assert_eq!(
            g.clause,
            "testObj.a != :p1 AND testObj.a > :p2 AND testObj.a >= :p3 \
             AND testObj.a < :p4 AND testObj.a <= :p5"
        );
    }

    #[test]
    fn between_renders_two_bounds() {
        let g = generate(&[FilterOption::between(E, "age", 18, 65)]).unwrap();
        assert_eq!(g.clause, "(:p1 <= testObj.age AND testObj.age <= :p2)");
        assert_eq!(g.params["p1"], ParamValue::Int(18));
        assert_eq!(g.params["p2"], ParamValue::Int(65));
    }

    #[test]
    fn in_binds_whole_list() {
        let g = generate(&[FilterOption::in_list(E, "id", [1i64, 2, 3])]).unwrap();
        assert_eq!(g.clause, "testObj.id IN (:p1)");
        assert_eq!(
            g.params["p1"],
            ParamValue::List(vec![1i64.into(), 2i64.into(), 3i64.into()])
        );
    }

    #[test]
    fn like_escapes_and_wraps() {
        let g = generate(&[FilterOption::like(E, "name", "50%_off")]).unwrap();
        assert_eq!(g.clause, "testObj.name LIKE :p1 ESCAPE '§'");
        assert_eq!(g.params["p1"], ParamValue::Text("%50§%§_off%".into()));
    }

    #[test]
    fn enums_bind_by_ordinal() {
        #[derive(Clone, Copy)]
        enum State {
            Completed = 6,
        }
        impl Ordinal for State {
            fn ordinal(&self) -> i32 {
                *self as i32
            }
        }

        let g = generate(&[
            FilterOption::eq(E, "state", ParamValue::ordinal(&State::Completed)),
            FilterOption::in_list(E, "state", [ParamValue::ordinal(&State::Completed)]),
        ])
        .unwrap();
        assert_eq!(g.params["p1"], ParamValue::Int(6));
        assert_eq!(g.params["p2"], ParamValue::List(vec![ParamValue::Int(6)]));
    }

    #[test]
    fn unmapped_entity_fails() {
        let err = generate(&[FilterOption::eq("Unknown", "a", 1)]).unwrap_err();
        assert!(matches!(err, QueryGenError::UnmappedEntity(_)));
    }

    #[test]
    fn invalid_field_fails() {
        let err = generate(&[FilterOption::eq(E, "a; DROP TABLE x", 1)]).unwrap_err();
        assert!(matches!(err, QueryGenError::InvalidIdentifier(_)));
    }

    #[test]
    fn empty_list_is_empty_clause() {
        let g = generate(&[]).unwrap();
        assert!(g.is_empty());
        assert!(g.params.is_empty());
    }

    #[test]
    fn rejects_unbalanced_parentheses() {
        let err = generate(&[FilterOption::r_parenthesis(), FilterOption::eq(E, "a", 1)]).unwrap_err();
        assert!(err.is_malformed_filter());

        let err = generate(&[FilterOption::l_parenthesis(), FilterOption::eq(E, "a", 1)]).unwrap_err();
        assert!(err.is_malformed_filter());

        let err = generate(&[FilterOption::l_parenthesis(), FilterOption::r_parenthesis()]).unwrap_err();
        assert!(err.is_malformed_filter());
    }

    #[test]
    fn rejects_dangling_combinators() {
        for filters in [
            vec![FilterOption::and(), FilterOption::eq(E, "a", 1)],
            vec![FilterOption::eq(E, "a", 1), FilterOption::and()],
            vec![
                FilterOption::eq(E, "a", 1),
                FilterOption::and(),
                FilterOption::or(),
                FilterOption::eq(E, "a", 2),
            ],
            vec![
                FilterOption::l_parenthesis(),
                FilterOption::and(),
                FilterOption::eq(E, "a", 1),
                FilterOption::r_parenthesis(),
            ],
        ] {
            assert!(generate(&filters).unwrap_err().is_malformed_filter());
        }
    }

    #[test]
    fn rejects_wrong_arity() {
        let bad = [
            FilterOption::new(E, "a", FilterOperation::Between, FilterValue::Single(1.into())),
            FilterOption::new(E, "a", FilterOperation::In, FilterValue::List(vec![])),
            FilterOption::new(E, "a", FilterOperation::In, FilterValue::Range(1.into(), 2.into())),
            FilterOption::new(E, "a", FilterOperation::Equals, FilterValue::List(vec![1.into()])),
            FilterOption::new(E, "a", FilterOperation::Greater, FilterValue::Single(ParamValue::Null)),
            FilterOption::new(E, "a", FilterOperation::Like, FilterValue::Single(3.into())),
            FilterOption::new(E, "a", FilterOperation::Equals, FilterValue::Absent),
        ];
        for filter in bad {
            let err = generate(std::slice::from_ref(&filter)).unwrap_err();
            assert!(err.is_malformed_filter(), "{filter:?} should be rejected");
        }
    }

    #[test]
    fn malformed_check_runs_before_mapping() {
        let err = generate(&[FilterOption::eq("Unknown", "a", 1), FilterOption::and()]).unwrap_err();
        assert!(err.is_malformed_filter());
    }

    #[test]
    fn numbering_continues_across_calls() {
        let mapping = mapping();
        let generator = QueryGeneratorForFilters::new(&mapping, '§');
        let mut namer = ParamNamer::filters();
        generator.generate_with(&[FilterOption::eq(E, "a", 1)], &mut namer).unwrap();
        let second = generator
            .generate_with(&[FilterOption::eq(E, "b", 2)], &mut namer)
            .unwrap();
        assert_eq!(second.clause, "testObj.b = :p2");
    }
}
