//! Helpers for executing generated text directly against the driver.

use crate::error::{QueryGenError, QueryGenResult};
use crate::param::{ParamMap, ParamValue};
use crate::sql::scan;
use std::collections::{BTreeMap, HashMap};
use tokio_postgres::types::ToSql;

/// Bind every boolean constant whose `:name` appears in `sql`.
///
/// Boolean literals are not portable across dialects, so native statements reference
/// them as placeholders and have them rebound on each build.
pub(crate) fn bind_boolean_constants(
    sql: &str,
    constants: &BTreeMap<String, bool>,
    params: &mut ParamMap,
) -> usize {
    let mut bound = 0;
    for placeholder in scan(sql).placeholders {
        if params.contains_key(placeholder.name) {
            continue;
        }
        if let Some(value) = constants.get(placeholder.name) {
            params.insert(placeholder.name.to_string(), ParamValue::Bool(*value));
            bound += 1;
        }
    }
    bound
}

/// A statement with `$n` placeholders and its values in order.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionalQuery {
    pub sql: String,
    pub values: Vec<ParamValue>,
}

impl PositionalQuery {
    /// Values as references for `tokio_postgres::Client::query`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }
}

/// Rewrite `:name` placeholders to `$1, $2, ...`.
///
/// A name used several times reuses the same position. List values are expanded
/// into one position per element; an empty list renders `NULL`.
pub(crate) fn to_positional(sql: &str, params: &ParamMap) -> QueryGenResult<PositionalQuery> {
    let scanned = scan(sql);
    let mut out = String::with_capacity(sql.len() + 8);
    let mut values = Vec::with_capacity(params.len());
    let mut rendered: HashMap<&str, String> = HashMap::new();
    let mut last = 0;

    for placeholder in &scanned.placeholders {
        out.push_str(&sql[last..placeholder.start]);
        last = placeholder.end;

        if let Some(existing) = rendered.get(placeholder.name) {
            out.push_str(existing);
            continue;
        }
        let value = params.get(placeholder.name).ok_or_else(|| {
            QueryGenError::validation(format!("no value bound for :{}", placeholder.name))
        })?;
        let text = match value.to_bind() {
            ParamValue::List(items) if items.is_empty() => "NULL".to_string(),
            ParamValue::List(items) => {
                let mut positions = Vec::with_capacity(items.len());
                for item in items {
                    values.push(item);
                    positions.push(format!("${}", values.len()));
                }
                positions.join(", ")
            }
            single => {
                values.push(single);
                format!("${}", values.len())
            }
        };
        out.push_str(&text);
        rendered.insert(placeholder.name, text);
    }
    out.push_str(&sql[last..]);

    Ok(PositionalQuery { sql: out, values })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(entries: &[(&str, ParamValue)]) -> ParamMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn numbers_in_text_order() {
        let p = params(&[("p1", 1.into()), ("p2", "x".into()), ("s1", "y%".into())]);
        let q = to_positional("SELECT * FROM t WHERE (a = :p2 AND b = :p1) AND (c LIKE :s1)", &p).unwrap();
        assert_eq!(q.sql, "SELECT * FROM t WHERE (a = $1 AND b = $2) AND (c LIKE $3)");
        assert_eq!(
            q.values,
            vec![ParamValue::Text("x".into()), ParamValue::Int(1), ParamValue::Text("y%".into())]
        );
        assert_eq!(q.params_ref().len(), 3);
    }

    #[test]
    fn expands_lists() {
        let p = params(&[("p1", ParamValue::List(vec![1.into(), 2.into(), 3.into()]))]);
        let q = to_positional("a IN (:p1)", &p).unwrap();
        assert_eq!(q.sql, "a IN ($1, $2, $3)");
        assert_eq!(q.values.len(), 3);
    }

    #[test]
    fn empty_list_is_null() {
        let p = params(&[("p1", ParamValue::List(vec![]))]);
        let q = to_positional("a IN (:p1)", &p).unwrap();
        assert_eq!(q.sql, "a IN (NULL)");
        assert!(q.values.is_empty());
    }

    #[test]
    fn reuses_repeated_names() {
        let p = params(&[("trueValue", true.into())]);
        let q = to_positional("a = :trueValue OR b = :trueValue", &p).unwrap();
        assert_eq!(q.sql, "a = $1 OR b = $1");
        assert_eq!(q.values, vec![ParamValue::Bool(true)]);
    }

    #[test]
    fn ignores_casts_and_literals() {
        let p = params(&[("p1", 1.into())]);
        let q = to_positional("SELECT a::text, ':x' FROM t WHERE a = :p1", &p).unwrap();
        assert_eq!(q.sql, "SELECT a::text, ':x' FROM t WHERE a = $1");
    }

    #[test]
    fn missing_value_fails() {
        let err = to_positional("a = :p9", &ParamMap::new()).unwrap_err();
        assert!(matches!(err, QueryGenError::Validation(ref m) if m.contains(":p9")));
    }

    #[test]
    fn boolean_constants_bound_when_referenced() {
        let constants = BTreeMap::from([
            ("trueValue".to_string(), true),
            ("falseValue".to_string(), false),
        ]);
        let mut p = ParamMap::new();
        let bound = bind_boolean_constants("WHERE a.deleted = :falseValue", &constants, &mut p);
        assert_eq!(bound, 1);
        assert_eq!(p.get("falseValue"), Some(&ParamValue::Bool(false)));
        assert!(!p.contains_key("trueValue"));
    }
}
