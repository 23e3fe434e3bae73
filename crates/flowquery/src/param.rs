//! Bound parameter values and deterministic parameter naming.
//!
//! Generated clauses reference values through named placeholders (`:p1`, `:s1`, ...).
//! Names are handed out by [`ParamNamer`] strictly in emission order, so the same
//! input always produces the same text and the same [`ParamMap`].

use bytes::BytesMut;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use tokio_postgres::types::{IsNull, Kind, ToSql, Type};
use uuid::Uuid;

/// Parameters of a generated clause, keyed by placeholder name (without the `:`).
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Enum-like values that are stored by ordinal.
///
/// Filter values carrying an ordinal are bound as integers, never as their display
/// string, so renaming or localising a variant does not change stored comparisons.
///
/// ```ignore
/// enum State { Ready, Executing, Completed }
///
/// impl Ordinal for State {
///     fn ordinal(&self) -> i32 {
///         *self as i32
///     }
/// }
///
/// FilterOption::eq("SFlowNodeInstance", "state", ParamValue::ordinal(&State::Ready));
/// ```
pub trait Ordinal {
    fn ordinal(&self) -> i32;
}

/// A value bound to a named placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// SQL NULL
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    /// Ordinal of an enum-like value; bound as an integer.
    Enum(i32),
    /// A list bound as a single parameter (IN filters).
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// Wrap an enum-like value by its ordinal.
    pub fn ordinal<E: Ordinal + ?Sized>(value: &E) -> Self {
        ParamValue::Enum(value.ordinal())
    }

    /// Check if this is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// Borrow the text of a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The value actually handed to the driver: enum ordinals become integers.
    pub fn to_bind(&self) -> ParamValue {
        match self {
            ParamValue::Enum(ordinal) => ParamValue::Int(i64::from(*ordinal)),
            ParamValue::List(items) => ParamValue::List(items.iter().map(Self::to_bind).collect()),
            other => other.clone(),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i16> for ParamValue {
    fn from(v: i16) -> Self {
        ParamValue::Int(i64::from(v))
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(i64::from(v))
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(f64::from(v))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(v: DateTime<Utc>) -> Self {
        ParamValue::Timestamp(v)
    }
}

impl From<Uuid> for ParamValue {
    fn from(v: Uuid) -> Self {
        ParamValue::Uuid(v)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ParamValue::Null, Into::into)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(v: Vec<T>) -> Self {
        ParamValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl ToSql for ParamValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            ParamValue::Null => Ok(IsNull::Yes),
            ParamValue::Bool(v) => v.to_sql(ty, out),
            ParamValue::Int(v) => encode_int(*v, ty, out),
            ParamValue::Enum(v) => encode_int(i64::from(*v), ty, out),
            ParamValue::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            ParamValue::Text(v) => v.to_sql(ty, out),
            ParamValue::Timestamp(v) => v.to_sql(ty, out),
            ParamValue::Uuid(v) => v.to_sql(ty, out),
            ParamValue::List(items) => match ty.kind() {
                Kind::Array(_) => items.to_sql(ty, out),
                _ => Err(format!(
                    "list parameter bound to non-array type {ty}; expand it into one placeholder per element"
                )
                .into()),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

fn encode_int(
    v: i64,
    ty: &Type,
    out: &mut BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    match *ty {
        Type::INT2 => i16::try_from(v)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql(ty, out),
        _ => v.to_sql(ty, out),
    }
}

/// Hands out placeholder names `<prefix>1, <prefix>2, ...` in call order.
#[derive(Debug, Clone)]
pub struct ParamNamer {
    prefix: &'static str,
    count: usize,
}

impl ParamNamer {
    /// Names for filter parameters: `p1, p2, ...`
    pub fn filters() -> Self {
        Self::with_prefix("p")
    }

    /// Names for search term parameters: `s1, s2, ...`
    pub fn search_terms() -> Self {
        Self::with_prefix("s")
    }

    pub fn with_prefix(prefix: &'static str) -> Self {
        Self { prefix, count: 0 }
    }

    /// Next placeholder name.
    pub fn next_name(&mut self) -> String {
        self.count += 1;
        format!("{}{}", self.prefix, self.count)
    }

    /// Number of names handed out so far.
    pub fn count(&self) -> usize {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy)]
    enum State {
        Ready = 4,
    }

    impl Ordinal for State {
        fn ordinal(&self) -> i32 {
            *self as i32
        }
    }

    #[test]
    fn namer_is_sequential() {
        let mut namer = ParamNamer::filters();
        assert_eq!(namer.next_name(), "p1");
        assert_eq!(namer.next_name(), "p2");
        assert_eq!(namer.count(), 2);

        let mut namer = ParamNamer::search_terms();
        assert_eq!(namer.next_name(), "s1");
    }

    #[test]
    fn enum_binds_as_int() {
        let v = ParamValue::ordinal(&State::Ready);
        assert_eq!(v, ParamValue::Enum(4));
        assert_eq!(v.to_bind(), ParamValue::Int(4));
    }

    #[test]
    fn list_binding_converts_members() {
        let v = ParamValue::List(vec![ParamValue::Enum(1), ParamValue::from("x")]);
        assert_eq!(
            v.to_bind(),
            ParamValue::List(vec![ParamValue::Int(1), ParamValue::Text("x".into())])
        );
    }

    #[test]
    fn option_none_is_null() {
        let v: ParamValue = Option::<i64>::None.into();
        assert!(v.is_null());
        let v: ParamValue = Some(3i32).into();
        assert_eq!(v, ParamValue::Int(3));
    }

    #[test]
    fn serializes_untagged() {
        let v = ParamValue::List(vec![ParamValue::Int(1), ParamValue::Null, "a".into()]);
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"[1,null,"a"]"#);
    }

    #[test]
    fn int_narrows_for_int4() {
        let mut buf = BytesMut::new();
        let res = ParamValue::Int(7).to_sql(&Type::INT4, &mut buf).unwrap();
        assert!(matches!(res, IsNull::No));
        assert_eq!(&buf[..], &7i32.to_be_bytes());
    }

    #[test]
    fn int_overflow_for_int2_fails() {
        let mut buf = BytesMut::new();
        assert!(ParamValue::Int(100_000).to_sql(&Type::INT2, &mut buf).is_err());
    }
}
