//! ORDER BY rendering strategies.
//!
//! Some databases accept `NULLS FIRST` / `NULLS LAST` natively; others need a
//! leading `CASE WHEN field IS NULL THEN 0 ELSE 1 END` key whose direction puts
//! NULLs where requested.

use crate::order::{NullsPlacement, OrderDirection};
use serde::Deserialize;

/// How a sort key is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderByStrategy {
    /// `field ASC|DESC [NULLS FIRST|NULLS LAST]`
    #[default]
    Native,
    /// NULL placement emulated with a CASE key emitted before the field.
    CaseWhenNulls,
}

impl OrderByStrategy {
    /// Append one sort key to `out`.
    ///
    /// ```ignore
    /// let mut sql = String::new();
    /// OrderByStrategy::CaseWhenNulls.append_order_by(&mut sql, "p.name", OrderDirection::DescNullsLast);
    /// assert_eq!(sql, "CASE WHEN p.name IS NULL THEN 0 ELSE 1 END DESC, p.name DESC");
    /// ```
    pub fn append_order_by(self, out: &mut String, field: &str, direction: OrderDirection) {
        match self {
            OrderByStrategy::Native => {
                out.push_str(field);
                out.push(' ');
                out.push_str(direction.keyword());
                match direction.nulls() {
                    Some(NullsPlacement::First) => out.push_str(" NULLS FIRST"),
                    Some(NullsPlacement::Last) => out.push_str(" NULLS LAST"),
                    None => {}
                }
            }
            OrderByStrategy::CaseWhenNulls => {
                // NULL rows get key 0: ascending puts them first.
                if let Some(placement) = direction.nulls() {
                    out.push_str("CASE WHEN ");
                    out.push_str(field);
                    out.push_str(" IS NULL THEN 0 ELSE 1 END ");
                    out.push_str(match placement {
                        NullsPlacement::First => "ASC",
                        NullsPlacement::Last => "DESC",
                    });
                    out.push_str(", ");
                }
                out.push_str(field);
                out.push(' ');
                out.push_str(direction.keyword());
            }
        }
    }

    /// Render one sort key into a new string.
    pub fn render(self, field: &str, direction: OrderDirection) -> String {
        let mut out = String::with_capacity(field.len() * 2 + 48);
        self.append_order_by(&mut out, field, direction);
        out
    }
}
