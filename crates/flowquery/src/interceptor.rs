//! Last-mile statement rewriting.
//!
//! Interceptors see only the final statement text, right before it is prepared.
//! They have no access to the filter model, so any patching they do is textual.

use crate::config::Dialect;
use crate::sql::scan;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Action returned by a [`StatementInterceptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptAction {
    /// Execute the statement as is.
    Continue,
    /// Execute this statement instead.
    ModifySql(String),
}

impl InterceptAction {
    /// Statement text to execute for `original`.
    pub fn apply(self, original: &str) -> String {
        match self {
            InterceptAction::Continue => original.to_string(),
            InterceptAction::ModifySql(sql) => sql,
        }
    }
}

/// Hook called with every statement before it is prepared.
pub trait StatementInterceptor: Send + Sync {
    fn before_statement(&self, sql: &str) -> InterceptAction;
}

// One operand of a LIKE expression: a quoted literal, a (dotted) identifier or a placeholder.
const OPERAND: &str =
    r"(?:'(?:[^']|'')*'|[A-Za-z_][\w$]*(?:\.[A-Za-z_][\w$]*)*|:[A-Za-z_]\w*|\$\d+|\?)";
const PATTERN: &str = r"(?:'(?:[^']|'')*'|:[A-Za-z_]\w*|\$\d+|\?)";

fn like_regex() -> &'static Regex {
    static LIKE_RE: OnceLock<Regex> = OnceLock::new();
    LIKE_RE.get_or_init(|| {
        let source = format!(
            r"(?P<pre>^|[^\w.:$'])(?P<expr>{OPERAND}(?:\s*\|\|\s*{OPERAND})*)\s+(?P<not>(?i:NOT)\s+)?(?P<like>(?i:LIKE))\s+(?P<pat>{PATTERN})"
        );
        Regex::new(&source).expect("invalid built-in LIKE regex")
    })
}

/// Makes `LIKE` case-insensitive on databases where it is not.
///
/// `expr [NOT] LIKE pattern` becomes `UPPER(expr) [NOT] LIKE UPPER(pattern)`.
/// `expr` may be a `||` concatenation; `pattern` a placeholder (`:name`, `$1`, `?`)
/// or a string literal. The keyword keeps its original case. Operands that are
/// already wrapped in a function call, and columns whose name merely contains
/// "like", are left alone.
///
/// ```ignore
/// let sql = CaseInsensitiveLikeInterceptor::new().rewrite("WHERE hitBys like 'FINISH:%'");
/// assert_eq!(sql, "WHERE UPPER(hitBys) like UPPER('FINISH:%')");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitiveLikeInterceptor;

impl CaseInsensitiveLikeInterceptor {
    pub fn new() -> Self {
        Self
    }

    /// Rewrite every LIKE in `sql` that sits outside literals and comments.
    pub fn rewrite(&self, sql: &str) -> String {
        let scanned = scan(sql);
        let mut out = String::with_capacity(sql.len() + 32);
        let mut rewritten = 0usize;
        let mut copied = 0;
        let mut pos = 0;

        while let Some(caps) = like_regex().captures_at(sql, pos) {
            let (Some(expr), Some(like), Some(pat)) =
                (caps.name("expr"), caps.name("like"), caps.name("pat"))
            else {
                break;
            };
            if scanned.is_skipped(expr.start()) || scanned.is_skipped(like.start()) {
                // Operands always start with an ASCII byte.
                pos = expr.start() + 1;
                continue;
            }

            out.push_str(&sql[copied..expr.start()]);
            out.push_str("UPPER(");
            out.push_str(expr.as_str());
            out.push_str(") ");
            out.push_str(&like_keyword(&caps));
            out.push_str(" UPPER(");
            out.push_str(pat.as_str());
            out.push(')');
            copied = pat.end();
            pos = pat.end();
            rewritten += 1;
        }
        out.push_str(&sql[copied..]);

        if rewritten > 0 {
            tracing::trace!(target: "flowquery.sql", rewritten, "case-insensitive LIKE rewrite");
        }
        out
    }
}

/// `LIKE` or `NOT LIKE` in the statement's own case, with single spacing.
fn like_keyword(caps: &Captures<'_>) -> String {
    match caps.name("not") {
        Some(not) => format!("{} {}", not.as_str().trim_end(), &caps["like"]),
        None => caps["like"].to_string(),
    }
}

impl StatementInterceptor for CaseInsensitiveLikeInterceptor {
    fn before_statement(&self, sql: &str) -> InterceptAction {
        let rewritten = self.rewrite(sql);
        if rewritten == sql {
            InterceptAction::Continue
        } else {
            InterceptAction::ModifySql(rewritten)
        }
    }
}

/// Apply the dialect's interceptor, if it has one, to `sql`.
pub fn rewrite_for_dialect(dialect: Dialect, sql: &str) -> String {
    match dialect.interceptor() {
        Some(interceptor) => interceptor.before_statement(sql).apply(sql),
        None => sql.to_string(),
    }
}
