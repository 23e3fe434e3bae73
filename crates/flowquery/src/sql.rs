//! Lightweight scanning of query text.
//!
//! The assembler has to answer questions like "does this skeleton already have a
//! WHERE?" or "where do the `:name` placeholders sit?" without a full SQL parser.
//! The scanner skips string literals, quoted identifiers and comments, and tracks
//! parenthesis depth so keywords of sub-queries are not mistaken for top-level ones.

use std::ops::Range;

/// A bare word (keyword or identifier segment) found in query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Word<'a> {
    pub start: usize,
    pub text: &'a str,
    pub depth: i32,
}

/// A `:name` placeholder; `start` is the position of the colon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placeholder<'a> {
    pub start: usize,
    pub end: usize,
    pub name: &'a str,
}

#[derive(Debug, Default)]
pub(crate) struct Scanned<'a> {
    pub words: Vec<Word<'a>>,
    pub placeholders: Vec<Placeholder<'a>>,
    /// Byte ranges of literals, quoted identifiers and comments.
    pub skipped: Vec<Range<usize>>,
}

impl Scanned<'_> {
    /// Whether `pos` lies strictly inside a literal, quoted identifier or comment.
    pub fn is_skipped(&self, pos: usize) -> bool {
        self.skipped.iter().any(|span| span.start < pos && pos < span.end)
    }
}

fn is_word_byte(b: u8) -> bool {
    b == b'_' || b == b'$' || b.is_ascii_alphanumeric()
}

/// Skip a quoted section starting at `i` (the opening quote); doubled quotes
/// are escapes. Returns the index just past the closing quote.
fn skip_quoted(bytes: &[u8], mut i: usize, quote: u8) -> usize {
    i += 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Scan `sql` for words and named placeholders outside literals and comments.
pub(crate) fn scan(sql: &str) -> Scanned<'_> {
    let bytes = sql.as_bytes();
    let mut out = Scanned::default();
    let mut depth: i32 = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                let end = skip_quoted(bytes, i, bytes[i]);
                out.skipped.push(i..end);
                i = end;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                let end = match sql[i..].find('\n') {
                    Some(pos) => i + pos + 1,
                    None => bytes.len(),
                };
                out.skipped.push(i..end);
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = match sql[i + 2..].find("*/") {
                    Some(pos) => i + 2 + pos + 2,
                    None => bytes.len(),
                };
                out.skipped.push(i..end);
                i = end;
            }
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth -= 1;
                i += 1;
            }
            b':' => {
                // `::type` casts are not placeholders.
                if bytes.get(i + 1) == Some(&b':') {
                    i += 2;
                    continue;
                }
                let name_start = i + 1;
                let mut end = name_start;
                if end < bytes.len() && (bytes[end] == b'_' || bytes[end].is_ascii_alphabetic()) {
                    while end < bytes.len() && (bytes[end] == b'_' || bytes[end].is_ascii_alphanumeric()) {
                        end += 1;
                    }
                    out.placeholders.push(Placeholder {
                        start: i,
                        end,
                        name: &sql[name_start..end],
                    });
                    i = end;
                } else {
                    i += 1;
                }
            }
            b if is_word_byte(b) => {
                let start = i;
                while i < bytes.len() && is_word_byte(bytes[i]) {
                    i += 1;
                }
                out.words.push(Word {
                    start,
                    text: &sql[start..i],
                    depth,
                });
            }
            _ => i += 1,
        }
    }
    out
}

fn top_level_words(sql: &str) -> impl Iterator<Item = Word<'_>> {
    scan(sql).words.into_iter().filter(|w| w.depth == 0)
}

/// Whether `keyword` appears as a top-level word.
pub(crate) fn has_top_level_keyword(sql: &str, keyword: &str) -> bool {
    top_level_words(sql).any(|w| w.text.eq_ignore_ascii_case(keyword))
}

/// Byte offset just past the first top-level `keyword`.
pub(crate) fn top_level_keyword_end(sql: &str, keyword: &str) -> Option<usize> {
    top_level_words(sql)
        .find(|w| w.text.eq_ignore_ascii_case(keyword))
        .map(|w| w.start + w.text.len())
}

/// Whether the statement combines several SELECTs at top level
/// (`UNION`, `INTERSECT`, `EXCEPT`, `MINUS`).
pub(crate) fn has_top_level_set_operator(sql: &str) -> bool {
    top_level_words(sql).any(|w| {
        ["UNION", "INTERSECT", "EXCEPT", "MINUS"]
            .iter()
            .any(|op| w.text.eq_ignore_ascii_case(op))
    })
}

/// Whether the statement has a top-level `ORDER BY`.
pub(crate) fn has_top_level_order_by(sql: &str) -> bool {
    let words: Vec<Word<'_>> = top_level_words(sql).collect();
    words.windows(2).any(|pair| {
        pair[0].text.eq_ignore_ascii_case("ORDER") && pair[1].text.eq_ignore_ascii_case("BY")
    })
}

fn first_top_level_clause(sql: &str, include_grouping: bool) -> usize {
    let words: Vec<Word<'_>> = top_level_words(sql).collect();
    for (idx, w) in words.iter().enumerate() {
        let next = words.get(idx + 1).map(|n| n.text);
        let is_tail = match w.text.to_ascii_uppercase().as_str() {
            "GROUP" | "ORDER" => {
                include_grouping && next.is_some_and(|n| n.eq_ignore_ascii_case("BY"))
            }
            "HAVING" => include_grouping,
            "FOR" => next.is_some_and(|n| n.eq_ignore_ascii_case("UPDATE")),
            "LIMIT" | "OFFSET" | "FETCH" => true,
            _ => false,
        };
        if is_tail {
            return w.start;
        }
    }
    sql.len()
}

/// Byte offset where trailing clauses (GROUP BY, HAVING, ORDER BY, LIMIT, OFFSET,
/// FETCH, FOR UPDATE) begin; conditions must be inserted before it.
pub(crate) fn condition_insert_position(sql: &str) -> usize {
    first_top_level_clause(sql, true)
}

/// Byte offset where sort keys must end: before LIMIT, OFFSET, FETCH or FOR UPDATE.
pub(crate) fn order_by_insert_position(sql: &str) -> usize {
    first_top_level_clause(sql, false)
}

/// Insert `clause` at byte offset `pos`, normalising the surrounding whitespace
/// to single spaces.
pub(crate) fn splice(sql: &str, pos: usize, clause: &str) -> String {
    let head = sql[..pos].trim_end();
    let tail = sql[pos..].trim_start();
    let mut out = String::with_capacity(sql.len() + clause.len() + 2);
    out.push_str(head);
    out.push(' ');
    out.push_str(clause);
    if !tail.is_empty() {
        out.push(' ');
        out.push_str(tail);
    }
    out
}

/// Truncate `sql` to at most `max` bytes on a char boundary.
pub(crate) fn truncate_for_log(sql: &str, max: Option<usize>) -> std::borrow::Cow<'_, str> {
    match max {
        Some(max) if sql.len() > max => {
            let mut end = max;
            while end > 0 && !sql.is_char_boundary(end) {
                end -= 1;
            }
            std::borrow::Cow::Owned(format!("{}...", &sql[..end]))
        }
        _ => std::borrow::Cow::Borrowed(sql),
    }
}
