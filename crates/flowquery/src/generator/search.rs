//! Free-text search clause generation.

use crate::param::{ParamMap, ParamNamer, ParamValue};
use std::collections::BTreeSet;

/// Escape LIKE metacharacters (`%`, `_` and the escape character itself) by
/// prefixing each with `escape_char`.
///
/// ```ignore
/// assert_eq!(escape_term("50%_off", '§'), "50§%§_off");
/// ```
pub fn escape_term(term: &str, escape_char: char) -> String {
    let mut out = String::with_capacity(term.len() + 4);
    for c in term.chars() {
        if c == escape_char || c == '%' || c == '_' {
            out.push(escape_char);
        }
        out.push(c);
    }
    out
}

/// `term%`: value starts with the term.
pub fn starts_with_pattern(term: &str, escape_char: char) -> String {
    let mut pattern = escape_term(term, escape_char);
    pattern.push('%');
    pattern
}

/// `% term%`: some word inside the value starts with the term.
pub fn word_start_pattern(term: &str, escape_char: char) -> String {
    let mut pattern = String::from("% ");
    pattern.push_str(&starts_with_pattern(term, escape_char));
    pattern
}

/// Output of [`QueryGeneratorForSearchTerm::generate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryGeneratedSearchTerms {
    /// OR-joined LIKE alternatives, without surrounding parentheses.
    pub clause: String,
    pub params: ParamMap,
    /// Qualified fields the clause searches.
    pub fields: BTreeSet<String>,
}

impl QueryGeneratedSearchTerms {
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }
}

/// Builds `field LIKE :sN ESCAPE 'c' OR ...` over every (field, term) pair.
#[derive(Debug, Clone, Copy)]
pub struct QueryGeneratorForSearchTerm {
    escape_char: char,
}

impl QueryGeneratorForSearchTerm {
    pub fn new(escape_char: char) -> Self {
        Self { escape_char }
    }

    /// Generate with fresh parameter names (`s1, s2, ...`).
    pub fn generate(
        &self,
        fields: &BTreeSet<String>,
        terms: &[String],
        word_search: bool,
    ) -> QueryGeneratedSearchTerms {
        self.generate_with(fields, terms, word_search, &mut ParamNamer::search_terms())
    }

    /// Generate, drawing parameter names from `namer`.
    ///
    /// Emission order: fields in sorted order; per field, terms in order; per term,
    /// the starts-with pattern then (with word search) the word-start pattern.
    pub fn generate_with(
        &self,
        fields: &BTreeSet<String>,
        terms: &[String],
        word_search: bool,
        namer: &mut ParamNamer,
    ) -> QueryGeneratedSearchTerms {
        let mut result = QueryGeneratedSearchTerms::default();
        if fields.is_empty() || terms.is_empty() {
            return result;
        }

        let mut alternatives = Vec::with_capacity(fields.len() * terms.len() * 2);
        for field in fields {
            for term in terms {
                let pattern = starts_with_pattern(term, self.escape_char);
                alternatives.push(self.like(field, pattern, namer, &mut result.params));
                if word_search {
                    let pattern = word_start_pattern(term, self.escape_char);
                    alternatives.push(self.like(field, pattern, namer, &mut result.params));
                }
            }
            result.fields.insert(field.clone());
        }
        result.clause = alternatives.join(" OR ");
        result
    }

    fn like(
        &self,
        field: &str,
        pattern: String,
        namer: &mut ParamNamer,
        params: &mut ParamMap,
    ) -> String {
        let name = namer.next_name();
        let sql = format!("{field} LIKE :{name} ESCAPE '{}'", self.escape_char);
        params.insert(name, ParamValue::Text(pattern));
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn escapes_metacharacters_and_escape_char() {
        assert_eq!(
            starts_with_pattern("the'value%with_special:_§§", '§'),
            "the'value§%with§_special:§_§§§§%"
        );
    }

    #[test]
    fn plain_terms_are_untouched() {
        assert_eq!(escape_term("toto", '§'), "toto");
        assert_eq!(escape_term("Jean-Luc O'Neil", '\\'), "Jean-Luc O'Neil");
    }

    #[test]
    fn word_pattern_has_leading_space() {
        assert_eq!(word_start_pattern("toto", '§'), "% toto%");
    }

    #[test]
    fn two_fields_without_word_search() {
        let generated = QueryGeneratorForSearchTerm::new('§').generate(
            &fields(&["a.field1", "a.field2"]),
            &["toto".to_string()],
            false,
        );
        assert_eq!(
            generated.clause,
            "a.field1 LIKE :s1 ESCAPE '§' OR a.field2 LIKE :s2 ESCAPE '§'"
        );
        assert_eq!(generated.params.len(), 2);
        assert_eq!(generated.params["s1"], ParamValue::Text("toto%".into()));
        assert_eq!(generated.params["s2"], ParamValue::Text("toto%".into()));
    }

    #[test]
    fn two_fields_with_word_search() {
        let generated = QueryGeneratorForSearchTerm::new('§').generate(
            &fields(&["a.field2", "a.field1"]),
            &["toto".to_string()],
            true,
        );
        assert_eq!(generated.clause.matches(" LIKE ").count(), 4);
        assert_eq!(
            generated.clause,
            "a.field1 LIKE :s1 ESCAPE '§' OR a.field1 LIKE :s2 ESCAPE '§' \
             OR a.field2 LIKE :s3 ESCAPE '§' OR a.field2 LIKE :s4 ESCAPE '§'"
        );
        assert_eq!(generated.params["s1"], ParamValue::Text("toto%".into()));
        assert_eq!(generated.params["s2"], ParamValue::Text("% toto%".into()));
        assert_eq!(generated.params["s3"], ParamValue::Text("toto%".into()));
        assert_eq!(generated.params["s4"], ParamValue::Text("% toto%".into()));
    }

    #[test]
    fn term_order_within_field() {
        let generated = QueryGeneratorForSearchTerm::new('§').generate(
            &fields(&["a.name"]),
            &["foo".to_string(), "bar".to_string()],
            true,
        );
        let values: Vec<&ParamValue> = ["s1", "s2", "s3", "s4"]
            .iter()
            .map(|k| &generated.params[*k])
            .collect();
        assert_eq!(
            values,
            vec![
                &ParamValue::Text("foo%".into()),
                &ParamValue::Text("% foo%".into()),
                &ParamValue::Text("bar%".into()),
                &ParamValue::Text("% bar%".into()),
            ]
        );
    }

    #[test]
    fn nothing_to_search() {
        let g = QueryGeneratorForSearchTerm::new('§');
        assert!(g.generate(&BTreeSet::new(), &["x".to_string()], true).is_empty());
        assert!(g.generate(&fields(&["a.b"]), &[], true).is_empty());
    }

    #[test]
    fn continues_numbering_from_namer() {
        let mut namer = ParamNamer::search_terms();
        namer.next_name();
        let generated = QueryGeneratorForSearchTerm::new('§').generate_with(
            &fields(&["a.b"]),
            &["x".to_string()],
            false,
            &mut namer,
        );
        assert_eq!(generated.clause, "a.b LIKE :s2 ESCAPE '§'");
    }
}
