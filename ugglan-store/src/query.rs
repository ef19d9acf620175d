//! PostgREST query-string builder for the handful of filters the wizards use.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn select(columns: &str) -> Self {
        let columns = columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        Self {
            params: vec![("select".to_string(), columns)],
        }
    }

    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.params.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// Case-insensitive substring match on any of `columns`.
    pub fn ilike_any(mut self, columns: &[&str], needle: &str) -> Self {
        let needle = sanitize_needle(needle);
        let clauses = columns
            .iter()
            .map(|column| format!("{column}.ilike.*{needle}*"))
            .collect::<Vec<_>>()
            .join(",");
        self.params.push(("or".to_string(), format!("({clauses})")));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// The text a search for `raw` would actually match on, or `None` when nothing is left
/// after cleaning. An empty needle would match every row.
pub fn search_needle(raw: &str) -> Option<String> {
    Some(sanitize_needle(raw)).filter(|needle| !needle.is_empty())
}

/// Strips characters that carry meaning inside a PostgREST `or=(...)` expression.
fn sanitize_needle(needle: &str) -> String {
    let cleaned: String = needle
        .chars()
        .map(|c| match c {
            ',' | '(' | ')' | '"' | '*' | '%' | '\\' | ':' => ' ',
            other => other,
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
