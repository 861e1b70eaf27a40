//! Column definitions parsed out of `CREATE TABLE` text.

/// Columns and primary key derived from a table's column-definition list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Insertable columns in declaration order. Autoincrement columns are
    /// left out; a plain `PRIMARY KEY` column stays in.
    pub columns: Vec<String>,
    /// Declared primary key, or empty when none was declared.
    pub primary_key: String,
}

impl ColumnSpec {
    /// Declared primary key, falling back to the first column.
    pub fn resolved_primary_key(&self) -> Option<&str> {
        if self.primary_key.is_empty() {
            self.columns.first().map(String::as_str)
        } else {
            Some(&self.primary_key)
        }
    }
}

const TABLE_CONSTRAINTS: [&str; 5] = ["constraint", "primary", "foreign", "unique", "check"];

/// Parses the fragment between the parentheses of a `CREATE TABLE` statement,
/// e.g. `num INTEGER PRIMARY KEY AUTOINCREMENT, name VARCHAR(20), age INT`.
pub fn parse_column_spec(fragment: &str) -> ColumnSpec {
    let mut spec = ColumnSpec::default();
    let mut table_level_key = None;

    for raw in split_top_level(fragment) {
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let Some(first) = normalized.split(' ').next().filter(|t| !t.is_empty()) else {
            continue;
        };
        let lowered = normalized.to_lowercase();

        if TABLE_CONSTRAINTS.contains(&first.to_lowercase().as_str()) {
            if lowered.contains("primary key") {
                table_level_key = single_key_column(&normalized);
            }
            continue;
        }

        let name = unquote(first).to_string();
        if lowered.contains("primary key") {
            spec.primary_key = name.clone();
        }
        if !lowered.contains("autoincrement") && !spec.columns.contains(&name) {
            spec.columns.push(name);
        }
    }

    if spec.primary_key.is_empty() {
        if let Some(key) = table_level_key {
            spec.primary_key = key;
        }
    }
    spec
}

/// Returns the column-definition list of a stored `CREATE TABLE` statement:
/// the text between the first unquoted `(` and the last `)`.
pub fn extract_column_fragment(create_sql: &str) -> Option<&str> {
    let open = first_unquoted_paren(create_sql)?;
    let close = create_sql.rfind(')')?;
    (close > open).then(|| create_sql[open + 1..close].trim())
}

/// Position of the first `(` outside `"…"`, `` `…` ``, `[…]` and `'…'`.
/// A doubled quote inside a quoted name closes and reopens it, which leaves
/// the scan in the same state.
fn first_unquoted_paren(sql: &str) -> Option<usize> {
    let mut closing = None;
    for (idx, ch) in sql.char_indices() {
        match closing {
            Some(close) if ch == close => closing = None,
            Some(_) => {}
            None => match ch {
                '"' | '`' | '\'' => closing = Some(ch),
                '[' => closing = Some(']'),
                '(' => return Some(idx),
                _ => {}
            },
        }
    }
    None
}

/// Splits on commas outside parentheses, so `DECIMAL(10, 2)` stays whole.
fn split_top_level(fragment: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in fragment.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(fragment[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(fragment[start..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}

/// `PRIMARY KEY (col)` naming exactly one column.
fn single_key_column(constraint: &str) -> Option<String> {
    let inner = extract_column_fragment(constraint)?;
    let mut names = inner.split(',').map(str::trim).filter(|n| !n.is_empty());
    let first = names.next()?;
    if names.next().is_some() {
        return None;
    }
    let name = first.split_whitespace().next()?;
    Some(unquote(name).to_string())
}

fn unquote(token: &str) -> &str {
    let quoted = [('"', '"'), ('`', '`'), ('[', ']'), ('\'', '\'')];
    for (open, close) in quoted {
        if token.len() >= 2 && token.starts_with(open) && token.ends_with(close) {
            return &token[1..token.len() - 1];
        }
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(spec: &ColumnSpec) -> Vec<&str> {
        spec.columns.iter().map(String::as_str).collect()
    }

    #[test]
    fn autoincrement_key_is_excluded() {
        let spec = parse_column_spec(
            "id INTEGER PRIMARY KEY AUTOINCREMENT, label VARCHAR(20), qty INT",
        );
        assert_eq!(names(&spec), ["label", "qty"]);
        assert_eq!(spec.primary_key, "id");
    }

    #[test]
    fn plain_primary_key_is_kept() {
        let spec = parse_column_spec("a0 INTEGER PRIMARY KEY, a1 INT, a2 FLOAT");
        assert_eq!(names(&spec), ["a0", "a1", "a2"]);
        assert_eq!(spec.primary_key, "a0");
    }

    #[test]
    fn keywords_match_case_insensitively() {
        let spec = parse_column_spec("num integer primary key autoincrement, name text");
        assert_eq!(names(&spec), ["name"]);
        assert_eq!(spec.primary_key, "num");
    }

    #[test]
    fn missing_primary_key_falls_back_to_first_column() {
        let spec = parse_column_spec("code TEXT, price REAL");
        assert_eq!(spec.primary_key, "");
        assert_eq!(spec.resolved_primary_key(), Some("code"));
    }

    #[test]
    fn empty_fragment_yields_nothing() {
        let spec = parse_column_spec("   ");
        assert!(spec.columns.is_empty());
        assert_eq!(spec.primary_key, "");
        assert_eq!(spec.resolved_primary_key(), None);
    }

    #[test]
    fn tolerates_irregular_whitespace() {
        let spec = parse_column_spec("  id   INTEGER   PRIMARY\n  KEY ,\n\tname\tTEXT  ");
        assert_eq!(names(&spec), ["id", "name"]);
        assert_eq!(spec.primary_key, "id");
    }

    #[test]
    fn commas_inside_type_arguments_do_not_split() {
        let spec = parse_column_spec("sku TEXT PRIMARY KEY, price DECIMAL(10, 2), qty INT");
        assert_eq!(names(&spec), ["sku", "price", "qty"]);
    }

    #[test]
    fn table_constraints_are_not_columns() {
        let spec = parse_column_spec(
            "a INT, b TEXT, PRIMARY KEY (b), FOREIGN KEY (a) REFERENCES other(id)",
        );
        assert_eq!(names(&spec), ["a", "b"]);
        assert_eq!(spec.primary_key, "b");

        let composite = parse_column_spec("a INT, b INT, PRIMARY KEY (a, b)");
        assert_eq!(composite.resolved_primary_key(), Some("a"));
    }

    #[test]
    fn quoted_names_are_unwrapped() {
        let spec = parse_column_spec("\"id\" INTEGER PRIMARY KEY, `label` TEXT, [qty] INT");
        assert_eq!(names(&spec), ["id", "label", "qty"]);
        assert_eq!(spec.primary_key, "id");
    }

    #[test]
    fn duplicate_names_are_dropped() {
        let spec = parse_column_spec("a INT, a TEXT, b INT");
        assert_eq!(names(&spec), ["a", "b"]);
    }

    #[test]
    fn extracts_fragment_from_stored_sql() {
        let sql = "CREATE TABLE \"items\" (id INTEGER PRIMARY KEY, label VARCHAR(20))";
        assert_eq!(
            extract_column_fragment(sql),
            Some("id INTEGER PRIMARY KEY, label VARCHAR(20)")
        );
        assert_eq!(extract_column_fragment("CREATE TABLE broken"), None);
    }

    #[test]
    fn skips_parentheses_inside_quoted_table_names() {
        let sql = "CREATE TABLE \"stock(2024)\" (sku TEXT PRIMARY KEY, qty INT)";
        assert_eq!(extract_column_fragment(sql), Some("sku TEXT PRIMARY KEY, qty INT"));

        let doubled = "CREATE TABLE \"a\"\"(b\" (x INT)";
        assert_eq!(extract_column_fragment(doubled), Some("x INT"));

        let bracketed = "CREATE TABLE [odd (name)] (y TEXT)";
        assert_eq!(extract_column_fragment(bracketed), Some("y TEXT"));
    }
}
