use std::fmt::{Display, Formatter};

/// An encoded `sysparm_query` filter for the Table API.
///
/// Clauses are joined with `^` (AND), `^OR` (OR) and `^ORDERBYDESC` exactly as
/// the Table API expects them; values are passed through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableQuery {
    encoded: String,
}

impl TableQuery {
    pub fn eq(field: &str, value: &str) -> Self {
        Self {
            encoded: format!("{field}={value}"),
        }
    }

    #[must_use]
    pub fn or_eq(self, field: &str, value: &str) -> Self {
        self.push("^OR", &format!("{field}={value}"))
    }

    #[must_use]
    pub fn and_eq(self, field: &str, value: &str) -> Self {
        self.push("^", &format!("{field}={value}"))
    }

    #[must_use]
    pub fn order_by_desc(self, field: &str) -> Self {
        self.push("^ORDERBYDESC", field)
    }

    fn push(mut self, separator: &str, clause: &str) -> Self {
        if !self.encoded.is_empty() {
            self.encoded.push_str(separator);
        } else if separator == "^ORDERBYDESC" {
            self.encoded.push_str("ORDERBYDESC");
        }
        self.encoded.push_str(clause);
        self
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl Display for TableQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encoded)
    }
}

/// Lower-cases a display name and replaces spaces with underscores, the way
/// ServiceNow derives `internal_name` from a title.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// OR-filter matching a variable set by any of the fields a human-readable
/// name can live in.
pub fn variable_set_by_name(name: &str) -> TableQuery {
    let normalized = normalize_name(name);
    let lower = name.to_lowercase();

    let mut query = TableQuery::eq("title", name)
        .or_eq("sys_name", name)
        .or_eq("name", name)
        .or_eq("internal_name", &normalized);
    if lower != normalized {
        query = query.or_eq("internal_name", &lower);
    }
    query
}
