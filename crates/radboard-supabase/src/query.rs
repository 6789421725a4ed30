//! Query-string helpers for the row store.
//!
//! The row store filters with `column=op.value` query parameters. Only the
//! operators this client actually issues are modeled.

/// A single column filter.
#[derive(Debug, Clone)]
pub struct Filter {
    column: String,
    rendered: String,
}

impl Filter {
    /// `column=eq.value`
    pub fn eq(column: impl Into<String>, value: impl AsRef<str>) -> Self {
        Self {
            column: column.into(),
            rendered: format!("eq.{}", value.as_ref()),
        }
    }

    /// `column=in.("a","b",...)`; values are quoted so commas in data cannot
    /// split the list.
    pub fn is_in<S: AsRef<str>>(column: impl Into<String>, values: &[S]) -> Self {
        let quoted: Vec<String> = values
            .iter()
            .map(|v| format!("\"{}\"", v.as_ref().replace('"', "")))
            .collect();
        Self {
            column: column.into(),
            rendered: format!("in.({})", quoted.join(",")),
        }
    }

    /// Render as a query pair, with the value side percent-encoded.
    pub(crate) fn to_query_pair(&self) -> String {
        format!("{}={}", self.column, urlencoding::encode(&self.rendered))
    }
}

/// Result ordering, rendered as `order=column.asc|desc`.
#[derive(Debug, Clone)]
pub struct Order {
    column: String,
    descending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    pub(crate) fn to_query_pair(&self) -> String {
        let direction = if self.descending { "desc" } else { "asc" };
        format!("order={}.{}", self.column, direction)
    }
}
