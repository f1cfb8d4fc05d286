//! Turns a [`SearchOptions`] descriptor into the SQL pair used to serve one
//! page of a table: the data statement and the matching `COUNT(*)`.
//!
//! The builder does not validate the table name or the search term. The
//! search term is a raw SQL predicate supplied by the user and is spliced in
//! after `WHERE` as-is; malformed fragments surface as database errors when
//! the statement runs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rows per page when the request does not say otherwise
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Comparison operators a structured filter may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    In,
    IsNull,
    IsNotNull,
}

/// A structured column filter.
///
/// Filters are part of the request model and the cache key, but the query
/// path only consumes `search_term` for now. How filters should combine
/// with a raw predicate is undecided, so they are never rendered into SQL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderBy {
    #[must_use]
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    #[must_use]
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Request descriptor for one page of table data
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
    /// 1-indexed; absent means the first page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl SearchOptions {
    /// Page number with the default applied. Page 0 is read as page 1.
    #[must_use]
    pub fn resolved_page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn resolved_page_size(&self) -> u32 {
        match self.page_size {
            Some(size) if size > 0 => size,
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    /// Row offset of the first row on the resolved page
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.resolved_page() - 1) * u64::from(self.resolved_page_size())
    }
}

/// A table reference with an optional schema prefix.
///
/// Only used to look up catalog metadata; statements keep the caller's
/// table string verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef<'a> {
    pub schema: Option<&'a str>,
    pub name: &'a str,
}

impl<'a> TableRef<'a> {
    #[must_use]
    pub fn parse(table: &'a str) -> Self {
        let table = table.trim();
        match table.split_once('.') {
            Some((schema, name)) if !schema.is_empty() && !name.is_empty() => {
                Self {
                    schema: Some(unquote(schema)),
                    name: unquote(name),
                }
            }
            _ => Self {
                schema: None,
                name: unquote(table),
            },
        }
    }
}

fn unquote(ident: &str) -> &str {
    ident
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(ident)
}

/// The statements that serve one page, plus the pagination actually used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    pub sql: String,
    pub count_sql: String,
    pub page: u32,
    pub page_size: u32,
}

/// `WHERE <term>` when the trimmed search term is non-empty
#[must_use]
pub fn where_clause(options: &SearchOptions) -> Option<String> {
    let term = options.search_term.trim();
    if term.is_empty() {
        None
    } else {
        Some(format!("WHERE {term}"))
    }
}

/// `ORDER BY a ASC, b DESC` in the given order, or nothing when unordered
#[must_use]
pub fn order_by_clause(options: &SearchOptions) -> Option<String> {
    if options.order_by.is_empty() {
        return None;
    }

    let keys = options
        .order_by
        .iter()
        .map(|order| format!("{} {}", order.column, order.direction))
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!("ORDER BY {keys}"))
}

/// Build the data and count statements for `table`
#[must_use]
pub fn build_data_query(table: &str, options: &SearchOptions) -> BuiltQuery {
    let page = options.resolved_page();
    let page_size = options.resolved_page_size();
    let where_sql = where_clause(options);

    let mut sql = format!("SELECT * FROM {table}");
    if let Some(clause) = &where_sql {
        sql.push(' ');
        sql.push_str(clause);
    }
    if let Some(clause) = order_by_clause(options) {
        sql.push(' ');
        sql.push_str(&clause);
    }
    sql.push_str(&format!(" LIMIT {page_size} OFFSET {}", options.offset()));

    let count_sql = where_sql.map_or_else(
        || format!("SELECT COUNT(*) FROM {table}"),
        |clause| format!("SELECT COUNT(*) FROM {table} {clause}"),
    );

    BuiltQuery {
        sql,
        count_sql,
        page,
        page_size,
    }
}
