//! Builder for the query expressions consumed by the omics backend.
//!
//! The backend's listing endpoint takes a honeysql-style string such as
//! `{:select [:*] :from [:kegg_pathway] :order-by [:pathway_id] :where
//! [:like :gene_symbol "%BRCA1%"]}`. This module renders that string from
//! table state (substring filters plus an optional sort) and is the only
//! place the notation is spelled out.

use crate::error::OmicsBrowseError;

/// Fixed select/from head of every listing query.
const QUERY_HEAD: &str = ":select [:*] :from [:kegg_pathway]";

/// Page-control keys that may travel in a filter bag but must never become
/// predicates. Matched case-sensitively.
const RESERVED_PARAM_KEYS: [&str; 2] = ["current", "pageSize"];

/// Sort direction for a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascend,
    Descend,
}

/// Renders the backend query for one page of the pathway table.
///
/// `filters` maps field names to substring values in input order; entries
/// with reserved page-control names or empty values are skipped. `sort`
/// honors only its first entry: the table sorts one column at a time.
///
/// Both clauses are optional and the head is always present, so the empty
/// query renders as `{:select [:*] :from [:kegg_pathway]  }`. Callers that
/// cache or compare query strings rely on identical inputs producing
/// identical output, so iteration order here is the caller's input order
/// and nothing is re-sorted.
pub(crate) fn build_pathway_query(
    filters: &[(String, String)],
    sort: &[(String, SortOrder)],
) -> Result<String, OmicsBrowseError> {
    let order_by = order_by_clause(sort)?;
    let where_ = where_clause(filters)?;
    Ok(format!("{{{QUERY_HEAD} {order_by} {where_}}}"))
}

fn order_by_clause(sort: &[(String, SortOrder)]) -> Result<String, OmicsBrowseError> {
    let Some((field, order)) = sort.first() else {
        return Ok(String::new());
    };
    if field.is_empty() {
        return Ok(String::new());
    }
    ensure_keyword_safe("sort", field)?;
    Ok(match order {
        SortOrder::Ascend => format!(":order-by [:{field}]"),
        SortOrder::Descend => format!(":order-by [[:{field} :desc]]"),
    })
}

fn where_clause(filters: &[(String, String)]) -> Result<String, OmicsBrowseError> {
    let mut predicates = Vec::new();
    for (field, value) in filters {
        if RESERVED_PARAM_KEYS.contains(&field.as_str()) || value.is_empty() {
            continue;
        }
        ensure_keyword_safe("filter", field)?;
        predicates.push(format!(
            "[:like :{field} \"%{}%\"]",
            escape_query_value(value)
        ));
    }
    Ok(match predicates.len() {
        0 => String::new(),
        1 => format!(":where {}", predicates[0]),
        _ => format!(":where [:and {}]", predicates.join(" ")),
    })
}

/// Escapes a user-provided value for interpolation into a double-quoted
/// string literal of the query notation.
///
/// Only `"` and `\` can break out of the literal. Brackets inside a quoted
/// string are inert, and `\[` is not a valid escape in the notation, so they
/// pass through untouched.
fn escape_query_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Field names become keywords in the query, outside any string literal, so
/// they are held to a strict charset instead of being escaped.
fn ensure_keyword_safe(what: &str, field: &str) -> Result<(), OmicsBrowseError> {
    let safe = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if safe {
        return Ok(());
    }
    Err(OmicsBrowseError::InvalidArgument(format!(
        "{what} field {field:?} must contain only letters, numbers, '_' or '-'"
    )))
}
