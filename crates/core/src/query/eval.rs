//! In-memory evaluation of [`QueryParameters`] over flattened JSON records.
//!
//! The SQLite backend compiles the same parameters to SQL; both must agree on
//! the rules documented on each function here.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::{Filter, FilterOp, FilterValue, Literal, Page, QueryParameters, SortDirection, SortField, RECORD_FIELDS};

/// Filters, sorts and pages `items`. `view` returns the flattened record
/// (`id`, entity fields, `created_at`, `updated_at`) for an item.
pub fn apply<T, F>(items: Vec<T>, params: &QueryParameters, view: F) -> Page<T>
where
    F: Fn(&T) -> Map<String, Value>,
{
    let mut matching: Vec<(Map<String, Value>, T)> = items
        .into_iter()
        .map(|item| (view(&item), item))
        .filter(|(record, _)| matches(record, params))
        .collect();

    matching.sort_by(|(a, _), (b, _)| compare_records(a, b, &params.sort));

    let total = matching.len() as u64;
    let items = matching
        .into_iter()
        .skip(usize::try_from(params.offset()).unwrap_or(usize::MAX))
        .take(params.page_size as usize)
        .map(|(_, item)| item)
        .collect();

    Page::new(items, total, params)
}

/// True when the record satisfies every filter and the free-text search.
pub fn matches(record: &Map<String, Value>, params: &QueryParameters) -> bool {
    params.filters.iter().all(|f| filter_matches(record, f))
        && params
            .search
            .as_deref()
            .is_none_or(|search| search_matches(record, search))
}

/// Null values and missing fields are the same thing.
fn field<'a>(record: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    record.get(name).filter(|v| !v.is_null())
}

fn filter_matches(record: &Map<String, Value>, filter: &Filter) -> bool {
    let value = field(record, &filter.field);
    let operand = &filter.value;

    match filter.op {
        FilterOp::Eq => equals(value, operand),
        FilterOp::Ne => !equals(value, operand),
        FilterOp::Gt => compare(value, operand).is_some_and(Ordering::is_gt),
        FilterOp::Gte => compare(value, operand).is_some_and(Ordering::is_ge),
        FilterOp::Lt => compare(value, operand).is_some_and(Ordering::is_lt),
        FilterOp::Lte => compare(value, operand).is_some_and(Ordering::is_le),
        FilterOp::Contains => match value {
            Some(Value::String(s)) => contains_ignore_ascii_case(s, &operand.raw),
            Some(Value::Array(items)) => items
                .iter()
                .any(|item| equals(Some(item).filter(|v| !v.is_null()), operand)),
            _ => false,
        },
        FilterOp::StartsWith => match value {
            Some(Value::String(s)) => s
                .to_ascii_lowercase()
                .starts_with(&operand.raw.to_ascii_lowercase()),
            _ => false,
        },
    }
}

/// A null literal equals only missing/null values.
fn equals(value: Option<&Value>, operand: &FilterValue) -> bool {
    match operand.literal {
        Literal::Null => value.is_none(),
        _ => compare(value, operand) == Some(Ordering::Equal),
    }
}

/// Strings compare byte-wise against the raw operand text; numbers only
/// against numeric literals; booleans only against boolean literals.
fn compare(value: Option<&Value>, operand: &FilterValue) -> Option<Ordering> {
    match (value?, operand.literal) {
        (_, Literal::Null) => None,
        (Value::String(s), _) => Some(s.as_str().cmp(operand.raw.as_str())),
        (Value::Number(n), Literal::Number(x)) => n.as_f64()?.partial_cmp(&x),
        (Value::Bool(b), Literal::Bool(x)) => Some(b.cmp(&x)),
        _ => None,
    }
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

/// Search looks at top-level string fields of the entity, not at record fields.
fn search_matches(record: &Map<String, Value>, search: &str) -> bool {
    record
        .iter()
        .filter(|(key, _)| !RECORD_FIELDS.contains(&key.as_str()))
        .any(|(_, value)| matches!(value, Value::String(s) if contains_ignore_ascii_case(s, search)))
}

#[derive(Debug, PartialEq, PartialOrd)]
enum SortKey<'a> {
    Null,
    Number(f64),
    Text(Cow<'a, str>),
}

/// Nulls first, then numbers (booleans as 0/1), then text. Arrays and
/// objects sort by their JSON text.
fn sort_key(value: Option<&Value>) -> SortKey<'_> {
    match value {
        None | Some(Value::Null) => SortKey::Null,
        Some(Value::Bool(b)) => SortKey::Number(if *b { 1.0 } else { 0.0 }),
        Some(Value::Number(n)) => n.as_f64().map_or(SortKey::Null, SortKey::Number),
        Some(Value::String(s)) => SortKey::Text(Cow::Borrowed(s)),
        Some(other) => SortKey::Text(Cow::Owned(other.to_string())),
    }
}

fn compare_field(a: &Map<String, Value>, b: &Map<String, Value>, name: &str) -> Ordering {
    sort_key(a.get(name))
        .partial_cmp(&sort_key(b.get(name)))
        .unwrap_or(Ordering::Equal)
}

/// Orders by the requested fields, then by `id`. Without sort fields the
/// order is `created_at`, then `id`.
pub fn compare_records(a: &Map<String, Value>, b: &Map<String, Value>, sort: &[SortField]) -> Ordering {
    let default_sort = [SortField {
        field: "created_at".to_string(),
        direction: SortDirection::Asc,
    }];
    let sort = if sort.is_empty() { &default_sort[..] } else { sort };

    sort.iter()
        .map(|s| {
            let ordering = compare_field(a, b, &s.field);
            match s.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        })
        .find(|o| o.is_ne())
        .unwrap_or_else(|| compare_field(a, b, "id"))
}
