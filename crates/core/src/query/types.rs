use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::QueryError;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Fields stored alongside the entity data rather than inside it.
pub const RECORD_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Comparison applied by a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    StartsWith,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Contains => "contains",
            FilterOp::StartsWith => "starts_with",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOp {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(FilterOp::Eq),
            "ne" => Ok(FilterOp::Ne),
            "gt" => Ok(FilterOp::Gt),
            "gte" => Ok(FilterOp::Gte),
            "lt" => Ok(FilterOp::Lt),
            "lte" => Ok(FilterOp::Lte),
            "contains" => Ok(FilterOp::Contains),
            "starts_with" => Ok(FilterOp::StartsWith),
            other => Err(QueryError::UnknownOperator(other.to_string())),
        }
    }
}

/// How a filter literal was typed when parsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    Text,
}

/// A filter operand. The raw text is always kept: string fields compare
/// against it regardless of how the literal was typed.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterValue {
    pub raw: String,
    pub literal: Literal,
}

impl FilterValue {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let literal = match raw.as_str() {
            "null" => Literal::Null,
            "true" => Literal::Bool(true),
            "false" => Literal::Bool(false),
            s => match s.parse::<f64>() {
                Ok(n) if n.is_finite() => Literal::Number(n),
                _ => Literal::Text,
            },
        };
        Self { raw, literal }
    }
}

/// `field op value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: FilterValue,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Result<Self, QueryError> {
        let field = field.into();
        validate_field(&field)?;
        Ok(Self {
            field,
            op,
            value: FilterValue::parse(value),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
}

impl SortField {
    /// Parses `"name"` (ascending) or `"-name"` (descending).
    pub fn parse(s: &str) -> Result<Self, QueryError> {
        let (field, direction) = match s.strip_prefix('-') {
            Some(field) => (field, SortDirection::Desc),
            None => (s.strip_prefix('+').unwrap_or(s), SortDirection::Asc),
        };
        validate_field(field)?;
        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Asc => write!(f, "{}", self.field),
            SortDirection::Desc => write!(f, "-{}", self.field),
        }
    }
}

/// Filter, sort and paging for a search over one entity kind.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParameters {
    pub filters: Vec<Filter>,
    pub sort: Vec<SortField>,
    pub search: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for QueryParameters {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            sort: Vec::new(),
            search: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QueryParameters {
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_sort(mut self, sort: SortField) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Number of records skipped before the current page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, params: &QueryParameters) -> Self {
        let page_size = params.page_size.max(1);
        Self {
            items,
            total,
            page: params.page,
            page_size,
            total_pages: total.div_ceil(u64::from(page_size)),
        }
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        })
    }
}

/// Field names must be lowercase identifiers: they end up inside SQL JSON paths.
pub fn validate_field(field: &str) -> Result<(), QueryError> {
    let mut chars = field.chars();
    let valid = field.len() <= 64
        && chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(QueryError::InvalidField(field.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_value_typing() {
        assert_eq!(FilterValue::parse("null").literal, Literal::Null);
        assert_eq!(FilterValue::parse("true").literal, Literal::Bool(true));
        assert_eq!(FilterValue::parse("2.5").literal, Literal::Number(2.5));
        assert_eq!(FilterValue::parse("-3").literal, Literal::Number(-3.0));
        assert_eq!(FilterValue::parse("inf").literal, Literal::Text);
        assert_eq!(FilterValue::parse("NaN").literal, Literal::Text);
        assert_eq!(FilterValue::parse("Room 1").literal, Literal::Text);
        assert_eq!(FilterValue::parse("101").raw, "101");
    }

    #[test]
    fn test_validate_field() {
        assert!(validate_field("name").is_ok());
        assert!(validate_field("floor_id").is_ok());
        assert!(validate_field("x1").is_ok());
        assert!(validate_field("").is_err());
        assert!(validate_field("1name").is_err());
        assert!(validate_field("Name").is_err());
        assert!(validate_field("name') OR 1=1 --").is_err());
        assert!(validate_field(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_sort_field_parse() {
        let sort = SortField::parse("-name").unwrap();
        assert_eq!(sort.direction, SortDirection::Desc);
        assert_eq!(sort.field, "name");
        assert_eq!(sort.to_string(), "-name");
        assert_eq!(SortField::parse("+number").unwrap().direction, SortDirection::Asc);
        assert!(SortField::parse("-").is_err());
    }

    #[test]
    fn test_page_totals() {
        let params = QueryParameters::default().with_page(2, 10);
        let page = Page::new(vec![1, 2, 3], 23, &params);
        assert_eq!(page.total_pages, 3);
        assert_eq!(params.offset(), 10);

        let empty: Page<i32> = Page::new(vec![], 0, &params);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_page_try_map() {
        let params = QueryParameters::default();
        let page = Page::new(vec!["1", "2"], 2, &params);
        let mapped: Page<i32> = page.try_map(|s| s.parse::<i32>()).unwrap();
        assert_eq!(mapped.items, vec![1, 2]);
        assert_eq!(mapped.total, 2);
    }
}
