//! Resource CLI arguments.

use clap::Args;
use serde_json::Value;

use standards_core::domain::EntityKind;
use standards_core::query::QueryParameters;

use crate::error::{ClientError, Result};

/// Arguments of `list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    pub resource: EntityKind,
    /// Filter as field:op:value (eq, ne, gt, gte, lt, lte, contains, starts_with). Repeatable.
    #[arg(long = "filter", short = 'f')]
    pub filters: Vec<String>,
    /// Comma-separated sort fields, `-` prefix for descending.
    #[arg(long)]
    pub sort: Option<String>,
    /// Case-insensitive text search across text fields.
    #[arg(long)]
    pub search: Option<String>,
    /// Page number, starting at 1.
    #[arg(long)]
    pub page: Option<u32>,
    /// Records per page.
    #[arg(long)]
    pub page_size: Option<u32>,
}

impl ListArgs {
    /// Query parameters when any were given; `None` lists everything.
    pub fn query(&self) -> Result<Option<QueryParameters>> {
        let mut pairs: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|f| ("filter".to_string(), f.clone()))
            .collect();
        if let Some(sort) = &self.sort {
            pairs.push(("sort".to_string(), sort.clone()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("page_size".to_string(), page_size.to_string()));
        }

        if pairs.is_empty() {
            return Ok(None);
        }
        QueryParameters::from_pairs(pairs)
            .map(Some)
            .map_err(|e| ClientError::InvalidInput(e.to_string()))
    }
}

/// Parses `--data`: inline JSON, or `@path` to read a file.
pub fn parse_data(data: &str) -> Result<Value> {
    let text = match data.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)?,
        None => data.to_string(),
    };
    serde_json::from_str(&text).map_err(|e| ClientError::InvalidInput(format!("invalid JSON: {e}")))
}
