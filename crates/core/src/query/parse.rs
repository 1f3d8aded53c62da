//! Query-string form of [`QueryParameters`].
//!
//! ```text
//! filter=name:contains:lab&filter=floors_count:gte:2&sort=-name,id&search=north&page=2&page_size=10
//! ```

use url::form_urlencoded;

use super::{
    Filter, FilterOp, FilterValue, QueryError, QueryParameters, SortField, MAX_PAGE_SIZE,
};

impl QueryParameters {
    /// Parses a raw query string. Unknown keys are ignored.
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        Self::from_pairs(form_urlencoded::parse(raw.as_bytes()).into_owned())
    }

    pub fn from_pairs<I>(pairs: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = QueryParameters::default();

        for (key, value) in pairs {
            match key.as_str() {
                "filter" => params.filters.push(parse_filter(&value)?),
                "sort" => {
                    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                        params.sort.push(SortField::parse(part)?);
                    }
                }
                "search" | "q" => {
                    let search = value.trim();
                    params.search = (!search.is_empty()).then(|| search.to_string());
                }
                "page" => {
                    params.page = value
                        .parse::<u32>()
                        .ok()
                        .filter(|p| *p >= 1)
                        .ok_or(QueryError::InvalidPage(value))?;
                }
                "page_size" => {
                    params.page_size = value
                        .parse::<u32>()
                        .ok()
                        .filter(|s| (1..=MAX_PAGE_SIZE).contains(s))
                        .ok_or(QueryError::InvalidPageSize(value))?;
                }
                _ => {}
            }
        }

        Ok(params)
    }

    /// Canonical query string: equivalent parameters produce the same text.
    ///
    /// Filters are order-independent (they are ANDed) so they are sorted;
    /// sort fields are not.
    pub fn fingerprint(&self) -> String {
        let mut filters: Vec<String> = self
            .filters
            .iter()
            .map(|f| format!("{}:{}:{}", f.field, f.op, f.value.raw))
            .collect();
        filters.sort();

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for filter in &filters {
            serializer.append_pair("filter", filter);
        }
        if !self.sort.is_empty() {
            let sort: Vec<String> = self.sort.iter().map(ToString::to_string).collect();
            serializer.append_pair("sort", &sort.join(","));
        }
        if let Some(search) = &self.search {
            serializer.append_pair("search", search);
        }
        serializer.append_pair("page", &self.page.to_string());
        serializer.append_pair("page_size", &self.page_size.to_string());
        serializer.finish()
    }
}

/// Parses `field:op:value`. The value may itself contain `:`.
fn parse_filter(s: &str) -> Result<Filter, QueryError> {
    let mut parts = s.splitn(3, ':');
    let (Some(field), Some(op), Some(value)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(QueryError::MalformedFilter(s.to_string()));
    };
    let op: FilterOp = op.parse()?;
    let mut filter = Filter::new(field, op, "")?;
    filter.value = FilterValue::parse(value);
    Ok(filter)
}
