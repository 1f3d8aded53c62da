mod error;
mod eval;
mod parse;
mod types;

pub use error::QueryError;
pub use eval::{apply, compare_records, matches};
pub use types::{
    validate_field, Filter, FilterOp, FilterValue, Literal, Page, QueryParameters, SortDirection,
    SortField, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, RECORD_FIELDS,
};
