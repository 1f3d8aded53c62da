mod error;
mod http_mapping;
mod integrity;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use http_mapping::repository_error_to_status_code;
pub use integrity::{ensure_not_referenced, ensure_references_exist};
pub use traits::{DocumentRepository, OutboxStore};
pub use types::{format_timestamp, parse_timestamp, Document};
