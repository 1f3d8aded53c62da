//! SQLite storage backend implementation.
//!
//! Every entity kind lives in one `documents` table with its data as JSON;
//! searches compile to SQL over `json_extract`, `json_type` and `json_each`.

mod conversions;
mod error;
mod query;
mod repository;
mod schema;

pub use repository::SqliteRepository;
