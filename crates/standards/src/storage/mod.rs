//! Storage backend implementations.
//!
//! Concrete implementations of `standards_core::storage::DocumentRepository`
//! and `OutboxStore`, selected at compile time via feature flags:
//!
//! - `inmemory` (default): maps behind one lock, lost on restart
//! - `sqlite`: SQLite database using `rusqlite` and `tokio-rusqlite`
//!
//! These features are mutually exclusive. Either backend can be wrapped in
//! [`CachedDocumentRepository`].
//!
//! Build with SQLite:
//! ```bash
//! cargo build -p standards --no-default-features --features sqlite,memory
//! ```

#[cfg(all(feature = "inmemory", feature = "sqlite"))]
compile_error!(
    "Features 'inmemory' and 'sqlite' are mutually exclusive. \
    Enable only one storage backend at a time."
);

#[cfg(not(any(feature = "inmemory", feature = "sqlite")))]
compile_error!(
    "No storage backend selected. Enable 'inmemory' or 'sqlite' feature. \
    Example: cargo build -p standards --features sqlite"
);

mod cached;

// The in-memory backend doubles as the test repository for every feature set.
#[cfg(any(feature = "inmemory", test))]
pub mod inmemory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use cached::CachedDocumentRepository;

#[cfg(any(feature = "inmemory", test))]
#[allow(unused_imports)]
pub use inmemory::InMemoryRepository;

#[cfg(feature = "sqlite")]
#[allow(unused_imports)]
pub use sqlite::SqliteRepository;
