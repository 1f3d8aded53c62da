//! standards_client - CLI client for the standards API.

pub mod cli;
pub mod client;
pub mod error;
pub mod output;

pub use client::StandardsClient;
pub use error::{ClientError, Result};
