pub mod error;
pub mod events;
pub mod health;
pub mod resources;

pub use error::AppError;
