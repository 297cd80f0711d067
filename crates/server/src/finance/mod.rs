//! Finance Service Layer
//!
//! Income, expense and transaction records, the aggregates computed over
//! them, and the financial advice proxy.

pub mod advisor;
pub mod handlers;
pub mod records;
pub mod store;
pub mod summary;

pub use handlers::router;
