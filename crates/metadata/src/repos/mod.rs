//! Repository traits for catalog operations.

pub mod books;

pub use books::{BookRepo, StoredBook};
