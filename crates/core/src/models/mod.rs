pub mod document;
pub mod holding;
pub mod snapshot;
pub mod summary;
