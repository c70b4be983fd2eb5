pub mod cache;
pub mod traits;

// Quote source implementations
pub mod tencent;
