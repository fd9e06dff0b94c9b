// Public modules
pub mod config;
pub mod dataset;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod etl;
pub mod etl_flow;
pub mod paths;
pub mod pipeline;
pub mod selection;
pub mod transform_flow;

// Internal modules - not part of public API
pub(crate) mod local_files;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
pub use selection::Selection;
