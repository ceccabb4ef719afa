pub mod error;
pub mod field;
pub mod io;
pub mod math;
pub mod mesh;
pub mod operations;
pub mod pipeline;
pub mod render;

pub use error::{GridViewError, Result};
pub use pipeline::{Pipeline, PipelineConfig};
