pub mod runner;
pub mod summary;

pub use runner::BatchRunner;
pub use summary::{ConversionResult, ConversionStatus, RunSummary};
