pub mod batch;
pub mod error;
pub mod types;

pub use batch::split_statements;
pub use error::GateError;
pub use types::{CellValue, Metadata, SourceConfig, StepInput, StepOutput, StepParams, Version};
pub use types::{FIELD_DELIMITER, NULL_TOKEN, VERSION_TOKEN};

#[cfg(test)]
mod tests;
