use crate::error::GateError;
use serde::{Deserialize, Serialize};

/// Version token reported in every success payload. The step has no real
/// versioning concept; the caller only checks for presence.
pub const VERSION_TOKEN: &str = "static";

/// Rendering of a NULL cell in query result logs.
pub const NULL_TOKEN: &str = "<nil>";

/// Delimiter between column names and between row cells in result logs.
pub const FIELD_DELIMITER: &str = " | ";

/// The step's input document, read once from stdin.
#[derive(Debug, Clone, Deserialize)]
pub struct StepInput {
    pub source: SourceConfig,
    #[serde(default)]
    pub params: StepParams,
}

/// Immutable descriptor of the database target: proxy instance name,
/// credentials, and the inline credential payload handed to the proxy.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub user: String,
    pub pass: String,
    pub host: String,
    pub database: String,
    pub private_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepParams {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub value: String,
}

/// The step's output document, written once to stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutput {
    pub version: Version,
    pub metadata: Vec<Metadata>,
}

impl StepOutput {
    /// The fixed success payload: static version token, empty metadata.
    pub fn fixed() -> Self {
        Self {
            version: Version {
                version: VERSION_TOKEN.to_string(),
            },
            metadata: Vec::new(),
        }
    }
}

impl StepInput {
    pub fn validate(&self) -> Result<(), GateError> {
        if self.source.host.trim().is_empty() {
            return Err(GateError::Input("source.host must not be empty".into()));
        }
        if self.source.database.trim().is_empty() {
            return Err(GateError::Input("source.database must not be empty".into()));
        }
        Ok(())
    }
}

/// A single decoded query result cell. Decoding is lossy by design: these
/// values exist to be rendered into log lines, not to round-trip data.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bytes(Vec<u8>),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl CellValue {
    /// Total rendering: never fails, regardless of column type.
    pub fn render(&self) -> String {
        match self {
            CellValue::Null => NULL_TOKEN.to_string(),
            CellValue::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            CellValue::Int(v) => v.to_string(),
            CellValue::UInt(v) => v.to_string(),
            CellValue::Float(v) => v.to_string(),
            CellValue::Bool(v) => v.to_string(),
            CellValue::Text(v) => v.clone(),
        }
    }
}
