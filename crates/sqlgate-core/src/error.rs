use thiserror::Error;

/// One variant per failure stage. Every variant is terminal for the
/// invocation; the step binary maps all of them to exit code 1.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("input error: {0}")]
    Input(String),
    #[error("proxy launch error: {0}")]
    Launch(String),
    #[error("proxy reported an error before becoming ready: {line}\nproxy output:\n{transcript}")]
    Readiness { line: String, transcript: String },
    #[error("timed out waiting for the proxy to become ready\nproxy output:\n{transcript}")]
    ReadyTimeout { transcript: String },
    #[error("proxy output closed before the ready marker appeared\nproxy output:\n{transcript}")]
    OutputClosed { transcript: String },
    #[error("probe error: {0}")]
    Probe(String),
    #[error("execution error: {0}")]
    Execution(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}
