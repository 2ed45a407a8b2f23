pub mod supervisor;

pub use supervisor::{launch, ProxyHandle, ProxyOptions, ERROR_MARKER, READY_MARKER};

#[cfg(test)]
mod tests;
