pub mod executor;
pub mod probe;

pub use executor::execute_batch;
pub use probe::{close, probe};
pub use sqlx::mysql::MySqlConnection;
