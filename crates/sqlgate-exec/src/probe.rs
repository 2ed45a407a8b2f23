use sqlgate_core::{GateError, SourceConfig};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};
use std::path::Path;
use tracing::info;

/// Opens a connection through the proxy's Unix socket and confirms liveness
/// with a ping. The socket path is `<socket_dir>/<host>`, matching where the
/// proxy binds each instance. No retry: one failure is terminal.
pub async fn probe(source: &SourceConfig, socket_dir: &Path) -> Result<MySqlConnection, GateError> {
    let socket = socket_dir.join(&source.host);
    let options = MySqlConnectOptions::new()
        .socket(&socket)
        .username(&source.user)
        .password(&source.pass)
        .database(&source.database);

    let mut conn = options
        .connect()
        .await
        .map_err(|err| GateError::Probe(format!("connect via {}: {err}", socket.display())))?;

    if let Err(err) = conn.ping().await {
        // Release the half-open connection before surfacing the failure.
        let _ = conn.close().await;
        return Err(GateError::Probe(format!("ping: {err}")));
    }

    info!(
        "database connection verified through {}",
        socket.display()
    );
    Ok(conn)
}

/// Gracefully releases a connection. Failures are ignored: teardown must
/// not mask the error the invocation is already propagating.
pub async fn close(conn: MySqlConnection) {
    let _ = conn.close().await;
}
