use sqlgate_core::{GateError, StepInput, StepOutput};
use sqlgate_exec::MySqlConnection;
use sqlgate_proxy::{ProxyHandle, ProxyOptions};
use tokio::io::AsyncReadExt;

/// One full invocation: decode input, supervise the proxy to readiness,
/// probe connectivity, run the optional batch, emit the result payload.
/// The proxy is signaled on every exit path once it has been launched.
pub async fn run(options: ProxyOptions) -> anyhow::Result<()> {
    let input = read_input().await?;

    let mut proxy = sqlgate_proxy::launch(&input.source, &options)?;
    let result = drive(&input, &options, &mut proxy).await;
    proxy.shutdown().await;
    result
}

async fn drive(
    input: &StepInput,
    options: &ProxyOptions,
    proxy: &mut ProxyHandle,
) -> anyhow::Result<()> {
    proxy.await_ready().await?;

    let mut conn = sqlgate_exec::probe(&input.source, &options.socket_dir).await?;
    let outcome = run_batch(&mut conn, input).await;
    sqlgate_exec::close(conn).await;
    outcome?;

    write_output(&StepOutput::fixed())?;
    Ok(())
}

async fn run_batch(conn: &mut MySqlConnection, input: &StepInput) -> Result<(), GateError> {
    if input.params.query.trim().is_empty() {
        return Ok(());
    }
    sqlgate_exec::execute_batch(conn, &input.params.query).await
}

async fn read_input() -> Result<StepInput, GateError> {
    let mut raw = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw)
        .await
        .map_err(|err| GateError::Input(format!("read stdin: {err}")))?;
    let input: StepInput = serde_json::from_str(&raw)
        .map_err(|err| GateError::Input(format!("decode step input: {err}")))?;
    input.validate()?;
    Ok(input)
}

fn write_output(output: &StepOutput) -> Result<(), GateError> {
    let encoded = serde_json::to_string_pretty(output)
        .map_err(|err| GateError::Serialization(err.to_string()))?;
    println!("{encoded}");
    Ok(())
}
