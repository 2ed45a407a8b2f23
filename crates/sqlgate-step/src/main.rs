mod step;

use clap::Parser;
use sqlgate_proxy::ProxyOptions;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "sqlgate-step",
    about = "Runs a SQL batch against a managed database through a supervised local proxy"
)]
struct Args {
    /// Path to the proxy binary.
    #[arg(long, default_value = "/opt/resource/cloud-sql-proxy")]
    proxy_binary: PathBuf,

    /// Directory where the proxy binds its per-instance Unix sockets.
    #[arg(long, default_value = "/cloudsql")]
    socket_dir: PathBuf,

    /// Seconds to wait for the proxy to report readiness.
    #[arg(long, default_value_t = 5)]
    ready_timeout_secs: u64,
}

impl Args {
    fn proxy_options(&self) -> ProxyOptions {
        ProxyOptions {
            binary: self.proxy_binary.clone(),
            socket_dir: self.socket_dir.clone(),
            ready_timeout: Duration::from_secs(self.ready_timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() {
    // Diagnostics and query-result lines go to stderr; stdout carries only
    // the JSON result document.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("failed to install tracing subscriber");
    }

    let args = Args::parse();
    if let Err(err) = step::run(args.proxy_options()).await {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
}
