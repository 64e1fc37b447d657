use clap::Parser;
use sarf_api::{start_server, ApiConfig};
use sarf_storage::Storage;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sarf-server", about = "Arabic morphology server")]
struct Cli {
    /// HTTP listening address
    #[arg(long, env = "SARF_ADDR", default_value = "0.0.0.0:8000")]
    addr: SocketAddr,

    /// Directory holding roots.json and patterns.json
    #[arg(long, env = "SARF_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Bucket count of the pattern hash table
    #[arg(long, env = "SARF_PATTERN_TABLE_SIZE", default_value = "101")]
    pattern_table_size: NonZeroUsize,

    /// Maximum request body size in bytes
    #[arg(long, env = "SARF_UPLOAD_LIMIT", default_value = "1048576")]
    upload_limit: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_observability();

    let cli = Cli::parse();
    info!(data_dir = %cli.data_dir.display(), "starting sarf server");

    let storage = Storage::open(&cli.data_dir)?;
    let lexicon = storage.load_lexicon(cli.pattern_table_size.get())?;
    info!(
        roots = lexicon.root_index().size(),
        patterns = lexicon.pattern_index().size(),
        table_size = lexicon.table_size(),
        "lexicon loaded"
    );

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
    };

    let config = ApiConfig {
        upload_limit: cli.upload_limit,
    };
    let listener = tokio::net::TcpListener::bind(cli.addr).await?;
    info!("listening on http://{}", cli.addr);
    start_server(listener, lexicon, storage, config, shutdown)
        .await
        .await??;

    info!("server stopped");
    Ok(())
}

fn init_observability() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .json();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,sarf_api=debug,sarf_core=debug".into());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();
}
