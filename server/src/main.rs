use anyhow::Result;
use beacon_core::IndexStore;
use beacon_index::scorer::HttpScorer;
use beacon_index::SearchIndex;
use beacon_server::{build_router, AppState};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

#[derive(Parser)]
#[command(name = "beacon-server")]
#[command(about = "Crawl, index and search the web over a JSON API")]
struct Args {
    /// Index database directory
    #[arg(long, default_value = "./beacon-db")]
    db: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Semantic scorer endpoint, e.g. http://127.0.0.1:50920/predict
    #[arg(long)]
    scorer: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let store = Arc::new(IndexStore::open(&args.db)?);
    let endpoint = args.scorer.as_deref().map(Url::parse).transpose()?;
    let scorer = HttpScorer::new(endpoint)?;
    let index = Arc::new(SearchIndex::new(store, scorer));
    let app = build_router(AppState::new(index));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
