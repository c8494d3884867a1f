use anyhow::Result;
use axum::Router;
use clap::Parser;
use server::{build_app, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Folder holding the body/, title/ and anchor/ indexes
    #[arg(long, default_value = "./index")]
    index_root: PathBuf,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// bincode map of document id to title
    #[arg(long)]
    titles: Option<PathBuf>,
    /// gzip CSV of `doc_id,pagerank`
    #[arg(long)]
    pagerank: Option<PathBuf>,
    /// bincode map of document id to page views
    #[arg(long)]
    pageviews: Option<PathBuf>,
    /// GloVe-format word vectors
    #[arg(long)]
    embeddings: Option<PathBuf>,
    /// Expand /search queries with embedding neighbours
    #[arg(long, default_value_t = false)]
    expand_search: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = ServerConfig {
        index_root: args.index_root,
        titles: args.titles,
        pagerank: args.pagerank,
        pageviews: args.pageviews,
        embeddings: args.embeddings,
        expand_search: args.expand_search,
    };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
