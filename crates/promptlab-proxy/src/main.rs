use anyhow::Result;
use clap::Parser;
use promptlab_proxy::config::ProxyConfig;
use promptlab_proxy::server;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// listen address (overrides PROMPTLAB_PROXY_ADDR)
    #[arg(long)]
    addr: Option<String>,

    /// inference server base url (overrides PROMPTLAB_OLLAMA_URL)
    #[arg(long)]
    upstream: Option<String>,
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut cfg = ProxyConfig::from_env();
    if let Some(addr) = args.addr {
        cfg.addr = addr;
    }
    if let Some(url) = args.upstream {
        cfg.upstream_url = url;
    }

    init_logging(&cfg.log_level);
    server::run(cfg).await
}
