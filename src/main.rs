use anyhow::Result;
use clap::Parser;
use proxyip_checker::{
    checker::{DEFAULT_CONCURRENCY, DEFAULT_RESOLVER_HOST, DEFAULT_RESOLVER_PATH},
    client::DEFAULT_TIMEOUT_MS,
    CandidateParser, CheckerConfig, ProxyChecker, DEFAULT_COUNTRY_MAP_PATH, DEFAULT_INPUT_PATH,
    DEFAULT_PROXY_LIST_PATH,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Verify relay candidates and group the working ones by country
#[derive(Parser)]
#[command(name = "proxyip-checker")]
#[command(about = "Verify relay candidates and group the working ones by country")]
struct Cli {
    /// Candidate list (address,port,country,org per line)
    #[arg(short, long, default_value = DEFAULT_INPUT_PATH)]
    input: PathBuf,

    /// Output file for the country to relays mapping
    #[arg(long, default_value = DEFAULT_COUNTRY_MAP_PATH)]
    country_map: PathBuf,

    /// Output file for the flat list of working relays
    #[arg(long, default_value = DEFAULT_PROXY_LIST_PATH)]
    proxy_list: PathBuf,

    /// Maximum number of concurrent verifications
    #[arg(short = 'n', long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Timeout for each request in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Reference endpoint host
    #[arg(long, default_value = DEFAULT_RESOLVER_HOST)]
    resolver_host: String,

    /// Reference endpoint path
    #[arg(long, default_value = DEFAULT_RESOLVER_PATH)]
    resolver_path: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut candidates = Vec::new();
    for record in CandidateParser::parse_file(&cli.input)? {
        match record {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => warn!(error = %e, "skipping candidate record"),
        }
    }

    println!("Checking {} proxies...", candidates.len());

    let config = CheckerConfig::new()
        .with_concurrency(cli.concurrency)
        .with_timeout(Duration::from_millis(cli.timeout_ms))
        .with_resolver(cli.resolver_host, cli.resolver_path);
    info!(
        concurrency = config.concurrency,
        timeout_ms = cli.timeout_ms,
        resolver = %config.resolver_host,
        "starting verification"
    );

    let checker = ProxyChecker::with_config(config)?;
    let state = checker.check_proxies(candidates).await;

    state.save_country_map(&cli.country_map)?;
    state.save_proxy_list(&cli.proxy_list)?;
    info!(
        working = state.working(),
        failed = state.failed,
        countries = state.by_country.len(),
        "results saved"
    );

    println!("Proxy checking completed!");
    Ok(())
}
