use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use techhub::config::{has_flag, Config, USAGE};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{USAGE}");
        return Ok(());
    }

    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let mut config = Config::from_env()?;
    config.apply_args(&args)?;

    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(target: "techhub", "TechHub starting: RUST_LOG='{}', config={:?}", rust_log, config);

    techhub::server::run(config).await
}
