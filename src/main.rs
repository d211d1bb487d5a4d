use clap::Parser;
use label_showcase_lib::config::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("label-showcase v{}", env!("CARGO_PKG_VERSION"));

    label_showcase_lib::run(cli).await?;
    Ok(())
}
