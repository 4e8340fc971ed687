use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;

#[derive(Parser)]
#[command(name = "card-relay", about = "Image relay for card sheet exports", version)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = card_relay::DEFAULT_BIND)]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    card_relay::run(cli.bind).await?;
    Ok(())
}
