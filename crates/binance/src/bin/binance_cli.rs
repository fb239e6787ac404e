use anyhow::Result;
use binance::BinanceRestClient;
use bot_core::config::{AppConfig, CONFIG};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "binance-cli", about = "Standalone Binance API probe", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Query the current Binance server time
    Time,
    /// Query the latest price of a trading pair
    Price {
        /// Pair symbol, e.g. BTCUSDT
        #[arg(long, short = 's')]
        symbol: String,
    },
    /// Query the LOT_SIZE trading rule of a pair
    Rules {
        /// Pair symbol, e.g. BTCUSDT
        #[arg(long, short = 's')]
        symbol: String,
    },
    /// List spot balances with a non-zero free or locked amount
    Balances,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let config: &AppConfig = &CONFIG;
    let client = BinanceRestClient::from_config(config)?;

    match cli.command {
        Command::Time => {
            let server_time = client.get_server_time().await?;
            println!("{}", server_time);
        }
        Command::Price { symbol } => {
            let ticker = client.get_symbol_price(&symbol.to_uppercase()).await?;
            println!("{}", serde_json::to_string_pretty(&ticker)?);
        }
        Command::Rules { symbol } => {
            let info = client.get_symbol_info(&symbol.to_uppercase()).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Balances => {
            let account = client.get_account().await?;
            let held: Vec<_> = account
                .balances
                .into_iter()
                .filter(|entry| !is_zero(&entry.free) || !is_zero(&entry.locked))
                .collect();
            println!("{}", serde_json::to_string_pretty(&held)?);
        }
    }

    Ok(())
}

fn is_zero(amount: &str) -> bool {
    amount.parse::<f64>().map(|value| value == 0.0).unwrap_or(false)
}

fn init_tracing() -> Result<()> {
    if tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .finish(),
    )
    .is_err()
    {
        // tracing already initialised; ignore.
    }
    Ok(())
}
