//! Command-line entry point.
//!
//! Registers a user, uploads the given order numbers, and prints the
//! withdrawals the accrual service knows about as JSON.

use clap::Parser;
use loyalty_withdrawals::config::{AppConfig, ACCRUAL_ADDRESS_ENV};
use loyalty_withdrawals::lifecycle::{setup_tracing, LoyaltySystem};
use tracing::{error, info, Instrument};

#[derive(Debug, Parser)]
#[command(name = "loyalty-withdrawals", about = "Fetch withdrawal history from an accrual service")]
struct Args {
    /// Accrual service address (`host:port` or URL)
    #[arg(short = 'r', long = "accrual-address", env = ACCRUAL_ADDRESS_ENV)]
    accrual_address: Option<String>,

    /// Config file to read instead of `config/default`
    #[arg(short, long)]
    config: Option<String>,

    /// Login of the demo user the orders are uploaded for
    #[arg(long, default_value = "demo")]
    login: String,

    /// Order numbers to look up
    orders: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref()).map_err(|e| e.to_string())?;
    if let Some(address) = args.accrual_address {
        config = config.with_accrual_address(address);
        config.validate().map_err(|e| e.to_string())?;
    }

    let system = LoyaltySystem::new(&config).map_err(|e| e.to_string())?;

    let span = tracing::info_span!("upload", login = %args.login);
    let user_id = async {
        let user_id = system
            .store
            .register_user(&args.login)
            .await
            .map_err(|e| e.to_string())?;
        for order in &args.orders {
            system
                .store
                .upload_order(&user_id, order)
                .await
                .map_err(|e| e.to_string())?;
        }
        Ok::<_, String>(user_id)
    }
    .instrument(span)
    .await?;

    info!(%user_id, orders = args.orders.len(), "Orders uploaded");

    let result = system.withdrawals.get_user_withdrawals(&user_id).await;
    system.shutdown().await?;

    match result {
        Ok(withdrawals) => {
            let json = serde_json::to_string_pretty(&withdrawals).map_err(|e| e.to_string())?;
            println!("{json}");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Request failed");
            Err(e.to_string())
        }
    }
}
