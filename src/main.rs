use anyhow::{Context, Result};
use solver_sim::{config::AppConfig, models::TradeIntent, runner::Simulator, utils};
use std::io::Read;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let config = AppConfig::load()?;
    tracing::info!(
        quote_base_url = %config.quote_base_url,
        quote_currency = %config.quote_currency,
        max_simulations = config.max_simulations,
        seeded = config.seed.is_some(),
        "[INIT] solver-sim starting"
    );

    // Intent JSON from the first argument, or stdin when absent.
    let raw = match std::env::args().nth(1) {
        Some(path) => {
            std::fs::read_to_string(&path).with_context(|| format!("reading intent from {path}"))?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading intent from stdin")?;
            buf
        }
    };
    let intent: TradeIntent = serde_json::from_str(&raw).context("parsing trade intent")?;
    intent.validate(config.max_simulations)?;

    let mut simulator = Simulator::from_config(&config);
    let report = simulator.run(&intent).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
