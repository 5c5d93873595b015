//! pump-scraper - pump.fun token scraper
//!
//! Scrapes the pump.fun listing, attaches pool pricing, and writes the
//! filtered records as JSON lines.

use anyhow::Result;

use pump_scraper::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (API URL overrides go here)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}
