//! CLI Command Handlers
//!
//! Implementation of the `run` and `explain` commands.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::adapters::dataset::JsonLinesSink;
use crate::application::{explain, publish, PumpScraper};
use crate::config::{expand_path, load_optional_config, Config};
use crate::domain::FilterArgs;

/// pump-scraper - pump.fun token scraper with pool pricing and filters
#[derive(Parser, Debug)]
#[command(
    name = "pump-scraper",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Scrape pump.fun token listings, enrich with pool pricing, and filter",
    long_about = "pump-scraper pages through the pump.fun coin listing, attaches \
                  GeckoTerminal pool pricing to graduated tokens, and keeps the \
                  records matching the filter arguments as a JSON-lines dataset."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape, filter, and write the dataset
    Run(RunCmd),

    /// Print the query the filter arguments compile to
    Explain(ExplainCmd),
}

/// Filter arguments shared by all commands
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON file holding the filter arguments object
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Set one argument (repeatable); the value is parsed as JSON when possible
    #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub set: Vec<(String, serde_json::Value)>,
}

impl InputArgs {
    /// Input file first, then `--set` overrides in order
    pub fn load(&self) -> Result<FilterArgs> {
        let mut args = match &self.input {
            Some(path) => read_input_file(path)?,
            None => FilterArgs::new(),
        };

        for (key, value) in &self.set {
            args.insert(key.clone(), value.clone());
        }

        Ok(args)
    }

    pub fn load_config(&self) -> Result<Config> {
        load_optional_config(self.config.as_deref()).context("Failed to load configuration")
    }
}

/// Scrape and write the dataset
#[derive(Parser, Debug)]
pub struct RunCmd {
    #[command(flatten)]
    pub input: InputArgs,

    /// Dataset output file (`-` for stdout); overrides `[scraper] output`
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Show the compiled filter
#[derive(Parser, Debug)]
pub struct ExplainCmd {
    #[command(flatten)]
    pub input: InputArgs,

    /// Print the query fragment as JSON
    #[arg(long)]
    pub json: bool,
}

/// Parse `key=value`, reading the value as JSON and falling back to a string
pub fn parse_key_value(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }

    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn read_input_file(path: &Path) -> Result<FilterArgs> {
    let path = expand_path(&path.to_string_lossy());
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read input file {}", path.display()))?;

    match serde_json::from_str::<serde_json::Value>(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?
    {
        serde_json::Value::Object(map) => Ok(map),
        _ => bail!("Input file {} must hold a JSON object", path.display()),
    }
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let input = match &app.command {
        Command::Run(cmd) => &cmd.input,
        Command::Explain(cmd) => &cmd.input,
    };
    let config = input.load_config()?;

    // Initialize logging based on flags
    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Run(cmd) => run_command(cmd, config).await,
        Command::Explain(cmd) => explain_command(cmd),
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool, level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    // stdout carries the dataset
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Handle run command
async fn run_command(cmd: RunCmd, config: Config) -> Result<()> {
    let args = cmd.input.load()?;
    tracing::info!("Starting scrape with {} arguments", args.len());

    let scraper = PumpScraper::from_config(&config).context("Failed to create scraper")?;
    let output = cmd.output.or_else(|| config.scraper.output_path());
    let sink = JsonLinesSink::from_output(output.as_deref());

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::warn!("Shutdown signal received"),
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await
            }
        }
    };

    let outcome = scraper.run_until(&args, shutdown).await;
    let pushed = publish(&sink, &outcome)
        .await
        .context("Failed to write dataset")?;

    match outcome {
        Ok(_) => {
            tracing::info!("Scrape complete: {} records", pushed);
            Ok(())
        }
        Err(error) => bail!("Scrape failed: {}", error),
    }
}

/// Handle explain command
fn explain_command(cmd: ExplainCmd) -> Result<()> {
    let args = cmd.input.load()?;
    let fragment = explain(&args).context("Failed to compile filter arguments")?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&fragment)?);
    } else {
        println!("{}", fragment.template);
        println!("bindings: {}", serde_json::to_string(&fragment.bindings)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_app_parse_run() {
        let args = vec!["pump-scraper", "run", "--config", "scraper.toml"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Run(cmd) => {
                assert_eq!(cmd.input.config, Some(PathBuf::from("scraper.toml")));
                assert!(cmd.input.set.is_empty());
                assert!(cmd.output.is_none());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_app_parse_run_with_sets() {
        let args = vec![
            "pump-scraper",
            "run",
            "--set",
            "limit=120",
            "-s",
            "is_graduated=true",
            "--set",
            "filter=pepe",
            "--output",
            "out.jsonl",
            "--verbose",
        ];
        let app = CliApp::try_parse_from(args).unwrap();
        assert!(app.verbose);

        match app.command {
            Command::Run(cmd) => {
                assert_eq!(
                    cmd.input.set,
                    vec![
                        ("limit".to_string(), json!(120)),
                        ("is_graduated".to_string(), json!(true)),
                        ("filter".to_string(), json!("pepe")),
                    ]
                );
                assert_eq!(cmd.output, Some(PathBuf::from("out.jsonl")));
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_app_parse_explain() {
        let args = vec!["pump-scraper", "explain", "--json", "--debug", "-s", "min_mkt_cap=5"];
        let app = CliApp::try_parse_from(args).unwrap();
        assert!(app.debug);

        match app.command {
            Command::Explain(cmd) => {
                assert!(cmd.json);
                assert_eq!(cmd.input.set.len(), 1);
            }
            _ => panic!("Expected Explain command"),
        }
    }

    #[test]
    fn test_cli_app_rejects_malformed_set() {
        let args = vec!["pump-scraper", "run", "--set", "no_equals_sign"];
        assert!(CliApp::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("limit=50").unwrap(), ("limit".into(), json!(50)));
        assert_eq!(parse_key_value("sort=market_cap").unwrap(), ("sort".into(), json!("market_cap")));
        assert_eq!(parse_key_value("symbol=[\"A\",\"B\"]").unwrap().1, json!(["A", "B"]));
        assert_eq!(parse_key_value("has_twitter=null").unwrap().1, json!(null));
        assert_eq!(parse_key_value("term=a=b").unwrap().1, json!("a=b"));
        assert!(parse_key_value("=5").is_err());
    }

    #[test]
    fn test_input_file_with_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{ "limit": 200, "is_graduated": "both", "min_mkt_cap": 1000 }"#)
            .unwrap();

        let input = InputArgs {
            config: None,
            input: Some(file.path().to_path_buf()),
            set: vec![("is_graduated".into(), json!(true))],
        };
        let args = input.load().unwrap();

        assert_eq!(args["limit"], json!(200));
        assert_eq!(args["is_graduated"], json!(true));
        assert_eq!(args["min_mkt_cap"], json!(1000));
    }

    #[test]
    fn test_input_file_must_be_object() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[1, 2, 3]").unwrap();

        let input = InputArgs {
            input: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert!(input.load().is_err());
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let config = InputArgs::default().load_config().unwrap();
        assert_eq!(config.scraper.page_size, 50);
    }
}
