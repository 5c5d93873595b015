//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Pump.fun: paginated coin listing client
//! - GeckoTerminal: pool pricing client
//! - Dataset: JSON-lines output sink
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod dataset;
pub mod gecko_terminal;
pub mod pump_fun;

pub use cli::CliApp;
pub use dataset::JsonLinesSink;
pub use gecko_terminal::GeckoTerminalClient;
pub use pump_fun::PumpFunClient;
