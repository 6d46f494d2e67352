//! Production-ready x402 Facilitator HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! cargo run -p t402-facilitator --release
//!
//! # Run with custom config path
//! CONFIG=/path/to/config.toml cargo run -p t402-facilitator
//!
//! # Configure logging level
//! RUST_LOG=info cargo run -p t402-facilitator
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to TOML configuration file (default: `config.toml`)
//! - `HOST` — Override bind address (default: `0.0.0.0`)
//! - `PORT` — Override port (default: `4021`)
//! - `RUST_LOG` — Log level filter (default: `info`)

#[tokio::main]
async fn main() {
    let _telemetry = t402_facilitator::util::Telemetry::init();

    if let Err(e) = t402_facilitator::run::run().await {
        tracing::error!("facilitator failed: {e}");
        std::process::exit(1);
    }
}
