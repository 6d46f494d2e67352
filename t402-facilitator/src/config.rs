//! Facilitator server configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 4021
//!
//! [chains."eip155:8453"]
//! type = "eip155"
//! rpc_url = "https://mainnet.base.org"
//! signer_private_key = "$SIGNER_KEY_BASE"
//!
//! [chains."solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp"]
//! type = "solana"
//! rpc_url = "https://api.mainnet-beta.solana.com"
//! fee_payer_private_key = "$FEE_PAYER_KEY_SOLANA"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to configuration file (default: `config.toml`)
//! - `HOST` — Override server bind address
//! - `PORT` — Override server port
//! - Chain-specific signer keys referenced by `$VAR` in the config file

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level facilitator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilitatorConfig {
    /// Server bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Server port (default: `4021`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Chain configurations keyed by CAIP-2 network identifier (e.g. `eip155:8453`,
    /// `solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp`).
    #[serde(default)]
    pub chains: HashMap<String, ChainConfig>,
}

/// Per-chain configuration, one variant per supported namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChainConfig {
    /// An EIP-155 (EVM) chain.
    Eip155(Eip155ChainConfig),
    /// A Solana chain.
    Solana(SolanaChainConfig),
}

/// Configuration for an EVM chain reachable over JSON-RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Eip155ChainConfig {
    /// HTTP RPC endpoint URL.
    pub rpc_url: String,

    /// Private key for the facilitator signer (hex, with or without `0x` prefix).
    /// Supports `$VAR` / `${VAR}` for environment variable expansion.
    pub signer_private_key: String,

    /// Whether to use EIP-1559 fee estimation (default: `true`).
    #[serde(default = "default_eip1559")]
    pub eip1559: bool,

    /// Whether to use Flashblocks-aware receipt polling (default: `false`).
    #[serde(default)]
    pub flashblocks: bool,

    /// Seconds to wait for a transaction receipt before timing out (default: `30`).
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
}

/// Configuration for a Solana chain reachable over JSON-RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolanaChainConfig {
    /// HTTP RPC endpoint URL.
    pub rpc_url: String,

    /// Base58-encoded keypair used to pay fees and sign settlement transactions.
    /// Supports `$VAR` / `${VAR}` for environment variable expansion.
    pub fee_payer_private_key: String,

    /// Upper bound on the compute unit limit requested for settlement transactions
    /// (default: `200_000`).
    #[serde(default = "default_max_compute_unit_limit")]
    pub max_compute_unit_limit: u32,

    /// Upper bound on the compute unit price (micro-lamports) paid for settlement
    /// transactions (default: `1_000_000`).
    #[serde(default = "default_max_compute_unit_price")]
    pub max_compute_unit_price: u64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0))
}

fn default_port() -> u16 {
    4021
}

const fn default_eip1559() -> bool {
    true
}

const fn default_receipt_timeout_secs() -> u64 {
    30
}

const fn default_max_compute_unit_limit() -> u32 {
    200_000
}

const fn default_max_compute_unit_price() -> u64 {
    1_000_000
}

impl FacilitatorConfig {
    /// Loads configuration from the path given by the `CONFIG` environment
    /// variable, falling back to `config.toml` in the current directory.
    ///
    /// After loading, all string values with `$VAR` / `${VAR}` references
    /// are expanded from the process environment. `HOST` and `PORT` env vars
    /// override the file values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "config.toml".to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path)?
        } else {
            // If no config file exists, use empty TOML and rely on defaults
            String::new()
        };

        // Expand environment variables in the raw TOML string
        let expanded = expand_env_vars(&content);

        let mut config: Self = toml::from_str(&expanded)?;

        // Allow HOST / PORT env overrides
        if let Ok(host) = std::env::var("HOST") {
            if let Ok(addr) = host.parse() {
                config.host = addr;
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }

        Ok(config)
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            let braced = chars.peek() == Some(&'{');
            if braced {
                chars.next(); // consume '{'
            }

            let mut var_name = String::new();
            while let Some(&c) = chars.peek() {
                if braced {
                    if c == '}' {
                        chars.next();
                        break;
                    }
                } else if !c.is_ascii_alphanumeric() && c != '_' {
                    break;
                }
                var_name.push(c);
                chars.next();
            }

            if var_name.is_empty() {
                result.push('$');
                if braced {
                    result.push('{');
                }
            } else if let Ok(val) = std::env::var(&var_name) {
                result.push_str(&val);
            } else {
                // Leave unresolved variable as-is
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&var_name);
                if braced {
                    result.push('}');
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}
