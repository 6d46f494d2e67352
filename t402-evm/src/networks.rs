//! Known EVM network configurations and USDC/USDM token deployments.
//!
//! Mirrors `t402_svm`'s network module: static network metadata plus
//! well-known stablecoin deployments, keyed by CAIP-2 `eip155:` chain
//! references.

use std::sync::LazyLock;

use alloy_primitives::address;
use t402::networks::{NetworkInfo, NetworkRegistry};

use crate::chain::{Eip155ChainReference, EvmTokenDeployment};

/// Default EIP-712 domain name for USDC.
pub const DEFAULT_USDC_NAME: &str = "USD Coin";

/// Default EIP-712 domain version for USDC.
pub const DEFAULT_USDC_VERSION: &str = "2";

/// Default token decimals for USDC.
pub const DEFAULT_USDC_DECIMALS: u8 = 6;

/// Well-known EVM networks with their names and CAIP-2 identifiers.
pub static EVM_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "base",
        namespace: "eip155",
        reference: "8453",
    },
    NetworkInfo {
        name: "base-sepolia",
        namespace: "eip155",
        reference: "84532",
    },
    NetworkInfo {
        name: "ethereum",
        namespace: "eip155",
        reference: "1",
    },
    NetworkInfo {
        name: "polygon",
        namespace: "eip155",
        reference: "137",
    },
    NetworkInfo {
        name: "polygon-amoy",
        namespace: "eip155",
        reference: "80002",
    },
    NetworkInfo {
        name: "avalanche",
        namespace: "eip155",
        reference: "43114",
    },
    NetworkInfo {
        name: "avalanche-fuji",
        namespace: "eip155",
        reference: "43113",
    },
    NetworkInfo {
        name: "celo",
        namespace: "eip155",
        reference: "42220",
    },
    NetworkInfo {
        name: "celo-sepolia",
        namespace: "eip155",
        reference: "11142220",
    },
    NetworkInfo {
        name: "megaeth",
        namespace: "eip155",
        reference: "4326",
    },
    NetworkInfo {
        name: "megaeth-testnet",
        namespace: "eip155",
        reference: "6343",
    },
    NetworkInfo {
        name: "monad",
        namespace: "eip155",
        reference: "143",
    },
    NetworkInfo {
        name: "monad-testnet",
        namespace: "eip155",
        reference: "10143",
    },
];

/// Well-known USDC (or, on `MegaETH`, USDM) token deployments on EVM networks.
///
/// Use [`usdc_evm_deployment()`] for per-chain lookups, or [`usdc_evm_deployments()`]
/// to iterate over all known deployments.
static USDC_DEPLOYMENTS: LazyLock<Vec<EvmTokenDeployment>> = LazyLock::new(|| {
    vec![
        EvmTokenDeployment {
            chain_reference: Eip155ChainReference::from(8453u64),
            address: address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
            decimals: DEFAULT_USDC_DECIMALS,
            name: DEFAULT_USDC_NAME.to_owned(),
            version: DEFAULT_USDC_VERSION.to_owned(),
        },
        EvmTokenDeployment {
            chain_reference: Eip155ChainReference::from(84532u64),
            address: address!("036CbD53842c5426634e7929541eC2318f3dCF7e"),
            decimals: DEFAULT_USDC_DECIMALS,
            // Base Sepolia USDC contract returns "USDC" from name(), not "USD Coin".
            name: "USDC".to_owned(),
            version: DEFAULT_USDC_VERSION.to_owned(),
        },
        EvmTokenDeployment {
            chain_reference: Eip155ChainReference::from(1u64),
            address: address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            decimals: DEFAULT_USDC_DECIMALS,
            name: DEFAULT_USDC_NAME.to_owned(),
            version: DEFAULT_USDC_VERSION.to_owned(),
        },
        EvmTokenDeployment {
            chain_reference: Eip155ChainReference::from(137u64),
            address: address!("3c499c542cEF5E3811e1192ce70d8cC03d5c3359"),
            decimals: DEFAULT_USDC_DECIMALS,
            name: DEFAULT_USDC_NAME.to_owned(),
            version: DEFAULT_USDC_VERSION.to_owned(),
        },
        EvmTokenDeployment {
            chain_reference: Eip155ChainReference::from(80002u64),
            address: address!("41E94Eb019C0762f9Bfcf9Fb1E58725BfB0e7582"),
            decimals: DEFAULT_USDC_DECIMALS,
            // Polygon Amoy runs newer FiatTokenV2_2, name() = "USDC".
            name: "USDC".to_owned(),
            version: DEFAULT_USDC_VERSION.to_owned(),
        },
        EvmTokenDeployment {
            chain_reference: Eip155ChainReference::from(43114u64),
            address: address!("B97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E"),
            decimals: DEFAULT_USDC_DECIMALS,
            name: DEFAULT_USDC_NAME.to_owned(),
            version: DEFAULT_USDC_VERSION.to_owned(),
        },
        EvmTokenDeployment {
            chain_reference: Eip155ChainReference::from(43113u64),
            address: address!("5425890298aed601595a70AB815c96711a31Bc65"),
            decimals: DEFAULT_USDC_DECIMALS,
            name: DEFAULT_USDC_NAME.to_owned(),
            version: DEFAULT_USDC_VERSION.to_owned(),
        },
        EvmTokenDeployment {
            chain_reference: Eip155ChainReference::from(42220u64),
            address: address!("cebA9300f2b948710d2653dD7B07f33A8B32118C"),
            decimals: DEFAULT_USDC_DECIMALS,
            // Celo USDC contract name() = "USDC" (confirmed on-chain).
            name: "USDC".to_owned(),
            version: DEFAULT_USDC_VERSION.to_owned(),
        },
        EvmTokenDeployment {
            chain_reference: Eip155ChainReference::from(11_142_220u64),
            address: address!("01C5C0122039549AD1493B8220cABEdD739BC44E"),
            decimals: DEFAULT_USDC_DECIMALS,
            // Celo Sepolia uses Circle native USDC, name() = "USDC".
            name: "USDC".to_owned(),
            version: DEFAULT_USDC_VERSION.to_owned(),
        },
        EvmTokenDeployment {
            // MegaETH uses USDM (MegaUSD) rather than Circle USDC.
            chain_reference: Eip155ChainReference::from(4326u64),
            address: address!("FAfDdbb3FC7688494971a79cc65DCa3EF82079E7"),
            decimals: 18,
            name: "MegaUSD".to_owned(),
            version: "1".to_owned(),
        },
        EvmTokenDeployment {
            chain_reference: Eip155ChainReference::from(143u64),
            address: address!("754704Bc059F8C67012fEd69BC8A327a5aafb603"),
            decimals: DEFAULT_USDC_DECIMALS,
            // Monad runs Circle native USDC (FiatTokenV2_2), name() = "USDC".
            name: "USDC".to_owned(),
            version: DEFAULT_USDC_VERSION.to_owned(),
        },
        EvmTokenDeployment {
            chain_reference: Eip155ChainReference::from(10143u64),
            address: address!("534b2f3A21130d7a60830c2Df862319e593943A3"),
            decimals: DEFAULT_USDC_DECIMALS,
            // Monad testnet uses Circle native USDC, name() = "USDC".
            name: "USDC".to_owned(),
            version: DEFAULT_USDC_VERSION.to_owned(),
        },
    ]
});

/// Returns all known stablecoin deployments on EVM chains.
#[must_use]
pub fn usdc_evm_deployments() -> &'static [EvmTokenDeployment] {
    &USDC_DEPLOYMENTS
}

/// Returns the stablecoin deployment for a specific EVM chain, if known.
#[must_use]
pub fn usdc_evm_deployment(chain: &Eip155ChainReference) -> Option<&'static EvmTokenDeployment> {
    USDC_DEPLOYMENTS
        .iter()
        .find(|d| d.chain_reference == *chain)
}

/// Ergonomic accessors for USDC token deployments on well-known EVM chains.
///
/// Combine with [`t402::chain::DeployedTokenAmount`] for a fluent pricing API:
///
/// ```ignore
/// use t402::chain::DeployedTokenAmount;
/// use t402_evm::{V2Eip155Exact, USDC};
///
/// let tag = V2Eip155Exact::price_tag(
///     pay_to,
///     DeployedTokenAmount { amount: 1_000_000u64.into(), token: USDC::base().clone() },
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct USDC;

#[allow(clippy::doc_markdown, clippy::missing_panics_doc)]
impl USDC {
    /// Looks up a USDC deployment by chain reference.
    ///
    /// Returns `None` if the chain is not in the built-in deployment table.
    #[must_use]
    pub fn on(chain: &Eip155ChainReference) -> Option<&'static EvmTokenDeployment> {
        usdc_evm_deployment(chain)
    }

    /// Returns all known stablecoin deployments on EVM chains.
    #[must_use]
    pub fn all() -> &'static [EvmTokenDeployment] {
        usdc_evm_deployments()
    }

    /// USDC on Base mainnet (eip155:8453).
    #[must_use]
    pub fn base() -> &'static EvmTokenDeployment {
        usdc_evm_deployment(&Eip155ChainReference::from(8453u64))
            .expect("built-in USDC deployment for Base missing")
    }

    /// USDC on Base Sepolia (eip155:84532).
    #[must_use]
    pub fn base_sepolia() -> &'static EvmTokenDeployment {
        usdc_evm_deployment(&Eip155ChainReference::from(84532u64))
            .expect("built-in USDC deployment for Base Sepolia missing")
    }
}

/// Builds a [`NetworkRegistry`] covering all well-known EVM networks.
#[must_use]
pub fn evm_network_registry() -> &'static NetworkRegistry {
    static REGISTRY: LazyLock<NetworkRegistry> =
        LazyLock::new(|| NetworkRegistry::from_networks(EVM_NETWORKS));
    &REGISTRY
}
