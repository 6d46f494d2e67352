//! Server bootstrap: configuration, chain providers, scheme registration, and serving.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::http::Method;
use axum::routing::get;
use t402::chain::ChainId;
use t402::facilitator::Facilitator;
use t402::networks::NetworkRegistry;
use t402::scheme::SchemeRegistry;
use tokio::net::TcpListener;
use tower_http::cors;

use crate::chain::ChainProvider;
use crate::config::{ChainConfig, FacilitatorConfig};
use crate::handlers::facilitator_router;
use crate::local::FacilitatorLocal;

/// Loads configuration, wires up chain providers and scheme handlers, and serves
/// the facilitator HTTP API until a shutdown signal is received.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, a configured chain
/// references a disabled chain feature, a chain provider cannot be
/// constructed, or the server fails to bind.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::CryptoProvider::install_default(rustls::crypto::ring::default_provider())
        .expect("failed to install rustls crypto provider");
    dotenvy::dotenv().ok();

    let config = FacilitatorConfig::load()?;
    tracing::info!(host = %config.host, port = config.port, chains = config.chains.len(), "loaded configuration");

    if config.chains.is_empty() {
        tracing::warn!("no chains configured — facilitator will report no supported schemes");
    }

    let mut scheme_registry = SchemeRegistry::new();
    let mut network_registry = NetworkRegistry::new();
    #[cfg(feature = "chain-eip155")]
    network_registry.register(t402_evm::EVM_NETWORKS);
    #[cfg(feature = "chain-solana")]
    network_registry.register(t402_svm::SOLANA_NETWORKS);

    for (chain_key, chain_config) in &config.chains {
        let chain_id: ChainId = chain_key
            .parse()
            .map_err(|e| format!("invalid chain id {chain_key}: {e}"))?;
        register_chain(&mut scheme_registry, &chain_id, chain_config)?;
        tracing::info!(chain = %chain_id, "registered chain");
    }

    let facilitator: Arc<dyn Facilitator> =
        Arc::new(FacilitatorLocal::new(scheme_registry, network_registry));

    let app = axum::Router::new()
        .merge(facilitator_router(facilitator))
        .route("/health", get(health))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        );

    let addr = SocketAddr::from((config.host, config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "facilitator listening");

    let sig_down = crate::util::SigDown::try_new()?;
    let cancellation_token = sig_down.cancellation_token();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancellation_token.cancelled().await })
        .await?;

    tracing::info!("facilitator shut down gracefully");
    Ok(())
}

/// `GET /health` — Liveness check.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg_attr(not(any(feature = "chain-eip155", feature = "chain-solana")), allow(unused_variables))]
fn register_chain(
    scheme_registry: &mut SchemeRegistry,
    chain_id: &ChainId,
    chain_config: &ChainConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match chain_config {
        #[cfg(feature = "chain-eip155")]
        ChainConfig::Eip155(cfg) => {
            let provider = ChainProvider::Eip155(Arc::new(build_eip155_provider(chain_id, cfg)?));
            scheme_registry.register(&t402_evm::V1Eip155Exact, &provider, None)?;
            scheme_registry.register(&t402_evm::V2Eip155Exact, &provider, None)?;
            Ok(())
        }
        #[cfg(not(feature = "chain-eip155"))]
        ChainConfig::Eip155(_) => Err(format!(
            "chain {chain_id} is configured as eip155 but the chain-eip155 feature is disabled"
        )
        .into()),
        #[cfg(feature = "chain-solana")]
        ChainConfig::Solana(cfg) => {
            let provider = ChainProvider::Solana(Arc::new(build_solana_provider(chain_id, cfg)?));
            scheme_registry.register(&t402_svm::V1SolanaExact, &provider, None)?;
            scheme_registry.register(&t402_svm::V2SolanaExact, &provider, None)?;
            Ok(())
        }
        #[cfg(not(feature = "chain-solana"))]
        ChainConfig::Solana(_) => Err(format!(
            "chain {chain_id} is configured as solana but the chain-solana feature is disabled"
        )
        .into()),
    }
}

#[cfg(feature = "chain-eip155")]
fn build_eip155_provider(
    chain_id: &ChainId,
    cfg: &crate::config::Eip155ChainConfig,
) -> Result<t402_evm::chain::Eip155ChainProvider, Box<dyn std::error::Error>> {
    use alloy_network::EthereumWallet;
    use alloy_signer_local::PrivateKeySigner;
    use t402_evm::chain::Eip155ChainReference;

    let reference = Eip155ChainReference::try_from(chain_id)
        .map_err(|e| format!("{chain_id} is not a valid eip155 chain id: {e}"))?;
    let signer: PrivateKeySigner = cfg.signer_private_key.parse()?;
    let wallet = EthereumWallet::from(signer);
    let rpc_url: url::Url = cfg.rpc_url.parse()?;

    t402_evm::chain::Eip155ChainProvider::new(
        reference,
        wallet,
        &[(rpc_url, None)],
        cfg.eip1559,
        cfg.flashblocks,
        cfg.receipt_timeout_secs,
    )
    .map_err(|e| format!("failed to build eip155 provider for {chain_id}: {e}").into())
}

#[cfg(feature = "chain-solana")]
fn build_solana_provider(
    chain_id: &ChainId,
    cfg: &crate::config::SolanaChainConfig,
) -> Result<t402_svm::chain::SolanaChainProvider, Box<dyn std::error::Error>> {
    use solana_keypair::Keypair;
    use t402_svm::chain::SolanaChainReference;

    let reference = SolanaChainReference::try_from(chain_id)
        .map_err(|e| format!("{chain_id} is not a valid solana chain id: {e}"))?;
    let keypair = Keypair::from_base58_string(&cfg.fee_payer_private_key);

    Ok(t402_svm::chain::SolanaChainProvider::new(
        keypair,
        cfg.rpc_url.clone(),
        reference,
        cfg.max_compute_unit_limit,
        cfg.max_compute_unit_price,
    ))
}
