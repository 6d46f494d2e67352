//! Chain provider abstractions shared across scheme builders.
//!
//! [`ChainProvider`] erases the concrete EVM/Solana provider type so
//! [`crate::schemes`] can implement [`t402::scheme::SchemeHandlerBuilder`]
//! generically over "whatever chain this scheme targets."

use std::sync::Arc;

use t402::chain::{ChainId, ChainProviderOps};

/// A configured chain provider, tagged by namespace.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub enum ChainProvider {
    /// An EIP-155 (EVM) chain provider.
    #[cfg(feature = "chain-eip155")]
    Eip155(Arc<t402_evm::chain::Eip155ChainProvider>),
    /// A Solana chain provider.
    #[cfg(feature = "chain-solana")]
    Solana(Arc<t402_svm::chain::SolanaChainProvider>),
}

impl ChainProviderOps for ChainProvider {
    fn signer_addresses(&self) -> Vec<String> {
        match self {
            #[cfg(feature = "chain-eip155")]
            Self::Eip155(p) => p.signer_addresses(),
            #[cfg(feature = "chain-solana")]
            Self::Solana(p) => p.signer_addresses(),
        }
    }

    fn chain_id(&self) -> ChainId {
        match self {
            #[cfg(feature = "chain-eip155")]
            Self::Eip155(p) => p.chain_id(),
            #[cfg(feature = "chain-solana")]
            Self::Solana(p) => p.chain_id(),
        }
    }
}
