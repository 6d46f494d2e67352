//! Local facilitator implementation for x402 payments.
//!
//! [`FacilitatorLocal`] wraps a [`SchemeRegistry`](t402::scheme::SchemeRegistry)
//! and a [`NetworkRegistry`](t402::networks::NetworkRegistry), routing payment
//! verification and settlement requests to the scheme handler that matches the
//! payment's chain ID and scheme name.
//!
//! If no matching handler is found, the request fails with
//! [`PaymentVerificationError::UnsupportedScheme`].

use t402::facilitator::{BoxFuture, Facilitator, FacilitatorError};
use t402::networks::NetworkRegistry;
use t402::proto;
use t402::proto::PaymentVerificationError;
use t402::scheme::SchemeRegistry;

/// A [`Facilitator`] that delegates to scheme handlers registered per chain+scheme.
#[derive(Debug)]
pub struct FacilitatorLocal {
    handlers: SchemeRegistry,
    networks: NetworkRegistry,
}

impl FacilitatorLocal {
    /// Creates a new local facilitator from a populated scheme registry and
    /// the network registry used to resolve V1 human-readable network names.
    #[must_use]
    pub const fn new(handlers: SchemeRegistry, networks: NetworkRegistry) -> Self {
        Self { handlers, networks }
    }
}

impl Facilitator for FacilitatorLocal {
    fn verify(
        &self,
        request: proto::VerifyRequest,
    ) -> BoxFuture<'_, Result<proto::VerifyResponse, FacilitatorError>> {
        Box::pin(async move {
            let handler = request
                .scheme_handler_slug(&self.networks)
                .and_then(|slug| self.handlers.by_slug(&slug))
                .ok_or(FacilitatorError::PaymentVerification(
                    PaymentVerificationError::UnsupportedScheme,
                ))?;
            handler.verify(request).await
        })
    }

    fn settle(
        &self,
        request: proto::SettleRequest,
    ) -> BoxFuture<'_, Result<proto::SettleResponse, FacilitatorError>> {
        Box::pin(async move {
            let handler = request
                .scheme_handler_slug(&self.networks)
                .and_then(|slug| self.handlers.by_slug(&slug))
                .ok_or(FacilitatorError::PaymentVerification(
                    PaymentVerificationError::UnsupportedScheme,
                ))?;
            handler.settle(request).await
        })
    }

    fn supported(&self) -> BoxFuture<'_, Result<proto::SupportedResponse, FacilitatorError>> {
        Box::pin(async move {
            let mut kinds = Vec::new();
            let mut signers = std::collections::HashMap::new();
            for handler in self.handlers.values() {
                let Ok(mut supported) = handler.supported().await else {
                    continue;
                };
                kinds.append(&mut supported.kinds);
                for (chain_id, signer_addresses) in supported.signers {
                    signers.entry(chain_id).or_insert(signer_addresses);
                }
            }
            Ok(proto::SupportedResponse {
                kinds,
                extensions: Vec::new(),
                signers,
            })
        })
    }
}
