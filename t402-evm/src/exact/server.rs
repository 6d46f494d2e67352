//! Server-side price tag generation for the EIP-155 "exact" scheme.
//!
//! Mirrors the Solana exact scheme's price tag builders: a caller describes a
//! token deployment and payee, and gets back a [`v1::PriceTag`] or
//! [`v2::PriceTag`] ready to attach to a payment-required response.

use std::sync::Arc;

use t402::chain::{ChainId, DeployedTokenAmount};
use t402::proto;
use t402::proto::{v1, v2};

use crate::chain::{ChecksummedAddress, EvmTokenDeployment, TokenAmount, TokenDeploymentEip712};
use crate::exact::{ExactScheme, PaymentRequirementsExtra, V1Eip155Exact, V2Eip155Exact};

impl V1Eip155Exact {
    /// Creates a V1 price tag for an ERC-3009 `transferWithAuthorization` payment.
    ///
    /// # Panics
    ///
    /// Panics if the chain ID has no known network name.
    #[allow(clippy::panic)]
    pub fn price_tag<A: Into<ChecksummedAddress>>(
        pay_to: A,
        asset: DeployedTokenAmount<TokenAmount, EvmTokenDeployment>,
    ) -> v1::PriceTag {
        let chain_id: ChainId = asset.token.chain_reference.into();
        let network = chain_id
            .as_network_name()
            .unwrap_or_else(|| panic!("Can not get network name for chain id {chain_id}"));
        v1::PriceTag {
            scheme: ExactScheme.to_string(),
            pay_to: pay_to.into().to_string(),
            asset: ChecksummedAddress(asset.token.address).to_string(),
            network: network.to_string(),
            amount: asset.amount.to_string(),
            max_timeout_seconds: 300,
            extra: eip712_extra(&asset.token),
            enricher: Some(Arc::new(eip3009_transfer_method_enricher)),
        }
    }
}

/// Enricher for V1 EIP-155 price tags - fills in `asset_transfer_method` from
/// the facilitator's advertised capabilities when the price tag didn't set one.
pub fn eip3009_transfer_method_enricher(
    price_tag: &mut v1::PriceTag,
    capabilities: &proto::SupportedResponse,
) {
    if transfer_method_already_set(&price_tag.extra) {
        return;
    }

    let Some(remote_method) = capabilities
        .kinds
        .iter()
        .find(|kind| {
            v1::T402Version1 == kind.t402_version
                && kind.scheme == ExactScheme.to_string()
                && kind.network == price_tag.network
        })
        .and_then(|kind| kind.extra.as_ref())
        .and_then(remote_transfer_method)
    else {
        return;
    };

    apply_transfer_method(&mut price_tag.extra, remote_method);
}

impl V2Eip155Exact {
    /// Creates a V2 price tag for an ERC-3009 `transferWithAuthorization` payment.
    pub fn price_tag<A: Into<ChecksummedAddress>>(
        pay_to: A,
        asset: DeployedTokenAmount<TokenAmount, EvmTokenDeployment>,
    ) -> v2::PriceTag {
        let chain_id: ChainId = asset.token.chain_reference.into();
        let requirements = v2::PaymentRequirements {
            scheme: ExactScheme.to_string(),
            pay_to: pay_to.into().to_string(),
            asset: ChecksummedAddress(asset.token.address).to_string(),
            network: chain_id,
            amount: asset.amount.to_string(),
            max_timeout_seconds: 300,
            extra: eip712_extra(&asset.token),
        };
        v2::PriceTag {
            requirements,
            enricher: Some(Arc::new(eip3009_transfer_method_enricher_v2)),
        }
    }
}

/// Enricher for V2 EIP-155 price tags - same purpose as
/// [`eip3009_transfer_method_enricher`] for the V2 wire format.
pub fn eip3009_transfer_method_enricher_v2(
    price_tag: &mut v2::PriceTag,
    capabilities: &proto::SupportedResponse,
) {
    if transfer_method_already_set(&price_tag.requirements.extra) {
        return;
    }

    let Some(remote_method) = capabilities
        .kinds
        .iter()
        .find(|kind| {
            v2::T402Version2 == kind.t402_version
                && kind.scheme == ExactScheme.to_string()
                && kind.network == price_tag.requirements.network.to_string()
        })
        .and_then(|kind| kind.extra.as_ref())
        .and_then(remote_transfer_method)
    else {
        return;
    };

    apply_transfer_method(&mut price_tag.requirements.extra, remote_method);
}

/// Builds the initial `extra` payload (EIP-712 domain name/version) for a price tag.
fn eip712_extra(token: &EvmTokenDeployment) -> Option<serde_json::Value> {
    PaymentRequirementsExtra::from_deployment(
        Some(TokenDeploymentEip712 {
            name: token.name.clone(),
            version: token.version.clone(),
        }),
        None,
    )
}

fn transfer_method_already_set(extra: &Option<serde_json::Value>) -> bool {
    extra
        .as_ref()
        .and_then(|v| serde_json::from_value::<PaymentRequirementsExtra>(v.clone()).ok())
        .is_some_and(|e| e.asset_transfer_method.is_some())
}

fn remote_transfer_method(extra: &serde_json::Value) -> Option<crate::exact::AssetTransferMethod> {
    serde_json::from_value::<PaymentRequirementsExtra>(extra.clone())
        .ok()
        .and_then(|e| e.asset_transfer_method)
}

fn apply_transfer_method(
    extra: &mut Option<serde_json::Value>,
    method: crate::exact::AssetTransferMethod,
) {
    let mut current = extra
        .as_ref()
        .and_then(|v| serde_json::from_value::<PaymentRequirementsExtra>(v.clone()).ok())
        .unwrap_or(PaymentRequirementsExtra {
            name: String::new(),
            version: String::new(),
            asset_transfer_method: None,
        });
    current.asset_transfer_method = Some(method);
    *extra = serde_json::to_value(current).ok();
}
