//! Client-side payment signing for the EIP-155 "exact" scheme.
//!
//! This module provides [`V1Eip155ExactClient`] and [`V2Eip155ExactClient`] for
//! signing ERC-3009 `transferWithAuthorization` payments on EVM chains.

use alloy_primitives::{Address, Bytes, FixedBytes, Signature, U256};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{SolCall, SolStruct, eip712_domain, sol};
use t402::proto::Base64Bytes;
use t402::proto::PaymentRequired;
use t402::proto::UnixTimestamp;
use t402::proto::v1;
use t402::proto::v2;
use t402::scheme::T402SchemeId;
use t402::scheme::{PaymentCandidate, T402Error, T402SchemeClient};
use rand::RngExt;
use rand::rng;
use std::sync::Arc;

use crate::chain::Eip155ChainReference;
use crate::chain::TokenAmount;
use crate::exact::types;
use crate::exact::types::{TokenPermissions as SolTokenPermissions, Witness as SolWitness};
use crate::exact::{
    AssetTransferMethod, Eip3009Authorization, Eip3009Payload, ExactPayload, ExactScheme,
    PERMIT2_ADDRESS, PaymentRequirementsExtra, Permit2Authorization, Permit2Payload,
    Permit2TokenPermissions, Permit2Witness, PermitWitnessTransferFrom, TransferWithAuthorization,
    V1Eip155Exact, V2Eip155Exact, X402_EXACT_PERMIT2_PROXY,
};

type SchemeError = Box<dyn std::error::Error + Send + Sync>;

/// A trait that abstracts signing operations, allowing both owned signers and Arc-wrapped signers.
///
/// This is necessary because Alloy's `Signer` trait is not implemented for `Arc<T>`,
/// but users may want to share signers via `Arc` (especially when `PrivateKeySigner` doesn't implement `Clone`).
pub trait SignerLike: Send + Sync {
    /// Returns the address of the signer.
    fn address(&self) -> Address;

    /// Signs the given hash.
    fn sign_hash(
        &self,
        hash: &FixedBytes<32>,
    ) -> impl Future<Output = Result<Signature, alloy_signer::Error>> + Send;
}

impl SignerLike for PrivateKeySigner {
    fn address(&self) -> Address {
        Self::address(self)
    }

    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<Signature, alloy_signer::Error> {
        alloy_signer::Signer::sign_hash(self, hash).await
    }
}

impl<T: SignerLike + Send + Sync> SignerLike for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<Signature, alloy_signer::Error> {
        (**self).sign_hash(hash).await
    }
}

/// Shared EIP-712 signing parameters for ERC-3009 authorization.
#[derive(Debug, Clone)]
pub struct Eip3009SigningParams {
    /// The EIP-155 chain ID (numeric)
    pub chain_id: u64,
    /// The token contract address (verifying contract for EIP-712)
    pub asset_address: Address,
    /// The recipient address for the transfer
    pub pay_to: Address,
    /// The amount to transfer
    pub amount: U256,
    /// Maximum timeout in seconds for the authorization validity window
    pub max_timeout_seconds: u64,
    /// Optional EIP-712 domain name and version override
    pub extra: Option<PaymentRequirementsExtra>,
}

/// Signs an ERC-3009 `TransferWithAuthorization` using EIP-712.
/// It constructs the EIP-712 domain, builds the authorization struct with appropriate
/// timing parameters, and signs the resulting hash.
///
/// # Errors
///
/// Returns [`SchemeError`] if EIP-712 signing fails.
pub async fn sign_erc3009_authorization<S: SignerLike + Sync>(
    signer: &S,
    params: &Eip3009SigningParams,
) -> Result<Eip3009Payload, SchemeError> {
    let (name, version) = params.extra.as_ref().map_or_else(
        || (String::new(), String::new()),
        |extra| (extra.name.clone(), extra.version.clone()),
    );

    let domain = eip712_domain! {
        name: name,
        version: version,
        chain_id: params.chain_id,
        verifying_contract: params.asset_address,
    };

    let now = UnixTimestamp::now();
    // valid_after should be in the past (10 minutes ago) to ensure the payment is immediately valid
    let valid_after_secs = now.as_secs().saturating_sub(10 * 60);
    let valid_after = UnixTimestamp::from_secs(valid_after_secs);
    let valid_before = now + params.max_timeout_seconds;
    let nonce: [u8; 32] = rng().random();
    let nonce = FixedBytes(nonce);

    let authorization = Eip3009Authorization {
        from: signer.address(),
        to: params.pay_to,
        value: params.amount.into(),
        valid_after,
        valid_before,
        nonce,
    };

    // IMPORTANT: The values here MUST match the authorization struct exactly,
    // as the facilitator will reconstruct this struct from the authorization
    // to verify the signature.
    let transfer_with_authorization = TransferWithAuthorization {
        from: authorization.from,
        to: authorization.to,
        value: authorization.value.into(),
        validAfter: U256::from(authorization.valid_after.as_secs()),
        validBefore: U256::from(authorization.valid_before.as_secs()),
        nonce: authorization.nonce,
    };

    let eip712_hash = transfer_with_authorization.eip712_signing_hash(&domain);
    let signature = signer
        .sign_hash(&eip712_hash)
        .await
        .map_err(|e| format!("{e:?}"))?;

    Ok(Eip3009Payload {
        signature: signature.as_bytes().into(),
        authorization,
    })
}

/// Shared signing parameters for Permit2 authorization.
#[derive(Debug, Clone, Copy)]
pub struct Permit2SigningParams {
    /// The EIP-155 chain ID (numeric)
    pub chain_id: u64,
    /// The token contract address
    pub asset_address: Address,
    /// The recipient address for the transfer
    pub pay_to: Address,
    /// The amount to transfer (in token units)
    pub amount: U256,
    /// Maximum timeout in seconds for the authorization validity window
    pub max_timeout_seconds: u64,
}

/// Signs a Permit2 `PermitWitnessTransferFrom` using EIP-712.
///
/// Constructs the Permit2 EIP-712 domain (name = "Permit2", no version,
/// verifying contract = canonical Permit2 address), builds the authorization
/// with timing parameters, and signs the resulting hash.
///
/// # Errors
///
/// Returns [`SchemeError`] if EIP-712 signing fails.
pub async fn sign_permit2_authorization<S: SignerLike + Sync>(
    signer: &S,
    params: &Permit2SigningParams,
) -> Result<Permit2Payload, SchemeError> {
    let domain = eip712_domain! {
        name: "Permit2",
        chain_id: params.chain_id,
        verifying_contract: PERMIT2_ADDRESS,
    };

    let now = UnixTimestamp::now();
    let valid_after_secs = now.as_secs().saturating_sub(10 * 60);
    let deadline_secs = now.as_secs() + params.max_timeout_seconds;

    // Permit2 uses uint256 nonce (random 32 bytes interpreted as uint256)
    let nonce_bytes: [u8; 32] = rng().random();
    let nonce = U256::from_be_bytes(nonce_bytes);

    let permit_witness = PermitWitnessTransferFrom {
        permitted: SolTokenPermissions {
            token: params.asset_address,
            amount: params.amount,
        },
        spender: X402_EXACT_PERMIT2_PROXY,
        nonce,
        deadline: U256::from(deadline_secs),
        witness: SolWitness {
            to: params.pay_to,
            validAfter: U256::from(valid_after_secs),
            extra: Bytes::new(),
        },
    };

    let eip712_hash = permit_witness.eip712_signing_hash(&domain);
    let signature = signer
        .sign_hash(&eip712_hash)
        .await
        .map_err(|e| format!("{e:?}"))?;

    let authorization = Permit2Authorization {
        from: signer.address(),
        permitted: Permit2TokenPermissions {
            token: params.asset_address,
            amount: TokenAmount::from(params.amount),
        },
        spender: X402_EXACT_PERMIT2_PROXY,
        nonce: TokenAmount::from(nonce),
        deadline: TokenAmount::from(U256::from(deadline_secs)),
        witness: Permit2Witness {
            to: params.pay_to,
            valid_after: TokenAmount::from(U256::from(valid_after_secs)),
            extra: Bytes::new(),
        },
    };

    Ok(Permit2Payload {
        signature: signature.as_bytes().into(),
        permit2_authorization: authorization,
    })
}

/// Builds the scheme-specific signed payload for one payment requirement,
/// choosing Permit2 or ERC-3009 based on the requirement's `extra.asset_transfer_method`.
async fn sign_exact_payload<S: SignerLike + Sync>(
    signer: &S,
    chain_id: u64,
    asset_address: Address,
    pay_to: Address,
    amount: U256,
    max_timeout_seconds: u64,
    extra: Option<PaymentRequirementsExtra>,
) -> Result<ExactPayload, SchemeError> {
    let use_permit2 =
        extra.as_ref().and_then(|e| e.asset_transfer_method) == Some(AssetTransferMethod::Permit2);

    if use_permit2 {
        let params = Permit2SigningParams {
            chain_id,
            asset_address,
            pay_to,
            amount,
            max_timeout_seconds,
        };
        Ok(ExactPayload::Permit2(
            sign_permit2_authorization(signer, &params).await?,
        ))
    } else {
        let params = Eip3009SigningParams {
            chain_id,
            asset_address,
            pay_to,
            amount,
            max_timeout_seconds,
            extra,
        };
        Ok(ExactPayload::Eip3009(
            sign_erc3009_authorization(signer, &params).await?,
        ))
    }
}

/// Client for signing V1 EIP-155 exact scheme payments.
///
/// V1 addresses chains by network name (e.g., `"base-sepolia"`) and carries
/// the signed payload alongside the bare scheme/network pair.
#[derive(Debug)]
pub struct V1Eip155ExactClient<S> {
    signer: S,
}

impl<S> V1Eip155ExactClient<S> {
    /// Creates a new V1 EIP-155 exact scheme client with the given signer.
    pub const fn new(signer: S) -> Self {
        Self { signer }
    }
}

impl<S> T402SchemeId for V1Eip155ExactClient<S> {
    fn t402_version(&self) -> u8 {
        1
    }

    fn namespace(&self) -> &str {
        V1Eip155Exact.namespace()
    }

    fn scheme(&self) -> &str {
        V1Eip155Exact.scheme()
    }
}

impl<S> T402SchemeClient for V1Eip155ExactClient<S>
where
    S: SignerLike + Clone + Send + Sync + 'static,
{
    fn scheme(&self) -> &str {
        V1Eip155Exact.scheme()
    }

    fn accept(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate> {
        let PaymentRequired::V1(v1_required) = payment_required else {
            return Vec::new();
        };
        v1_required
            .accepts
            .iter()
            .filter_map(|v| {
                let requirements: types::v1::PaymentRequirements = v.as_concrete()?;
                let chain_id = t402::chain::ChainId::from_network_name(&requirements.network)?;
                let chain_reference = Eip155ChainReference::try_from(&chain_id).ok()?;
                let signer = self.signer.clone();
                let amount = requirements.max_amount_required.0.to_string();
                let requirements = requirements.clone();
                Some(PaymentCandidate::new(
                    T402SchemeClient::scheme(self),
                    chain_id,
                    amount,
                    move || {
                        let signer = signer.clone();
                        let requirements = requirements.clone();
                        async move {
                            let exact_payload = sign_exact_payload(
                                &signer,
                                chain_reference.inner(),
                                requirements.asset.0,
                                requirements.pay_to.into(),
                                requirements.max_amount_required.into(),
                                requirements.max_timeout_seconds,
                                requirements.extra.clone(),
                            )
                            .await?;
                            let payload = types::v1::PaymentPayload {
                                t402_version: v1::V1,
                                scheme: ExactScheme,
                                network: requirements.network.clone(),
                                payload: exact_payload,
                            };
                            let json = serde_json::to_vec(&payload)
                                .map_err(|e| T402Error::SigningFailed(e.into()))?;
                            Ok(Base64Bytes::encode(&json).to_string())
                        }
                    },
                ))
            })
            .collect::<Vec<_>>()
    }
}

/// Client for signing V2 EIP-155 exact scheme payments.
///
/// This client handles the creation and signing of ERC-3009 `transferWithAuthorization`
/// payments for EVM chains. Uses CAIP-2 chain IDs and embeds the accepted requirements
/// directly in the payment payload.
#[derive(Debug)]
pub struct V2Eip155ExactClient<S> {
    signer: S,
}

impl<S> V2Eip155ExactClient<S> {
    /// Creates a new V2 EIP-155 exact scheme client with the given signer.
    pub const fn new(signer: S) -> Self {
        Self { signer }
    }
}

impl<S> T402SchemeId for V2Eip155ExactClient<S> {
    fn namespace(&self) -> &str {
        V2Eip155Exact.namespace()
    }

    fn scheme(&self) -> &str {
        V2Eip155Exact.scheme()
    }
}

impl<S> T402SchemeClient for V2Eip155ExactClient<S>
where
    S: SignerLike + Clone + Send + Sync + 'static,
{
    fn scheme(&self) -> &str {
        V2Eip155Exact.scheme()
    }

    fn accept(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate> {
        let PaymentRequired::V2(v2_required) = payment_required else {
            return Vec::new();
        };
        v2_required
            .accepts
            .iter()
            .filter_map(|v| {
                let requirements: types::v2::PaymentRequirements = v.as_concrete()?;
                let chain_reference = Eip155ChainReference::try_from(&requirements.network).ok()?;
                let signer = self.signer.clone();
                let resource_info = Some(v2_required.resource.clone());
                let chain_id = requirements.network.clone();
                let amount = requirements.amount.0.to_string();
                let requirements = requirements.clone();
                Some(PaymentCandidate::new(
                    T402SchemeClient::scheme(self),
                    chain_id,
                    amount,
                    move || {
                        let signer = signer.clone();
                        let resource_info = resource_info.clone();
                        let requirements = requirements.clone();
                        async move {
                            let exact_payload = sign_exact_payload(
                                &signer,
                                chain_reference.inner(),
                                requirements.asset.0,
                                requirements.pay_to.into(),
                                requirements.amount.into(),
                                requirements.max_timeout_seconds,
                                requirements.extra.clone(),
                            )
                            .await?;
                            let payload = types::v2::PaymentPayload {
                                t402_version: v2::V2,
                                accepted: requirements.clone(),
                                resource: resource_info.clone(),
                                payload: exact_payload,
                                extensions: None,
                            };
                            let json = serde_json::to_vec(&payload)
                                .map_err(|e| T402Error::SigningFailed(e.into()))?;
                            Ok(Base64Bytes::encode(&json).to_string())
                        }
                    },
                ))
            })
            .collect::<Vec<_>>()
    }
}

sol! {
    /// Minimal ERC-20 interface for client-side allowance checks and approvals.
    #[allow(missing_docs)]
    interface IPermit2Approval {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

/// Returns the ABI-encoded calldata for checking a token's Permit2 allowance.
///
/// The returned tuple `(token_address, calldata)` can be used with any EVM
/// provider's `eth_call` to check whether `owner` has approved the canonical
/// Permit2 contract to spend their tokens.
///
/// Mirrors Go SDK's `GetPermit2AllowanceReadParams`.
#[must_use]
pub fn permit2_allowance_calldata(token: Address, owner: Address) -> (Address, Bytes) {
    let call = IPermit2Approval::allowanceCall {
        owner,
        spender: PERMIT2_ADDRESS,
    };
    (token, call.abi_encode().into())
}

/// Returns the ABI-encoded calldata for approving the canonical Permit2
/// contract to spend an unlimited amount of `token`.
///
/// The returned tuple `(token_address, calldata)` represents a transaction
/// the user must send (paying gas) before using the Permit2 payment flow.
///
/// Mirrors Go SDK's `CreatePermit2ApprovalTxData`.
#[must_use]
pub fn permit2_approval_calldata(token: Address) -> (Address, Bytes) {
    let call = IPermit2Approval::approveCall {
        spender: PERMIT2_ADDRESS,
        amount: U256::MAX,
    };
    (token, call.abi_encode().into())
}
