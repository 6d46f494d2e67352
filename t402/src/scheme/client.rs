//! Client-side scheme abstractions for t402 payment handling.
//!
//! This module provides the trait that HTTP clients use to turn a decoded
//! 402 challenge into one or more candidate signed payments, plus the
//! policy/selector pipeline used to narrow candidates down to exactly one.

use crate::chain::ChainId;
use crate::proto;
use crate::scheme::server::SchemeError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type SignFuture = Pin<Box<dyn Future<Output = Result<String, T402Error>> + Send>>;

/// Errors raised while building or selecting a client-side payment.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum T402Error {
    /// The 402 response body/header could not be decoded.
    #[error("failed to parse 402 response: {0}")]
    ParseError(String),
    /// No registered scheme client produced a candidate that survived policy
    /// filtering, or the selector returned nothing.
    #[error("no registered scheme could satisfy any offered payment requirement")]
    NoMatchingPaymentOption,
    /// The original request could not be cloned for the single retry.
    #[error("request body could not be cloned for retry")]
    RequestNotCloneable,
    /// The chosen scheme client failed to produce a signed payload.
    #[error("failed to construct payment payload: {0}")]
    SigningFailed(#[from] SchemeError),
}

/// A single payment option produced by one registered [`T402SchemeClient`]
/// for one entry of a decoded [`proto::PaymentRequired`] challenge.
///
/// Candidates are opaque until [`PaymentCandidate::sign`] is called, which
/// invokes the owning scheme client's payload-construction logic and
/// base64/JSON-encodes the result ready for the payment header.
pub struct PaymentCandidate {
    /// The scheme name this candidate was produced by (e.g. `"exact"`).
    pub scheme: String,
    /// The network this candidate would pay on.
    pub chain_id: ChainId,
    /// The atomic amount this candidate would pay, as a decimal string.
    pub amount: String,
    signer: Arc<dyn Fn() -> SignFuture + Send + Sync>,
}

impl fmt::Debug for PaymentCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentCandidate")
            .field("scheme", &self.scheme)
            .field("chain_id", &self.chain_id)
            .field("amount", &self.amount)
            .finish_non_exhaustive()
    }
}

impl PaymentCandidate {
    /// Creates a new candidate backed by an async signing closure.
    ///
    /// The closure is called exactly once, when [`sign`](Self::sign) is
    /// invoked by the client engine after policy filtering and selection.
    pub fn new<F, Fut>(scheme: impl Into<String>, chain_id: ChainId, amount: impl Into<String>, signer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, T402Error>> + Send + 'static,
    {
        Self {
            scheme: scheme.into(),
            chain_id,
            amount: amount.into(),
            signer: Arc::new(move || Box::pin(signer())),
        }
    }

    /// Invokes the scheme client to construct and encode the signed payload
    /// for this candidate.
    ///
    /// # Errors
    ///
    /// Returns [`T402Error::SigningFailed`] if the scheme client cannot
    /// produce a payload (e.g. an unreachable signer, a malformed requirement).
    pub async fn sign(&self) -> Result<String, T402Error> {
        (self.signer)().await
    }

    /// Parses [`PaymentCandidate::amount`] as a `u128`, if it fits.
    ///
    /// Amounts are protocol-level decimal strings and may exceed `u128` in
    /// principle; callers that need exact bigint comparisons should compare
    /// the strings directly after left-padding to equal length instead.
    #[must_use]
    pub fn amount_u128(&self) -> Option<u128> {
        self.amount.parse().ok()
    }
}

/// Client-side face of a payment scheme: turns a decoded 402 challenge into
/// zero or more [`PaymentCandidate`]s this scheme client is able to satisfy.
///
/// Implementations typically inspect `payment_required.accepts` (v2) or the
/// top-level `scheme`/`network` fields (v1) and return one candidate per
/// entry they recognize.
pub trait T402SchemeClient: Send + Sync {
    /// The scheme name this client handles (e.g. `"exact"`).
    fn scheme(&self) -> &str;

    /// Produces payment candidates for every requirement in
    /// `payment_required` this client can satisfy.
    fn accept(&self, payment_required: &proto::PaymentRequired) -> Vec<PaymentCandidate>;
}

/// A filtering stage applied to the list of payment candidates before
/// selection. Policies run in registration order; a policy that returns an
/// empty list short-circuits the pipeline with
/// [`T402Error::NoMatchingPaymentOption`].
pub trait PaymentPolicy: Send + Sync {
    /// Filters `candidates`, returning the subset this policy allows.
    fn apply<'a>(&self, candidates: Vec<&'a PaymentCandidate>) -> Vec<&'a PaymentCandidate>;
}

/// Chooses exactly one candidate from the policy-filtered list.
pub trait PaymentSelector: Send + Sync {
    /// Selects a candidate, or `None` if no candidate is acceptable.
    fn select<'a>(&self, candidates: &[&'a PaymentCandidate]) -> Option<&'a PaymentCandidate>;
}

/// Selects the first candidate in the filtered list, in the order scheme
/// clients were registered and requirements were offered. The default
/// selector for [`crate::scheme`] consumers that don't need more nuance.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstMatch;

impl PaymentSelector for FirstMatch {
    fn select<'a>(&self, candidates: &[&'a PaymentCandidate]) -> Option<&'a PaymentCandidate> {
        candidates.first().copied()
    }
}

/// Prefers a candidate on a specific chain, falling back to the first match
/// if none target that chain.
#[derive(Debug, Clone)]
pub struct PreferChain(pub ChainId);

impl PaymentSelector for PreferChain {
    fn select<'a>(&self, candidates: &[&'a PaymentCandidate]) -> Option<&'a PaymentCandidate> {
        candidates
            .iter()
            .find(|c| c.chain_id == self.0)
            .or_else(|| candidates.first())
            .copied()
    }
}

/// Selects the candidate declaring the largest atomic amount.
///
/// Candidates whose amount does not parse as a `u128` are treated as zero;
/// ties keep the earliest candidate in iteration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxAmount;

impl PaymentSelector for MaxAmount {
    fn select<'a>(&self, candidates: &[&'a PaymentCandidate]) -> Option<&'a PaymentCandidate> {
        candidates
            .iter()
            .copied()
            .max_by_key(|c| c.amount_u128().unwrap_or(0))
    }
}
