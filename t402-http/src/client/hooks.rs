//! Lifecycle hooks for the x402 client payment creation pipeline.
//!
//! Hooks allow applications to intercept and customize the payment
//! creation lifecycle. This mirrors [`t402::scheme::SchemeHandlerHooks`]'s
//! before/after/failure shape so the client and facilitator hook APIs stay
//! consistent.
//!
//! ## Hook Lifecycle
//!
//! 1. **`before_payment_creation`** — Run before payment creation; can abort it.
//! 2. **Payment signing executes**
//! 3. **`after_payment_creation`** (on success) — Observes the result.
//! 4. **`on_payment_creation_failure`** (on error) — Can recover with substitute headers.
//!
//! ## Usage
//!
//! All hooks are optional. Multiple hooks of the same type execute in
//! registration order.

use http::HeaderMap;
use t402::proto;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Context passed to client payment creation lifecycle hooks.
#[derive(Debug, Clone)]
pub struct PaymentCreationContext {
    /// The parsed payment requirements from the 402 response.
    pub payment_required: proto::PaymentRequired,
}

/// Context passed to after-payment-creation hooks.
#[derive(Debug, Clone)]
pub struct PaymentCreatedContext {
    /// The original payment creation context.
    pub ctx: PaymentCreationContext,
    /// The signed payment headers that were created.
    pub headers: HeaderMap,
}

/// Context passed to payment-creation-failure hooks.
#[derive(Debug, Clone)]
pub struct PaymentCreationFailureContext {
    /// The original payment creation context.
    pub ctx: PaymentCreationContext,
    /// Description of the error that caused the failure.
    pub error: String,
}

/// Result returned by a before-payment-creation hook.
///
/// If `abort` is `true`, payment creation is skipped and an error with
/// `reason` is returned to the caller instead of retrying the request.
#[derive(Debug, Clone, Default)]
pub struct ClientBeforeHookResult {
    /// Whether to abort payment creation.
    pub abort: bool,
    /// Human-readable reason for aborting.
    pub reason: String,
}

/// Result returned by an on-payment-creation-failure hook.
///
/// If `recovered` is `true`, `headers` replaces the original error.
#[derive(Debug, Clone, Default)]
pub struct ClientFailureHookResult {
    /// Whether this hook recovered from the failure.
    pub recovered: bool,
    /// Replacement payment headers (only used if `recovered` is `true`).
    pub headers: HeaderMap,
}

/// Hook called before client payment creation.
pub type BeforePaymentCreationHookFn = dyn Fn(
        PaymentCreationContext,
    ) -> BoxFut<'static, Result<Option<ClientBeforeHookResult>, String>>
    + Send
    + Sync;

/// Hook called after successful client payment creation.
pub type AfterPaymentCreationHookFn =
    dyn Fn(PaymentCreatedContext) -> BoxFut<'static, Result<(), String>> + Send + Sync;

/// Hook called when client payment creation fails.
pub type OnPaymentCreationFailureHookFn = dyn Fn(
        PaymentCreationFailureContext,
    ) -> BoxFut<'static, Result<Option<ClientFailureHookResult>, String>>
    + Send
    + Sync;

/// Collection of lifecycle hooks for the client payment creation pipeline.
///
/// All hooks are optional. Multiple hooks of the same type execute in
/// registration order.
#[derive(Clone, Default)]
pub struct ClientHooks {
    pub(crate) before_payment_creation: Vec<Arc<BeforePaymentCreationHookFn>>,
    pub(crate) after_payment_creation: Vec<Arc<AfterPaymentCreationHookFn>>,
    pub(crate) on_payment_creation_failure: Vec<Arc<OnPaymentCreationFailureHookFn>>,
}

impl std::fmt::Debug for ClientHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHooks")
            .field("before_payment_creation", &self.before_payment_creation.len())
            .field("after_payment_creation", &self.after_payment_creation.len())
            .field(
                "on_payment_creation_failure",
                &self.on_payment_creation_failure.len(),
            )
            .finish()
    }
}

impl ClientHooks {
    /// Returns `true` if no hooks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.before_payment_creation.is_empty()
            && self.after_payment_creation.is_empty()
            && self.on_payment_creation_failure.is_empty()
    }

    /// Registers a hook to execute before payment creation.
    #[must_use]
    pub fn on_before_payment_creation<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(PaymentCreationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<ClientBeforeHookResult>, String>> + Send + 'static,
    {
        self.before_payment_creation
            .push(Arc::new(move |ctx| Box::pin(hook(ctx))));
        self
    }

    /// Registers a hook to execute after successful payment creation.
    #[must_use]
    pub fn on_after_payment_creation<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(PaymentCreatedContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.after_payment_creation
            .push(Arc::new(move |ctx| Box::pin(hook(ctx))));
        self
    }

    /// Registers a hook to execute when payment creation fails.
    #[must_use]
    pub fn on_payment_creation_failure<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(PaymentCreationFailureContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<ClientFailureHookResult>, String>> + Send + 'static,
    {
        self.on_payment_creation_failure
            .push(Arc::new(move |ctx| Box::pin(hook(ctx))));
        self
    }
}
