//! Checkout service
//!
//! Connects a [`CheckoutStore`] to the two remote calls a checkout makes: looking up a coupon
//! by code and placing the order. Neither call is retried here.

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Span, info};

use crate::{
    checkout::{CheckoutError, CheckoutStore},
    coupons::{Coupon, CouponRejection},
    storage::{MemoryStorage, SnapshotStorage},
    woocommerce::{OrderPayload, OrderPayloadError, WooCommerceError, coupons_from_json},
};

/// Coupon lookup failures.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The coupon service could not be reached.
    #[error("coupon lookup unavailable: {0}")]
    Unavailable(String),

    /// The coupon service answered with something unusable.
    #[error(transparent)]
    Invalid(#[from] WooCommerceError),
}

/// Order submission failures.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The store refused the order.
    #[error("order rejected: {0}")]
    Rejected(String),

    /// The store could not be reached.
    #[error("order gateway unavailable: {0}")]
    Unavailable(String),
}

/// The created order, as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    /// Order id
    pub id: u64,

    /// Order status, e.g. `pending`
    pub status: String,

    /// Charged total as a decimal string
    pub total: String,
}

/// Finds coupons by code.
#[automock]
#[async_trait]
pub trait CouponLookup: Send + Sync {
    /// Find the coupon with this code, if there is one.
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, LookupError>;
}

/// Places orders.
#[automock]
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Create an order.
    async fn create_order(
        &self,
        order: &OrderPayload,
    ) -> Result<OrderConfirmation, GatewayError>;
}

/// Checkout service errors
#[derive(Debug, Error)]
pub enum CheckoutServiceError {
    /// No code was entered.
    #[error("Please enter a coupon code.")]
    EmptyCode,

    /// No coupon has this code.
    #[error("Coupon \"{0}\" does not exist.")]
    CouponNotFound(String),

    /// Coupon lookup failed.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The checkout refused the change.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The checkout cannot be turned into an order.
    #[error(transparent)]
    Payload(#[from] OrderPayloadError),

    /// Order submission failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl CheckoutServiceError {
    /// The coupon rejection to show the shopper, if this error is one.
    pub fn rejection(&self) -> Option<&CouponRejection> {
        match self {
            CheckoutServiceError::Checkout(err) => err.rejection(),
            _ => None,
        }
    }
}

/// A checkout store with its remote collaborators.
#[derive(Debug)]
pub struct CheckoutService<L, G, S: SnapshotStorage = MemoryStorage> {
    lookup: L,
    gateway: G,
    store: CheckoutStore<S>,
}

impl<L, G, S> CheckoutService<L, G, S>
where
    L: CouponLookup,
    G: OrderGateway,
    S: SnapshotStorage,
{
    /// Create a new service around `store`.
    pub fn new(lookup: L, gateway: G, store: CheckoutStore<S>) -> Self {
        Self {
            lookup,
            gateway,
            store,
        }
    }

    /// The checkout store.
    pub fn store(&self) -> &CheckoutStore<S> {
        &self.store
    }

    /// The checkout store, for cart and address changes.
    pub fn store_mut(&mut self) -> &mut CheckoutStore<S> {
        &mut self.store
    }

    /// Look up a coupon by the code the shopper typed and apply it.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutServiceError`] if the code is blank or unknown, the lookup fails,
    /// or the checkout rejects the coupon. The checkout is unchanged in every error case.
    #[tracing::instrument(name = "checkout.service.apply_coupon_code", skip(self), err)]
    pub async fn apply_coupon_code(&mut self, code: &str) -> Result<(), CheckoutServiceError> {
        let code = code.trim();

        if code.is_empty() {
            return Err(CheckoutServiceError::EmptyCode);
        }

        let coupon = self
            .lookup
            .find_by_code(code)
            .await?
            .ok_or_else(|| CheckoutServiceError::CouponNotFound(code.to_string()))?;

        self.store.apply_coupon(coupon)?;

        Ok(())
    }

    /// Place the order for the current checkout, then empty it.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutServiceError`] if the checkout cannot be turned into an order or the
    /// gateway fails. The checkout is kept for another attempt in those cases.
    #[tracing::instrument(
        name = "checkout.service.submit_order",
        skip(self),
        fields(order_id = tracing::field::Empty),
        err
    )]
    pub async fn submit_order(&mut self) -> Result<OrderConfirmation, CheckoutServiceError> {
        let payload = OrderPayload::try_from(self.store.snapshot())?;

        let confirmation = self.gateway.create_order(&payload).await?;

        Span::current().record("order_id", confirmation.id);

        self.store.reset()?;

        info!(
            order_id = confirmation.id,
            status = %confirmation.status,
            total = %confirmation.total,
            "placed order"
        );

        Ok(confirmation)
    }
}

/// Coupons held in memory, keyed by lowercased code.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCoupons {
    coupons: FxHashMap<String, Coupon>,
}

impl InMemoryCoupons {
    /// Create a lookup over `coupons`.
    pub fn new(coupons: impl IntoIterator<Item = Coupon>) -> Self {
        Self {
            coupons: coupons
                .into_iter()
                .map(|coupon| (coupon.code.trim().to_lowercase(), coupon))
                .collect(),
        }
    }

    /// Create a lookup from a `WooCommerce` coupon list response.
    ///
    /// # Errors
    ///
    /// Returns a [`WooCommerceError`] if the JSON is not a valid coupon list.
    pub fn from_woocommerce_json(json: &str) -> Result<Self, WooCommerceError> {
        Ok(Self::new(coupons_from_json(json)?))
    }

    /// Number of coupons held.
    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    /// Check if no coupons are held.
    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }
}

#[async_trait]
impl CouponLookup for InMemoryCoupons {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, LookupError> {
        Ok(self.coupons.get(&code.trim().to_lowercase()).cloned())
    }
}
