//! Checkout store
//!
//! Owns the current checkout and its storage. Every mutation runs a reducer to build a complete
//! next snapshot, saves it, and only then makes it current. A failed reducer or save leaves
//! both the current checkout and the saved one as they were.

use serde::{Deserialize, Serialize};
use tracing::{Span, debug, info, warn};

use crate::{
    cart::{Cart, CartItem},
    checkout::{
        Address, BillingDetails, CheckoutError, CheckoutSnapshot, PricingContext, reconcile,
        reducer,
    },
    clock::{Clock, SystemClock},
    coupons::Coupon,
    shipping::{ShippingMethod, ShippingRates},
    storage::{MemoryStorage, SnapshotStorage},
};

/// Screen state that travels with the checkout but does not affect pricing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutFlags {
    /// The shopper's email has been saved for follow-up
    pub email_saved: bool,

    /// The shopper opted to create an account with the order
    pub create_account: bool,

    /// The store was restored from storage in this session
    #[serde(skip)]
    pub hydrated: bool,
}

/// The document written to storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedCheckout {
    /// Priced checkout
    pub snapshot: CheckoutSnapshot,

    /// Screen flags
    #[serde(default)]
    pub flags: CheckoutFlags,
}

/// The single owner of a checkout.
#[derive(Debug)]
pub struct CheckoutStore<S: SnapshotStorage = MemoryStorage> {
    checkout: PersistedCheckout,
    rates: ShippingRates,
    storage: S,
    clock: Box<dyn Clock>,
}

impl Default for CheckoutStore {
    fn default() -> Self {
        Self::new(ShippingRates::default(), MemoryStorage::new(), SystemClock)
    }
}

impl<S: SnapshotStorage> CheckoutStore<S> {
    /// Start an empty checkout. Nothing is read from `storage`.
    pub fn new(rates: ShippingRates, storage: S, clock: impl Clock + 'static) -> Self {
        Self {
            checkout: PersistedCheckout::default(),
            rates,
            storage,
            clock: Box::new(clock),
        }
    }

    /// Restore the checkout saved in `storage`, or start an empty one if nothing is saved. The
    /// restored snapshot is repriced, since rates or the date may have changed since it was
    /// saved.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the saved checkout cannot be read, repriced or re-saved.
    #[tracing::instrument(
        name = "checkout.store.hydrate",
        skip(rates, storage, clock),
        fields(restored = tracing::field::Empty),
        err
    )]
    pub fn hydrate(
        rates: ShippingRates,
        storage: S,
        clock: impl Clock + 'static,
    ) -> Result<Self, CheckoutError> {
        let mut store = Self::new(rates, storage, clock);

        let Some(saved) = store.storage.load()? else {
            Span::current().record("restored", false);
            store.checkout.flags.hydrated = true;

            return Ok(store);
        };

        Span::current().record("restored", true);

        store.checkout.flags = saved.flags;
        store.reduce(|_, ctx| reconcile(&saved.snapshot, ctx))?;
        store.checkout.flags.hydrated = true;

        debug!(lines = store.checkout.snapshot.cart.len(), "restored checkout");

        Ok(store)
    }

    /// The current priced checkout.
    pub fn snapshot(&self) -> &CheckoutSnapshot {
        &self.checkout.snapshot
    }

    /// Screen flags.
    pub fn flags(&self) -> CheckoutFlags {
        self.checkout.flags
    }

    /// The flat-rate shipping table in use.
    pub fn rates(&self) -> &ShippingRates {
        &self.rates
    }

    /// The backing storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Replace every cart line.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the checkout cannot be repriced or saved.
    pub fn set_cart_items(&mut self, cart: Cart) -> Result<(), CheckoutError> {
        self.reduce(|state, ctx| reducer::set_cart_items(state, cart, ctx))
    }

    /// Add a line, merging with an identical line. Returns the index of the affected line.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the merged quantity overflows or the checkout cannot be
    /// repriced or saved.
    #[tracing::instrument(
        name = "checkout.store.add_item",
        skip(self, item),
        fields(product_id = item.product_id(), quantity = item.quantity()),
        err
    )]
    pub fn add_item(&mut self, item: CartItem) -> Result<usize, CheckoutError> {
        let mut cart = self.checkout.snapshot.cart.clone();
        let index = cart.add_item(item)?;

        self.set_cart_items(cart)?;

        Ok(index)
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if there is no such line or the checkout cannot be repriced
    /// or saved.
    #[tracing::instrument(name = "checkout.store.update_quantity", skip(self), err)]
    pub fn update_quantity(&mut self, index: usize, quantity: u32) -> Result<(), CheckoutError> {
        let mut cart = self.checkout.snapshot.cart.clone();
        cart.set_quantity(index, quantity)?;

        self.set_cart_items(cart)
    }

    /// Take one unit off a line, removing the line at its last unit.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if there is no such line or the checkout cannot be repriced
    /// or saved.
    pub fn decrement_item(&mut self, index: usize) -> Result<(), CheckoutError> {
        let mut cart = self.checkout.snapshot.cart.clone();
        cart.decrement(index)?;

        self.set_cart_items(cart)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if there is no such line or the checkout cannot be repriced
    /// or saved.
    #[tracing::instrument(name = "checkout.store.remove_item", skip(self), err)]
    pub fn remove_item(&mut self, index: usize) -> Result<CartItem, CheckoutError> {
        let mut cart = self.checkout.snapshot.cart.clone();
        let removed = cart.remove(index)?;

        self.set_cart_items(cart)?;

        Ok(removed)
    }

    /// Replace the billing details.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the checkout cannot be repriced or saved.
    pub fn set_billing(&mut self, billing: BillingDetails) -> Result<(), CheckoutError> {
        self.reduce(|state, ctx| reducer::set_billing(state, billing, ctx))
    }

    /// Replace the shipping address.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the checkout cannot be repriced or saved.
    pub fn set_shipping_address(&mut self, shipping: Address) -> Result<(), CheckoutError> {
        self.reduce(|state, ctx| reducer::set_shipping_address(state, shipping, ctx))
    }

    /// Select a shipping method. Ignored while a free-shipping coupon is applied.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the checkout cannot be repriced or saved.
    #[tracing::instrument(
        name = "checkout.store.set_shipping_method",
        skip(self, method),
        fields(method = method.id()),
        err
    )]
    pub fn set_shipping_method(&mut self, method: ShippingMethod) -> Result<(), CheckoutError> {
        self.reduce(|state, ctx| reducer::set_shipping_method(state, method, ctx))
    }

    /// Select a payment method.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the checkout cannot be repriced or saved.
    pub fn set_payment_method(
        &mut self,
        payment_method: impl Into<String>,
    ) -> Result<(), CheckoutError> {
        self.reduce(|state, ctx| reducer::set_payment_method(state, payment_method, ctx))
    }

    /// Set the customer's order note.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the checkout cannot be repriced or saved.
    pub fn set_customer_note(&mut self, note: impl Into<String>) -> Result<(), CheckoutError> {
        self.reduce(|state, ctx| reducer::set_customer_note(state, note, ctx))
    }

    /// Validate and apply a coupon.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Rejected`] with the shopper-facing reason if the coupon is not
    /// valid for this checkout, or another [`CheckoutError`] if the checkout cannot be repriced
    /// or saved. The checkout is unchanged in every error case.
    #[tracing::instrument(
        name = "checkout.store.apply_coupon",
        skip(self, coupon),
        fields(
            code = %coupon.code,
            discount_total = tracing::field::Empty,
            total = tracing::field::Empty
        ),
        err(level = "debug")
    )]
    pub fn apply_coupon(&mut self, coupon: Coupon) -> Result<(), CheckoutError> {
        let code = coupon.code.clone();

        let result = self.reduce(|state, ctx| reducer::apply_coupon(state, coupon, ctx));

        if let Err(CheckoutError::Rejected(rejection)) = &result {
            warn!(code = %code, reason = %rejection, "coupon rejected");
        }

        result?;

        let snapshot = &self.checkout.snapshot;
        let span = Span::current();

        span.record("discount_total", snapshot.discount_total);
        span.record("total", snapshot.total);

        info!(code = %code, discount_total = snapshot.discount_total, "applied coupon");

        Ok(())
    }

    /// Remove the applied coupon and go back to flat-rate shipping.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the checkout cannot be repriced or saved.
    #[tracing::instrument(name = "checkout.store.remove_coupon", skip(self), err)]
    pub fn remove_coupon(&mut self) -> Result<(), CheckoutError> {
        let code = self
            .checkout
            .snapshot
            .coupon
            .as_ref()
            .map(|coupon| coupon.code.clone());

        self.reduce(reducer::remove_coupon)?;

        if let Some(code) = code {
            info!(code = %code, "removed coupon");
        }

        Ok(())
    }

    /// Refresh subtotal and total from the cart without re-pricing the coupon or shipping.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the totals cannot be computed or saved.
    pub fn calculate_totals(&mut self) -> Result<(), CheckoutError> {
        self.reduce(|state, _| reducer::calculate_totals(state))
    }

    /// Record whether the shopper's email has been saved.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the checkout cannot be saved.
    pub fn set_email_saved(&mut self, saved: bool) -> Result<(), CheckoutError> {
        let flags = CheckoutFlags {
            email_saved: saved,
            ..self.checkout.flags
        };

        self.commit(self.checkout.snapshot.clone(), flags)
    }

    /// Record whether the shopper wants an account created with the order.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the checkout cannot be saved.
    pub fn set_create_account(&mut self, create: bool) -> Result<(), CheckoutError> {
        let flags = CheckoutFlags {
            create_account: create,
            ..self.checkout.flags
        };

        self.commit(self.checkout.snapshot.clone(), flags)
    }

    /// Empty the checkout and forget the saved copy, as after a placed order.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the saved checkout cannot be removed. The current
    /// checkout is kept in that case.
    #[tracing::instrument(name = "checkout.store.reset", skip(self), err)]
    pub fn reset(&mut self) -> Result<(), CheckoutError> {
        self.storage.clear()?;

        self.checkout = PersistedCheckout {
            snapshot: CheckoutSnapshot::default(),
            flags: CheckoutFlags {
                hydrated: self.checkout.flags.hydrated,
                ..CheckoutFlags::default()
            },
        };

        Ok(())
    }

    /// Run a reducer against the current snapshot and commit its result.
    fn reduce<F, E>(&mut self, reducer: F) -> Result<(), CheckoutError>
    where
        F: FnOnce(&CheckoutSnapshot, &PricingContext<'_>) -> Result<CheckoutSnapshot, E>,
        CheckoutError: From<E>,
    {
        let now = self.clock.now();
        let ctx = PricingContext::new(&self.rates, &now);

        let next = reducer(&self.checkout.snapshot, &ctx)?;

        self.commit(next, self.checkout.flags)
    }

    fn commit(
        &mut self,
        snapshot: CheckoutSnapshot,
        flags: CheckoutFlags,
    ) -> Result<(), CheckoutError> {
        let next = PersistedCheckout { snapshot, flags };

        self.storage.save(&next)?;
        self.checkout = next;

        Ok(())
    }
}
