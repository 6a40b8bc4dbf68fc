//! Checkout errors

use thiserror::Error;

use crate::{
    cart::CartError, coupons::CouponRejection, money::PricingError, storage::StorageError,
};

/// Errors applying a coupon to a checkout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplyCouponError {
    /// The coupon failed validation. The message is meant for the shopper.
    #[error(transparent)]
    Rejected(#[from] CouponRejection),

    /// The checkout could not be repriced with the coupon.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Errors from checkout store mutations. The stored checkout is unchanged when one is returned.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The coupon failed validation.
    #[error(transparent)]
    Rejected(#[from] CouponRejection),

    /// Totals could not be computed.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// The cart change was invalid.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The checkout could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ApplyCouponError> for CheckoutError {
    fn from(err: ApplyCouponError) -> Self {
        match err {
            ApplyCouponError::Rejected(rejection) => CheckoutError::Rejected(rejection),
            ApplyCouponError::Pricing(pricing) => CheckoutError::Pricing(pricing),
        }
    }
}

impl CheckoutError {
    /// The rejection to show the shopper, if this error is one.
    pub fn rejection(&self) -> Option<&CouponRejection> {
        match self {
            CheckoutError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}
