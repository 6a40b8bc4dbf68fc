//! Cart

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::PricingError;

pub mod item;

pub use item::{
    CartItem, CartItemKey, Category, CategoryId, CustomField, ProductId, VariationSelection,
};

/// Errors related to cart construction and edits.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// A cart line must hold at least one unit.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// A unit price below zero.
    #[error("unit price {0} is negative")]
    NegativePrice(i64),

    /// A line index was not found in the cart.
    #[error("cart line {0} not found")]
    ItemNotFound(usize),

    /// Merging quantities overflowed.
    #[error("cart line quantity overflowed")]
    QuantityOverflow,
}

/// Ordered list of cart lines.
///
/// Lines are unique by [`CartItemKey`]: adding a line whose key is already present increments
/// the existing line instead. Deserialized carts go through the same merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cart from the given lines, merging lines that share a key.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityOverflow`] if merged quantities overflow.
    pub fn with_items(items: impl IntoIterator<Item = CartItem>) -> Result<Self, CartError> {
        let mut cart = Self::new();

        items
            .into_iter()
            .try_for_each(|item| cart.add_item(item).map(|_index| ()))?;

        Ok(cart)
    }

    /// Add a line to the cart, returning the index of the line that holds it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityOverflow`] if merging quantities overflows.
    pub fn add_item(&mut self, item: CartItem) -> Result<usize, CartError> {
        let existing = self
            .items
            .iter()
            .position(|line| line.key() == item.key());

        let Some(index) = existing else {
            self.items.push(item);

            return Ok(self.items.len() - 1);
        };

        let line = self
            .items
            .get_mut(index)
            .ok_or(CartError::ItemNotFound(index))?;

        let quantity = line
            .quantity()
            .checked_add(item.quantity())
            .ok_or(CartError::QuantityOverflow)?;

        line.set_quantity(quantity)?;

        Ok(index)
    }

    /// Set the quantity of a line. A quantity of zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if there is no line at `index`.
    pub fn set_quantity(&mut self, index: usize, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove(index).map(|_item| ());
        }

        self.items
            .get_mut(index)
            .ok_or(CartError::ItemNotFound(index))?
            .set_quantity(quantity)
    }

    /// Remove one unit from a line, removing the line when its last unit goes.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if there is no line at `index`.
    pub fn decrement(&mut self, index: usize) -> Result<(), CartError> {
        let quantity = self.get(index)?.quantity();

        self.set_quantity(index, quantity - 1)
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if there is no line at `index`.
    pub fn remove(&mut self, index: usize) -> Result<CartItem, CartError> {
        if index >= self.items.len() {
            return Err(CartError::ItemNotFound(index));
        }

        Ok(self.items.remove(index))
    }

    /// Get a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if there is no line at `index`.
    pub fn get(&self, index: usize) -> Result<&CartItem, CartError> {
        self.items.get(index).ok_or(CartError::ItemNotFound(index))
    }

    /// Iterate over the lines in the cart.
    pub fn iter(&self) -> impl Iterator<Item = &CartItem> {
        self.items.iter()
    }

    /// Sum of `base_price * quantity` over every line.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the sum does not fit in cents.
    pub fn subtotal(&self) -> Result<i64, PricingError> {
        self.items.iter().try_fold(0_i64, |acc, item| {
            acc.checked_add(item.price()?)
                .ok_or(PricingError::Overflow)
        })
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity())).sum()
    }

    /// Get the number of lines in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut CartItem> {
        self.items.iter_mut()
    }
}

impl TryFrom<Vec<CartItem>> for Cart {
    type Error = CartError;

    fn try_from(items: Vec<CartItem>) -> Result<Self, Self::Error> {
        Self::with_items(items)
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
