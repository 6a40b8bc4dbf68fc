//! Cart items

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    cart::CartError,
    money::{PricingError, times_quantity},
};

/// `WooCommerce` product identifier.
pub type ProductId = u64;

/// `WooCommerce` product category identifier.
pub type CategoryId = u64;

/// A chosen product variation attribute, e.g. `Pole Shape = Square`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariationSelection {
    /// Attribute name
    pub name: String,

    /// Selected option
    pub value: String,
}

impl VariationSelection {
    /// Create a new variation selection.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A free-form customisation entered by the shopper, e.g. a custom pole circumference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomField {
    /// Field label
    pub name: String,

    /// Entered value
    pub value: String,
}

impl CustomField {
    /// Create a new custom field.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Category membership of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category id
    pub id: CategoryId,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// URL slug
    #[serde(default)]
    pub slug: String,
}

/// Identity of a cart line for merge-vs-new-line decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItemKey<'a> {
    /// Product id
    pub product_id: ProductId,

    /// Variation selections, in the order they were chosen
    pub variations: &'a [VariationSelection],

    /// Custom fields, in the order they were entered
    pub custom_fields: &'a [CustomField],
}

/// One line in the cart.
///
/// `base_price` is the authoritative unit price in cents; the line price is always derived
/// from it and the quantity, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CartItemRecord", into = "CartItemRecord")]
pub struct CartItem {
    product_id: ProductId,
    name: String,
    base_price: i64,
    quantity: u32,
    variation_id: Option<u64>,
    variations: SmallVec<[VariationSelection; 2]>,
    custom_fields: Vec<CustomField>,
    categories: Vec<Category>,
    discount: Option<i64>,
}

impl CartItem {
    /// Create a new cart line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] if `quantity` is zero and
    /// [`CartError::NegativePrice`] if `base_price` is below zero.
    pub fn new(
        product_id: ProductId,
        name: impl Into<String>,
        base_price: i64,
        quantity: u32,
    ) -> Result<Self, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        if base_price < 0 {
            return Err(CartError::NegativePrice(base_price));
        }

        Ok(Self {
            product_id,
            name: name.into(),
            base_price,
            quantity,
            variation_id: None,
            variations: SmallVec::new(),
            custom_fields: Vec::new(),
            categories: Vec::new(),
            discount: None,
        })
    }

    /// Set the selected variation id.
    #[must_use]
    pub fn with_variation_id(mut self, variation_id: u64) -> Self {
        self.variation_id = Some(variation_id);
        self
    }

    /// Set the variation selections.
    #[must_use]
    pub fn with_variations(
        mut self,
        variations: impl IntoIterator<Item = VariationSelection>,
    ) -> Self {
        self.variations = variations.into_iter().collect();
        self
    }

    /// Set the custom fields.
    #[must_use]
    pub fn with_custom_fields(mut self, fields: impl IntoIterator<Item = CustomField>) -> Self {
        self.custom_fields = fields.into_iter().collect();
        self
    }

    /// Set the category memberships.
    #[must_use]
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    /// Returns the product id.
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Returns the product name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the unit price in cents.
    pub fn base_price(&self) -> i64 {
        self.base_price
    }

    /// Returns the quantity (always at least one).
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the selected variation id, if any.
    pub fn variation_id(&self) -> Option<u64> {
        self.variation_id
    }

    /// Returns the variation selections.
    pub fn variations(&self) -> &[VariationSelection] {
        &self.variations
    }

    /// Returns the custom fields.
    pub fn custom_fields(&self) -> &[CustomField] {
        &self.custom_fields
    }

    /// Returns the category memberships.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Returns whether the line belongs to the given category.
    pub fn in_category(&self, category: CategoryId) -> bool {
        self.categories.iter().any(|c| c.id == category)
    }

    /// Returns the coupon discount last allocated to this line, if any.
    pub fn discount(&self) -> Option<i64> {
        self.discount
    }

    /// Returns the line price (`base_price * quantity`).
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the line price does not fit in cents.
    pub fn price(&self) -> Result<i64, PricingError> {
        times_quantity(self.base_price, self.quantity)
    }

    /// Returns the merge identity of this line.
    pub fn key(&self) -> CartItemKey<'_> {
        CartItemKey {
            product_id: self.product_id,
            variations: &self.variations,
            custom_fields: &self.custom_fields,
        }
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        self.quantity = quantity;

        Ok(())
    }

    pub(crate) fn set_discount(&mut self, discount: Option<i64>) {
        self.discount = discount;
    }
}

/// Serialised shape of a cart line. `price` is written for consumers and ignored on read.
#[derive(Debug, Serialize, Deserialize)]
struct CartItemRecord {
    product_id: ProductId,
    #[serde(default)]
    name: String,
    base_price: i64,
    #[serde(default, skip_deserializing)]
    price: i64,
    quantity: u32,
    #[serde(default)]
    variation_id: Option<u64>,
    #[serde(default)]
    variations: SmallVec<[VariationSelection; 2]>,
    #[serde(default)]
    custom_fields: Vec<CustomField>,
    #[serde(default)]
    categories: Vec<Category>,
    #[serde(default)]
    discount: Option<i64>,
}

impl TryFrom<CartItemRecord> for CartItem {
    type Error = CartError;

    fn try_from(record: CartItemRecord) -> Result<Self, Self::Error> {
        let mut item = CartItem::new(
            record.product_id,
            record.name,
            record.base_price,
            record.quantity,
        )?
        .with_variations(record.variations)
        .with_custom_fields(record.custom_fields)
        .with_categories(record.categories);

        item.variation_id = record.variation_id;
        item.discount = record.discount;

        Ok(item)
    }
}

impl From<CartItem> for CartItemRecord {
    fn from(item: CartItem) -> Self {
        let price = item.base_price.saturating_mul(i64::from(item.quantity));

        Self {
            product_id: item.product_id,
            name: item.name,
            base_price: item.base_price,
            price,
            quantity: item.quantity,
            variation_id: item.variation_id,
            variations: item.variations,
            custom_fields: item.custom_fields,
            categories: item.categories,
            discount: item.discount,
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn new_rejects_zero_quantity() {
        let result = CartItem::new(1, "Bumper", 1_000, 0);

        assert!(matches!(result, Err(CartError::InvalidQuantity)));
    }

    #[test]
    fn new_rejects_negative_price() {
        let result = CartItem::new(1, "Bumper", -1, 1);

        assert!(matches!(result, Err(CartError::NegativePrice(-1))));
    }

    #[test]
    fn price_is_unit_price_times_quantity() -> TestResult {
        let item = CartItem::new(1, "Bumper", 11_900, 3)?;

        assert_eq!(item.base_price(), 11_900);
        assert_eq!(item.price()?, 35_700);

        Ok(())
    }

    #[test]
    fn key_includes_variations_and_custom_fields() -> TestResult {
        let square = CartItem::new(1, "Bumper", 1_000, 1)?
            .with_variations([VariationSelection::new("Pole Shape", "Square")]);
        let round = CartItem::new(1, "Bumper", 1_000, 1)?
            .with_variations([VariationSelection::new("Pole Shape", "Round")]);
        let custom = CartItem::new(1, "Bumper", 1_000, 1)?
            .with_variations([VariationSelection::new("Pole Shape", "Square")])
            .with_custom_fields([CustomField::new("Pole Circumference", "31in")]);

        assert_ne!(square.key(), round.key());
        assert_ne!(square.key(), custom.key());
        assert_eq!(square.key(), square.clone().key());

        Ok(())
    }

    #[test]
    fn serialised_item_carries_derived_price() -> TestResult {
        let item = CartItem::new(7, "Dock Wheel", 2_500, 2)?;

        let json = serde_json::to_value(&item)?;

        assert_eq!(json["base_price"], 2_500);
        assert_eq!(json["price"], 5_000);

        Ok(())
    }

    #[test]
    fn deserialising_zero_quantity_fails() {
        let json = r#"{"product_id": 7, "base_price": 2500, "quantity": 0}"#;

        let result = serde_json::from_str::<CartItem>(json);

        assert!(result.is_err());
    }

    #[test]
    fn deserialising_ignores_stale_price() -> TestResult {
        let json = r#"{"product_id": 7, "base_price": 2500, "price": 1, "quantity": 2}"#;

        let item = serde_json::from_str::<CartItem>(json)?;

        assert_eq!(item.price()?, 5_000);

        Ok(())
    }
}
