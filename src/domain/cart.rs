use crate::error::{PlaceOrderError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the user session a place-order process is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new `SessionId` from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw session id, as used for storage keys.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A single cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub sku: String,
    #[serde(default)]
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl CartItem {
    /// Creates a new cart line with an empty display name.
    ///
    /// # Arguments
    ///
    /// * `sku` - The stock keeping unit of the product.
    /// * `quantity` - The number of units ordered.
    /// * `unit_price` - The price of a single unit.
    pub fn new(sku: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            sku: sku.into(),
            name: String::new(),
            quantity,
            unit_price,
        }
    }

    /// Unit price times quantity, or `None` if the product overflows.
    pub fn row_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Snapshot of a cart taken when a place-order process starts.
///
/// Later states read this snapshot, never the live cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    pub items: Vec<CartItem>,
    pub currency: String,
    #[serde(default)]
    pub contact_email: Option<String>,
}

impl Cart {
    /// Creates a new, empty cart.
    ///
    /// # Arguments
    ///
    /// * `id` - The identifier of the cart in the shop.
    /// * `currency` - The ISO 4217 code all prices are expressed in.
    pub fn new(id: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            items: Vec::new(),
            currency: currency.into(),
            contact_email: None,
        }
    }

    /// Appends a line to the cart.
    pub fn with_item(mut self, item: CartItem) -> Self {
        self.items.push(item);
        self
    }

    /// Sets the email the order confirmation is sent to.
    pub fn with_contact_email(mut self, email: impl Into<String>) -> Self {
        self.contact_email = Some(email.into());
        self
    }

    /// Sum of all row totals.
    ///
    /// Fails with `ValidationError` when a row total or the sum overflows.
    pub fn grand_total(&self) -> Result<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |total, item| {
                item.row_total().and_then(|row| total.checked_add(row))
            })
            .ok_or_else(|| PlaceOrderError::ValidationError("grand total overflows".to_string()))
    }

    /// Checks whether the cart may be turned into an order.
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(PlaceOrderError::ValidationError("Cart is empty".to_string()));
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity == 0) {
            return Err(PlaceOrderError::ValidationError(format!(
                "Item {} has zero quantity",
                item.sku
            )));
        }
        if let Some(item) = self.items.iter().find(|i| i.unit_price < Decimal::ZERO) {
            return Err(PlaceOrderError::ValidationError(format!(
                "Item {} has a negative price",
                item.sku
            )));
        }
        if self.grand_total()? <= Decimal::ZERO {
            return Err(PlaceOrderError::ValidationError(
                "Grand total must be positive".to_string(),
            ));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PlaceOrderError::ValidationError(format!(
                "Invalid currency code '{}'",
                self.currency
            )));
        }
        match &self.contact_email {
            Some(email) if email.contains('@') => Ok(()),
            _ => Err(PlaceOrderError::ValidationError(
                "Contact email is missing or invalid".to_string(),
            )),
        }
    }
}
