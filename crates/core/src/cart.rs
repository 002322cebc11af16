//! Client-side shopping cart.
//!
//! The cart holds product snapshots with quantities. There is at most one
//! line per product id, and every line has a quantity of at least one:
//! driving a quantity to zero removes the line.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Product, ProductId};

/// A product snapshot paired with a purchase quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    /// Price of this line (unit price times quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// The customer's local cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add one unit of `product`.
    ///
    /// Increments the existing line for the product, or appends a new line
    /// with quantity 1 holding a copy of the product.
    pub fn add(&mut self, product: &Product) {
        if let Some(line) = self.line_mut(product.id) {
            line.quantity = line.quantity.saturating_add(1);
            return;
        }
        self.lines.push(CartLine {
            product: product.clone(),
            quantity: 1,
        });
    }

    /// Set the quantity for a product. Zero or negative removes the line.
    ///
    /// Setting a quantity for a product that is not in the cart is a no-op.
    pub fn update_quantity(&mut self, product_id: ProductId, new_quantity: i64) {
        let Ok(quantity) = u32::try_from(new_quantity) else {
            if new_quantity <= 0 {
                self.remove(product_id);
            } else if let Some(line) = self.line_mut(product_id) {
                line.quantity = u32::MAX;
            }
            return;
        };
        if quantity == 0 {
            self.remove(product_id);
        } else if let Some(line) = self.line_mut(product_id) {
            line.quantity = quantity;
        }
    }

    /// Remove the line for a product, if present.
    pub fn remove(&mut self, product_id: ProductId) {
        self.lines.retain(|line| line.product.id != product_id);
    }

    /// Empty the cart (after checkout or logout).
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of `price * quantity` across all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// The cart lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for a product, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product.id == product_id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product.id == product_id)
    }
}
