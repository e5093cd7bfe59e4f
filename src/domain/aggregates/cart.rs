//! Cart Aggregate

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::product::Product;
use crate::domain::value_objects::{Money, ResourceId};

/// The session cart. Serialized as the bare list of `{product, quantity}`
/// pairs, which is also the persisted blob format.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Money { self.product.price.multiply(self.quantity) }
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn line_count(&self) -> usize { self.lines.len() }
    pub fn item_count(&self) -> u32 { self.lines.iter().map(|l| l.quantity).sum() }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }

    pub fn line(&self, product_id: &ResourceId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product.id == product_id)
    }

    /// Adds `quantity` of `product`, merging into an existing line for the same id.
    /// Adding zero leaves the cart untouched.
    pub fn add(&mut self, product: Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(existing) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            self.lines.push(CartLine { product, quantity });
        }
    }

    /// Sets the quantity of an existing line; a quantity of zero removes it.
    /// Returns `false` when no line matches.
    pub fn set_quantity(&mut self, product_id: &ResourceId, quantity: u32) -> bool {
        let Some(pos) = self.lines.iter().position(|l| &l.product.id == product_id) else { return false };
        if quantity == 0 {
            self.lines.remove(pos);
        } else {
            self.lines[pos].quantity = quantity;
        }
        true
    }

    pub fn remove(&mut self, product_id: &ResourceId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.product.id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) { self.lines.clear(); }

    pub fn total(&self) -> Money { self.lines.iter().map(CartLine::line_total).sum() }

    pub fn subtotal(&self, product_id: &ResourceId) -> Money {
        self.line(product_id).map(CartLine::line_total).unwrap_or(Money::ZERO)
    }
}
