//! Session cart backed by durable local storage.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::domain::{Cart, CartLine, Money, Product, ResourceId};
use crate::storage::{LocalStorage, StorageError};

/// Storage key holding the serialized cart.
pub const CART_KEY: &str = "cart";

/// Owns the active cart. Every mutation is persisted as a whole blob and
/// then published to subscribers.
pub struct CartStore {
    state: watch::Sender<Cart>,
    storage: Arc<dyn LocalStorage>,
}

impl CartStore {
    /// Loads the persisted cart. A missing or unreadable blob yields an empty cart.
    pub fn load(storage: Arc<dyn LocalStorage>) -> Result<Self, StorageError> {
        let cart = match storage.get_item(CART_KEY)? {
            Some(blob) => serde_json::from_str(&blob).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding unreadable stored cart");
                Cart::new()
            }),
            None => Cart::new(),
        };
        info!(lines = cart.line_count(), "Loaded cart");
        let (state, _) = watch::channel(cart);
        Ok(Self { state, storage })
    }

    /// Receives a notification after every change to the cart.
    pub fn subscribe(&self) -> watch::Receiver<Cart> { self.state.subscribe() }

    pub fn cart(&self) -> Cart { self.state.borrow().clone() }
    pub fn cart_items(&self) -> Vec<CartLine> { self.state.borrow().lines().to_vec() }
    pub fn total(&self) -> Money { self.state.borrow().total() }
    pub fn subtotal(&self, product_id: &ResourceId) -> Money { self.state.borrow().subtotal(product_id) }
    pub fn item_count(&self) -> u32 { self.state.borrow().item_count() }
    pub fn is_empty(&self) -> bool { self.state.borrow().is_empty() }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_to_cart(&self, product: Product, quantity: u32) -> Result<(), StorageError> {
        self.state.send_modify(|cart| cart.add(product, quantity));
        self.persist()
    }

    /// Sets a line's quantity; zero removes the line. Returns `false` without
    /// persisting when the product is not in the cart.
    #[instrument(skip(self))]
    pub fn update_quantity(&self, product_id: &ResourceId, quantity: u32) -> Result<bool, StorageError> {
        let found = self.state.send_if_modified(|cart| cart.set_quantity(product_id, quantity));
        if found {
            self.persist()?;
        }
        Ok(found)
    }

    #[instrument(skip(self))]
    pub fn remove_from_cart(&self, product_id: &ResourceId) -> Result<(), StorageError> {
        self.state.send_modify(|cart| {
            cart.remove(product_id);
        });
        self.persist()
    }

    #[instrument(skip(self))]
    pub fn clear_cart(&self) -> Result<(), StorageError> {
        self.state.send_modify(Cart::clear);
        self.persist()
    }

    fn persist(&self) -> Result<(), StorageError> {
        let blob = serde_json::to_string(&*self.state.borrow())?;
        self.storage.set_item(CART_KEY, &blob)?;
        debug!(bytes = blob.len(), "Persisted cart");
        Ok(())
    }
}
