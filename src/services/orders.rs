//! Order placement, updates and reads.

use chrono::Utc;
use tokio::sync::watch;
use tracing::{info, instrument};

use crate::api::{ApiClient, ApiError};
use crate::domain::{Order, OrderDraft, OrderItem, OrderSummary, OrderUpdate, ResourceId};

const ORDERS: &str = "orders";

/// Holds the checkout line-item snapshot and talks to `/orders`.
pub struct OrderClient {
    api: ApiClient,
    items: watch::Sender<Vec<OrderItem>>,
}

impl OrderClient {
    pub fn new(api: ApiClient) -> Self {
        let (items, _) = watch::channel(Vec::new());
        Self { api, items }
    }

    pub fn set_items(&self, items: Vec<OrderItem>) { self.items.send_replace(items); }
    pub fn items(&self) -> Vec<OrderItem> { self.items.borrow().clone() }
    pub fn summary(&self) -> OrderSummary { OrderSummary::from_items(&self.items.borrow()) }

    /// Submits a `pending` order built from the held items and `draft`.
    /// Returns the order as confirmed by the backend.
    #[instrument(skip(self, draft))]
    pub async fn place_order(&self, draft: OrderDraft) -> Result<Order, ApiError> {
        let order = Order::pending(self.items(), draft, Utc::now());
        let created: Order = self.api.post(ORDERS, &order).await?;
        info!(
            order_id = created.id.as_ref().map(ResourceId::as_str).unwrap_or("-"),
            total = %created.total,
            "Order placed"
        );
        Ok(created)
    }

    /// Sends a partial update stamped with the current time.
    #[instrument(skip(self, update), fields(order_id = %id))]
    pub async fn update_order(&self, id: &ResourceId, update: OrderUpdate) -> Result<Order, ApiError> {
        let update = OrderUpdate { updated_at: Some(Utc::now()), ..update };
        let updated: Order = self.api.patch(&format!("{ORDERS}/{id}"), &update).await?;
        info!(status = %updated.status, "Order updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn all_orders(&self) -> Result<Vec<Order>, ApiError> { self.api.get(ORDERS, &[]).await }

    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order_by_id(&self, id: &ResourceId) -> Result<Order, ApiError> {
        self.api.get(&format!("{ORDERS}/{id}"), &[]).await
    }
}
