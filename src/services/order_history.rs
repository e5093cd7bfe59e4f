//! Order history view-model: list, status filter, detail and cancellation.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, instrument};

use crate::api::ApiError;
use crate::domain::{Order, OrderStatus, OrderUpdate, ResourceId};
use crate::services::orders::OrderClient;

pub const CANCEL_FAILED_MESSAGE: &str = "An error occurred while trying to cancel the order.";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    pub fn matches(&self, order: &Order) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => &order.status == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Self::All);
        }
        match OrderStatus::parse(s) {
            OrderStatus::Unknown(other) => {
                let known = OrderStatus::KNOWN;
                let names: Vec<&str> = known.iter().map(OrderStatus::as_str).collect();
                Err(format!("unknown order status '{other}', expected all or one of: {}", names.join(", ")))
            }
            status => Ok(Self::Only(status)),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::All => f.write_str("all"), Self::Only(status) => write!(f, "{status}") }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryState {
    pub orders: Vec<Order>,
    pub status_filter: StatusFilter,
    pub selected: Option<Order>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self { orders: vec![], status_filter: StatusFilter::All, selected: None, is_loading: true, error: None }
    }
}

impl HistoryState {
    /// Orders passing the status filter, in backend order.
    pub fn visible(&self) -> Vec<&Order> { self.orders.iter().filter(|o| self.status_filter.matches(o)).collect() }
    pub fn show_detail(&self) -> bool { self.selected.is_some() }
}

pub struct OrderHistory {
    client: Arc<OrderClient>,
    state: watch::Sender<HistoryState>,
}

impl OrderHistory {
    pub fn new(client: Arc<OrderClient>) -> Self {
        let (state, _) = watch::channel(HistoryState::default());
        Self { client, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<HistoryState> { self.state.subscribe() }
    pub fn snapshot(&self) -> HistoryState { self.state.borrow().clone() }

    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<(), ApiError> {
        self.state.send_modify(|s| s.is_loading = true);
        let result = self.client.all_orders().await;
        self.state.send_modify(|s| {
            s.is_loading = false;
            match &result {
                Ok(orders) => {
                    s.orders = orders.clone();
                    s.error = None;
                }
                Err(e) => s.error = Some(e.to_string()),
            }
        });
        result.map(|_| ()).inspect_err(|e| error!(error = %e, "Error loading orders"))
    }

    pub fn set_status_filter(&self, filter: StatusFilter) { self.state.send_modify(|s| s.status_filter = filter); }

    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn view_details(&self, id: &ResourceId) -> Result<(), ApiError> {
        let order = self
            .client
            .order_by_id(id)
            .await
            .inspect_err(|e| error!(error = %e, "Error fetching order details"))?;
        self.state.send_modify(|s| s.selected = Some(order));
        Ok(())
    }

    pub fn close_details(&self) { self.state.send_modify(|s| s.selected = None); }

    /// Asks the backend to cancel an order. On failure the list is left as it was.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel_order(&self, id: &ResourceId) -> Result<Order, ApiError> {
        match self.client.update_order(id, OrderUpdate::status(OrderStatus::Cancelled)).await {
            Ok(updated) => {
                self.state.send_modify(|s| {
                    for order in s.orders.iter_mut().filter(|o| o.id.as_ref() == Some(id)) {
                        *order = updated.clone();
                    }
                    if let Some(selected) = s.selected.as_mut().filter(|o| o.id.as_ref() == Some(id)) {
                        *selected = updated.clone();
                    }
                    s.error = None;
                });
                Ok(updated)
            }
            Err(e) => {
                error!(error = %e, "Error cancelling order");
                self.state.send_modify(|s| s.error = Some(CANCEL_FAILED_MESSAGE.to_string()));
                Err(e)
            }
        }
    }
}
