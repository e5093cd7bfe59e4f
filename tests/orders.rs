//! Order history against the fake backend.

mod common;

use std::sync::Arc;

use common::Backend;
use storefront_client::services::order_history::CANCEL_FAILED_MESSAGE;
use storefront_client::services::StatusFilter;
use storefront_client::{
    Cart, CatalogClient, OrderClient, OrderDraft, OrderHistory, OrderItem, OrderStatus, OrderUpdate, PaymentMethod,
    ResourceId,
};

/// Places one order per product id through a fresh order client.
async fn seed_orders(product_ids: &[u64]) -> (Arc<Backend>, Arc<OrderClient>, Vec<ResourceId>) {
    let backend = Backend::seeded();
    let api = common::serve(Arc::clone(&backend)).await;
    let catalog = CatalogClient::new(api.clone());
    let client = Arc::new(OrderClient::new(api));

    let mut ids = Vec::new();
    for id in product_ids {
        let product = catalog.product(&ResourceId::from(*id)).await.unwrap();
        let mut cart = Cart::new();
        cart.add((*product).clone(), 1);
        client.set_items(cart.lines().iter().map(OrderItem::from_line).collect());
        let draft = OrderDraft {
            shipping_address: common::address(),
            billing_address: common::address(),
            payment_method: PaymentMethod::PayPal,
            notes: None,
        };
        ids.push(client.place_order(draft).await.unwrap().id.unwrap());
    }
    (backend, client, ids)
}

#[tokio::test]
async fn test_load_and_filter_by_status() {
    let (_backend, client, ids) = seed_orders(&[1, 2, 7]).await;
    client.update_order(&ids[1], OrderUpdate::status(OrderStatus::Shipped)).await.unwrap();

    let history = OrderHistory::new(client);
    assert!(history.snapshot().is_loading);
    history.load().await.unwrap();

    let state = history.snapshot();
    assert!(!state.is_loading);
    assert_eq!(state.visible().len(), 3);

    history.set_status_filter(StatusFilter::Only(OrderStatus::Shipped));
    let state = history.snapshot();
    let visible = state.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id.as_ref(), Some(&ids[1]));
    assert_eq!(visible[0].items[0].product_name, "Bluetooth Speaker");

    history.set_status_filter(StatusFilter::Only(OrderStatus::Delivered));
    assert!(history.snapshot().visible().is_empty());
}

#[tokio::test]
async fn test_view_and_close_details() {
    let (_backend, client, ids) = seed_orders(&[5]).await;
    let history = OrderHistory::new(client);

    history.view_details(&ids[0]).await.unwrap();
    let selected = history.snapshot().selected.unwrap();
    assert_eq!(selected.items[0].product_name, "Turntable");
    assert_eq!(selected.status, OrderStatus::Pending);
    assert_eq!(selected.status.icon(), "clock");

    history.close_details();
    assert!(!history.snapshot().show_detail());

    let missing = history.view_details(&"ord-404".parse().unwrap()).await.unwrap_err();
    assert!(missing.is_not_found());
}

#[tokio::test]
async fn test_cancel_replaces_order_in_list_and_detail() {
    let (backend, client, ids) = seed_orders(&[1, 2]).await;
    let history = OrderHistory::new(client);
    history.load().await.unwrap();
    history.view_details(&ids[0]).await.unwrap();

    let cancelled = history.cancel_order(&ids[0]).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let state = history.snapshot();
    assert_eq!(state.orders[0].status, OrderStatus::Cancelled);
    assert_eq!(state.orders[1].status, OrderStatus::Pending);
    assert_eq!(state.selected.unwrap().status, OrderStatus::Cancelled);
    assert_eq!(backend.order(ids[0].as_str()).unwrap()["status"], "cancelled");
}

#[tokio::test]
async fn test_failed_cancel_leaves_list_unchanged() {
    let (backend, client, ids) = seed_orders(&[1]).await;
    let history = OrderHistory::new(client);
    history.load().await.unwrap();
    let before = history.snapshot().orders;

    backend.fail_writes(true);
    assert!(history.cancel_order(&ids[0]).await.is_err());

    let state = history.snapshot();
    assert_eq!(state.orders, before);
    assert_eq!(state.error.as_deref(), Some(CANCEL_FAILED_MESSAGE));
    assert_eq!(backend.order(ids[0].as_str()).unwrap()["status"], "pending");
}

#[tokio::test]
async fn test_unknown_backend_status_is_kept() {
    let (backend, client, ids) = seed_orders(&[8]).await;
    backend.orders.lock().unwrap()[0]["status"] = "on-hold".into();

    let order = client.order_by_id(&ids[0]).await.unwrap();
    assert_eq!(order.status.as_str(), "on-hold");
    assert_eq!(order.status.icon(), "help-circle");
    assert!(StatusFilter::All.matches(&order));
}
