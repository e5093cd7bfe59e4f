//! In-process json-server stand-in for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use url::Url;

use storefront_client::{Address, ApiClient, DEFAULT_COUNTRY};

/// Latency on lookups so concurrent callers overlap.
const LOOKUP_DELAY: Duration = Duration::from_millis(50);

#[derive(Default)]
pub struct Backend {
    pub products: Mutex<Vec<Value>>,
    pub categories: Mutex<Vec<Value>>,
    pub orders: Mutex<Vec<Value>>,
    hits: Mutex<HashMap<String, usize>>,
    /// Extra latency for `GET /products` by `_page`.
    pub page_delays: Mutex<HashMap<u32, Duration>>,
    /// Makes order writes answer 500.
    pub fail_writes: AtomicBool,
}

impl Backend {
    pub fn seeded() -> Arc<Self> {
        let backend = Self::default();
        *backend.categories.lock().unwrap() = vec![
            json!({"id": 1, "name": "audio", "displayName": "Audio", "description": "Headphones and speakers"}),
            json!({"id": 2, "name": "video", "displayName": "Video", "description": "Screens and cameras"}),
        ];
        *backend.products.lock().unwrap() = vec![
            product(1, "Studio Headphones", 199.99, "audio", 4.8, 12),
            product(2, "Bluetooth Speaker", 59.0, "audio", 4.1, 30),
            product(3, "Earbuds", 39.5, "audio", 3.6, 0),
            product(4, "Soundbar", 249.0, "audio", 4.5, 4),
            product(5, "Turntable", 329.0, "audio", 4.9, 2),
            product(6, "Portable Radio", 25.0, "audio", 2.9, 50),
            product(7, "4K Monitor", 399.0, "video", 4.7, 8),
            product(8, "Webcam", 79.0, "video", 3.9, 20),
        ];
        Arc::new(backend)
    }

    pub fn hits(&self, key: &str) -> usize { self.hits.lock().unwrap().get(key).copied().unwrap_or(0) }
    pub fn fail_writes(&self, fail: bool) { self.fail_writes.store(fail, Ordering::SeqCst); }
    pub fn delay_page(&self, page: u32, delay: Duration) { self.page_delays.lock().unwrap().insert(page, delay); }

    pub fn order(&self, id: &str) -> Option<Value> {
        self.orders.lock().unwrap().iter().find(|o| id_of(o) == id).cloned()
    }

    fn hit(&self, key: impl Into<String>) { *self.hits.lock().unwrap().entry(key.into()).or_default() += 1; }
    fn writes_failing(&self) -> bool { self.fail_writes.load(Ordering::SeqCst) }
}

pub fn product(id: u64, name: &str, price: f64, category: &str, rating: f64, stock: u32) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{name} description"),
        "price": price,
        "imageUrl": format!("/img/{id}.jpg"),
        "images": [],
        "category": category,
        "rating": rating,
        "reviews": 10,
        "stockCount": stock,
        "specs": {"Color": ["Black", "White"], "Weight": "250g"},
        "featured": false
    })
}

pub fn address() -> Address {
    Address {
        full_name: "Grace Hopper".into(),
        street_address: "1 Compiler Ct".into(),
        apartment: None,
        city: "Arlington".into(),
        state: "VA".into(),
        zip_code: "22201-1234".into(),
        country: DEFAULT_COUNTRY.into(),
        phone_number: "(703) 555-0100".into(),
        is_default: None,
    }
}

/// Serves `backend` on an ephemeral port and returns a client pointed at it.
pub async fn serve(backend: Arc<Backend>) -> ApiClient {
    let app = Router::new()
        .route("/categories", get(list_categories))
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id", get(get_order).patch(patch_order))
        .layer(TraceLayer::new_for_http())
        .with_state(backend);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    ApiClient::new(Url::parse(&format!("http://{addr}")).unwrap())
}

fn id_of(value: &Value) -> String {
    match &value["id"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare(a: &Value, b: &Value, field: &str) -> std::cmp::Ordering {
    a[field].as_f64().unwrap_or(0.0).total_cmp(&b[field].as_f64().unwrap_or(0.0))
}

type Shared = State<Arc<Backend>>;

async fn list_categories(State(backend): Shared) -> Json<Value> {
    backend.hit("categories");
    tokio::time::sleep(LOOKUP_DELAY).await;
    let categories = backend.categories.lock().unwrap().clone();
    Json(Value::Array(categories))
}

async fn list_products(State(backend): Shared, Query(params): Query<Vec<(String, String)>>) -> Json<Value> {
    backend.hit("products");
    let param = |key: &str| params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
    let number = |key: &str| param(key).and_then(|v| v.parse::<f64>().ok());
    let categories: Vec<&str> = params.iter().filter(|(k, _)| k == "category").map(|(_, v)| v.as_str()).collect();

    let mut items: Vec<Value> = backend
        .products
        .lock()
        .unwrap()
        .iter()
        .filter(|p| categories.is_empty() || categories.contains(&p["category"].as_str().unwrap_or_default()))
        .filter(|p| number("price_gte").map_or(true, |min| p["price"].as_f64().unwrap_or(0.0) >= min))
        .filter(|p| number("price_lte").map_or(true, |max| p["price"].as_f64().unwrap_or(0.0) <= max))
        .filter(|p| number("rating_gte").map_or(true, |min| p["rating"].as_f64().unwrap_or(0.0) >= min))
        .cloned()
        .collect();

    match param("_sort") {
        Some("price") => items.sort_by(|a, b| compare(a, b, "price")),
        Some("-price") => items.sort_by(|a, b| compare(b, a, "price")),
        Some("rating") => items.sort_by(|a, b| compare(a, b, "rating")),
        _ => {}
    }
    if param("_order") == Some("desc") {
        items.reverse();
    }

    if let Some(limit) = param("_limit").and_then(|v| v.parse::<usize>().ok()) {
        items.truncate(limit);
        return Json(Value::Array(items));
    }

    let page = param("_page").and_then(|v| v.parse::<u32>().ok()).unwrap_or(1).max(1);
    let per_page = param("_per_page").and_then(|v| v.parse::<usize>().ok()).unwrap_or(10).max(1);
    let delay = backend.page_delays.lock().unwrap().get(&page).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let total = items.len();
    let pages = total.div_ceil(per_page);
    let data: Vec<Value> = items.into_iter().skip((page as usize - 1) * per_page).take(per_page).collect();
    Json(json!({"first": 1, "last": pages, "pages": pages, "items": total, "data": data}))
}

async fn get_product(State(backend): Shared, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    backend.hit(format!("products/{id}"));
    tokio::time::sleep(LOOKUP_DELAY).await;
    let found = backend.products.lock().unwrap().iter().find(|p| id_of(p) == id).cloned();
    found.map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn list_orders(State(backend): Shared) -> Json<Value> {
    backend.hit("orders");
    let orders = backend.orders.lock().unwrap().clone();
    Json(Value::Array(orders))
}

async fn get_order(State(backend): Shared, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    backend.order(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn create_order(State(backend): Shared, Json(mut order): Json<Value>) -> Result<(StatusCode, Json<Value>), StatusCode> {
    if backend.writes_failing() {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let mut orders = backend.orders.lock().unwrap();
    order["id"] = json!(format!("ord-{}", orders.len() + 1));
    orders.push(order.clone());
    Ok((StatusCode::CREATED, Json(order)))
}

async fn patch_order(State(backend): Shared, Path(id): Path<String>, Json(patch): Json<Value>) -> Result<Json<Value>, StatusCode> {
    if backend.writes_failing() {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let mut orders = backend.orders.lock().unwrap();
    let order = orders.iter_mut().find(|o| id_of(o) == id).ok_or(StatusCode::NOT_FOUND)?;
    if let (Some(target), Value::Object(fields)) = (order.as_object_mut(), patch) {
        target.extend(fields);
    }
    Ok(Json(order.clone()))
}
