//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::{Category, Product, SpecValue, Star};
pub use order::{
    format_date, format_time, Address, Order, OrderDraft, OrderItem, OrderStatus, OrderSummary, OrderUpdate,
    PaymentMethod, PaymentMethodType, DEFAULT_COUNTRY, SHIPPING_FLAT_RATE, TAX_RATE,
};
pub use cart::{Cart, CartLine};
